//! # Resolver
//!
//! Drives the three reasoning stages strictly in order against one injected
//! backend client and reports progress through a per-run step tracker.
//!
//! One generic loop handles every stage: build request, invoke, decode,
//! emit. A malformed reply degrades to fallback output and the run keeps
//! going; only a failed backend call is fatal, in which case the failing
//! stage is marked `Error` and the remaining stages never execute.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{instrument, warn};

use super::events::{AgentStep, StepStatus, StepTracker};
use super::phase::RunPhase;
use super::stages::{StageContext, StageKind};
use crate::error::DoctorError;
use crate::llm::ReasoningBackend;
use crate::models::{ConflictRequest, ResolutionResult};

/// Orchestrator for one or more resolution runs.
///
/// Holds the backend client and the caller's observer channel; each call to
/// [`Resolver::resolve`] is an independent run with its own step identifier
/// space and no state shared with other runs.
pub struct Resolver {
    backend: Arc<dyn ReasoningBackend>,
    step_tx: Option<mpsc::Sender<AgentStep>>,
    phase: RunPhase,
}

impl Resolver {
    pub fn new(backend: Arc<dyn ReasoningBackend>) -> Self {
        Self {
            backend,
            step_tx: None,
            phase: RunPhase::NotStarted,
        }
    }

    /// Attach an observer channel for step events. Dropping the receiver
    /// cancels observation, not the run: in-flight stages complete and
    /// their events are discarded.
    pub fn with_step_channel(mut self, tx: mpsc::Sender<AgentStep>) -> Self {
        self.step_tx = Some(tx);
        self
    }

    /// Phase of the most recent run.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Run the full pipeline for one conflict request.
    #[instrument(skip(self, request), fields(manifest_lines = request.requirements.lines().count()))]
    pub async fn resolve(
        &mut self,
        request: &ConflictRequest,
    ) -> Result<ResolutionResult, DoctorError> {
        let mut tracker = match &self.step_tx {
            Some(tx) => StepTracker::with_channel(tx.clone()),
            None => StepTracker::new(),
        };
        self.phase = RunPhase::NotStarted;
        self.phase.start();

        let mut ctx = StageContext::default();

        for stage in StageKind::ALL {
            tracker
                .emit(
                    AgentStep::new(
                        stage.id(),
                        stage.agent(),
                        StepStatus::Running,
                        stage.running_message(&ctx),
                    )
                    .with_tools(stage.tools()),
                )
                .await;

            let reply = match self.backend.generate(stage.build_request(request, &ctx)).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(stage = stage.title(), error = %e, "backend call failed, aborting run");
                    tracker
                        .emit(
                            AgentStep::new(
                                stage.id(),
                                stage.agent(),
                                StepStatus::Error,
                                format!("{} failed: {}", stage.agent(), e),
                            )
                            .with_tools(stage.tools()),
                        )
                        .await;
                    self.phase.fail();
                    return Err(DoctorError::unavailable(stage.title(), e));
                }
            };

            let data = stage.absorb(&reply, request, &mut ctx);
            tracker
                .emit(
                    AgentStep::new(
                        stage.id(),
                        stage.agent(),
                        StepStatus::Completed,
                        stage.completed_message(),
                    )
                    .with_tools(stage.tools())
                    .with_data(data),
                )
                .await;
        }

        self.phase.complete();

        let research = ctx.research.unwrap_or_default();
        let resolution = ctx.resolution.unwrap_or_default();

        Ok(ResolutionResult {
            diagnosis: resolution.diagnosis_summary,
            original_requirements: request.requirements.clone(),
            fixed_requirements: resolution.fixed_requirements,
            explanation: resolution.explanation,
            // The synthesis stage never touches citations; the result
            // carries exactly what research produced.
            sources: research.sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverCalled;

    #[async_trait::async_trait]
    impl ReasoningBackend for NeverCalled {
        async fn generate(
            &self,
            _request: crate::llm::BackendRequest,
        ) -> Result<crate::llm::BackendReply, crate::llm::BackendError> {
            panic!("backend should not be called before resolve()");
        }
    }

    #[test]
    fn test_new_resolver_has_not_started() {
        let resolver = Resolver::new(Arc::new(NeverCalled));
        assert_eq!(resolver.phase(), RunPhase::NotStarted);
    }
}
