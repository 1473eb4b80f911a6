//! Ordered stage descriptors for the resolution pipeline.
//!
//! Each stage is described, not coded: its identifier, agent, progress
//! messages, request-construction rule, and how its reply folds into the
//! accumulating [`StageContext`]. One generic loop in the resolver consumes
//! the descriptor list, so adding, removing, or reordering stages is a
//! change to [`StageKind::ALL`], not to control flow.

use serde_json::Value;

use super::events::AgentName;
use crate::llm::{BackendReply, BackendRequest};
use crate::models::ConflictRequest;
use crate::skills::{
    QueryOutput, QuerySkill, ResearchOutput, ResearchSkill, SurgeonOutput, SurgeonSkill,
};

/// Accumulated stage outputs for one run. Stages only ever append; the
/// original request stays immutable beside it.
#[derive(Debug, Default)]
pub struct StageContext {
    pub query: Option<QueryOutput>,
    pub research: Option<ResearchOutput>,
    pub resolution: Option<SurgeonOutput>,
}

/// The three reasoning stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    QueryFormulation,
    GroundedResearch,
    ResolutionSynthesis,
}

impl StageKind {
    /// Execution order. There is no branching or skipping: the resolver
    /// walks this list front to back or not at all.
    pub const ALL: [StageKind; 3] = [
        StageKind::QueryFormulation,
        StageKind::GroundedResearch,
        StageKind::ResolutionSynthesis,
    ];

    /// Stable step identifier for progress events.
    pub fn id(&self) -> &'static str {
        match self {
            StageKind::QueryFormulation => "1",
            StageKind::GroundedResearch => "2",
            StageKind::ResolutionSynthesis => "3",
        }
    }

    /// Human-readable stage name, used in fatal error messages.
    pub fn title(&self) -> &'static str {
        match self {
            StageKind::QueryFormulation => "Query Formulation",
            StageKind::GroundedResearch => "Grounded Research",
            StageKind::ResolutionSynthesis => "Resolution Synthesis",
        }
    }

    pub fn agent(&self) -> AgentName {
        match self {
            StageKind::QueryFormulation => AgentName::QueryCreator,
            StageKind::GroundedResearch => AgentName::ResearchTeam,
            StageKind::ResolutionSynthesis => AgentName::CodeSurgeon,
        }
    }

    /// Capability names declared by the stage's agent.
    pub fn tools(&self) -> &'static [&'static str] {
        match self {
            StageKind::QueryFormulation => QuerySkill::TOOLS,
            StageKind::GroundedResearch => ResearchSkill::TOOLS,
            StageKind::ResolutionSynthesis => SurgeonSkill::TOOLS,
        }
    }

    pub fn running_message(&self, ctx: &StageContext) -> String {
        match self {
            StageKind::QueryFormulation => "Analyzing conflict signatures...".to_string(),
            StageKind::GroundedResearch => {
                let query = ctx
                    .query
                    .as_ref()
                    .map(|q| q.search_query.as_str())
                    .unwrap_or_default();
                format!("Searching compatibility for {}...", query)
            }
            StageKind::ResolutionSynthesis => "Optimizing dependency tree...".to_string(),
        }
    }

    pub fn completed_message(&self) -> &'static str {
        match self {
            StageKind::QueryFormulation => "Conflict signatures identified.",
            StageKind::GroundedResearch => "Grounding data retrieved.",
            StageKind::ResolutionSynthesis => "Resolution plan synthesized.",
        }
    }

    /// Build this stage's backend request from the immutable input and the
    /// previous stages' outputs.
    pub fn build_request(&self, request: &ConflictRequest, ctx: &StageContext) -> BackendRequest {
        match self {
            StageKind::QueryFormulation => QuerySkill::request(request),
            StageKind::GroundedResearch => {
                let query = ctx
                    .query
                    .as_ref()
                    .map(|q| q.search_query.as_str())
                    .unwrap_or_default();
                ResearchSkill::request(query)
            }
            StageKind::ResolutionSynthesis => {
                let research_text = ctx
                    .research
                    .as_ref()
                    .map(|r| r.full_text.as_str())
                    .unwrap_or_default();
                SurgeonSkill::request(research_text, request)
            }
        }
    }

    /// Decode the reply, store the stage output, and return the payload for
    /// the completed step event. Degraded decoding is tagged, never fatal.
    pub fn absorb(
        &self,
        reply: &BackendReply,
        request: &ConflictRequest,
        ctx: &mut StageContext,
    ) -> Value {
        match self {
            StageKind::QueryFormulation => {
                let parsed = QuerySkill::parse(reply);
                let data = step_data(&parsed.output, parsed.degraded);
                ctx.query = Some(parsed.output);
                data
            }
            StageKind::GroundedResearch => {
                let output = ResearchSkill::parse(reply);
                let data = step_data(&output, false);
                ctx.research = Some(output);
                data
            }
            StageKind::ResolutionSynthesis => {
                let parsed = SurgeonSkill::parse(reply, &request.requirements);
                let data = step_data(&parsed.output, parsed.degraded);
                ctx.resolution = Some(parsed.output);
                data
            }
        }
    }
}

/// Serialize a stage output for its step event, tagging fallback decodes
/// so observers can flag reduced confidence.
fn step_data<T: serde::Serialize>(output: &T, degraded: bool) -> Value {
    let mut data = serde_json::to_value(output).unwrap_or_else(|_| Value::Object(Default::default()));
    if degraded {
        if let Value::Object(map) = &mut data {
            map.insert("degraded".to_string(), Value::Bool(true));
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceRef;

    fn canned_request() -> ConflictRequest {
        ConflictRequest::new("numpy==1.26.4\ntensorflow==2.10.0", "ERROR: conflict")
    }

    #[test]
    fn test_stage_order_and_ids() {
        let ids: Vec<_> = StageKind::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_research_message_names_the_query() {
        let mut ctx = StageContext::default();
        ctx.query = Some(QueryOutput {
            issues: vec![],
            search_query: "numpy tensorflow compatibility".into(),
        });
        let message = StageKind::GroundedResearch.running_message(&ctx);
        assert_eq!(message, "Searching compatibility for numpy tensorflow compatibility...");
    }

    #[test]
    fn test_requests_chain_prior_outputs() {
        let request = canned_request();
        let mut ctx = StageContext::default();

        let first = StageKind::QueryFormulation.build_request(&request, &ctx);
        assert!(first.prompt.contains("numpy==1.26.4"));

        ctx.query = Some(QueryOutput {
            issues: vec![],
            search_query: "the-query".into(),
        });
        let second = StageKind::GroundedResearch.build_request(&request, &ctx);
        assert!(second.prompt.contains("the-query"));
        assert!(second.grounded_search);

        ctx.research = Some(ResearchOutput {
            sources: vec![],
            research_summary: "short".into(),
            full_text: "the full research findings".into(),
        });
        let third = StageKind::ResolutionSynthesis.build_request(&request, &ctx);
        assert!(third.prompt.contains("the full research findings"));
        assert!(third.prompt.contains("ERROR: conflict"));
    }

    #[test]
    fn test_absorb_stores_outputs_and_tags_degraded() {
        let request = canned_request();
        let mut ctx = StageContext::default();

        let reply = BackendReply {
            text: "not json at all".into(),
            sources: vec![],
        };
        let data = StageKind::QueryFormulation.absorb(&reply, &request, &mut ctx);
        assert!(ctx.query.is_some());
        assert_eq!(data["degraded"], true);

        let reply = BackendReply {
            text: "findings".into(),
            sources: vec![SourceRef { title: "PyPI".into(), uri: "https://pypi.org".into() }],
        };
        let data = StageKind::GroundedResearch.absorb(&reply, &request, &mut ctx);
        assert_eq!(ctx.research.as_ref().unwrap().sources.len(), 1);
        assert!(data.get("degraded").is_none());
    }
}
