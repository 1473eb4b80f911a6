//! # Step Events
//!
//! Progress records for the three pipeline agents and the tracker that
//! delivers them to a caller-supplied channel.
//!
//! A step's `id` is stable for the whole run ("1"/"2"/"3"), so an observer
//! rendering a live list updates each agent's row in place instead of
//! appending duplicates. The tracker enforces that by replacing its record
//! for an `id` on re-emit while preserving list order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// The agent a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentName {
    #[serde(rename = "Query Creator")]
    QueryCreator,
    #[serde(rename = "Research Team")]
    ResearchTeam,
    #[serde(rename = "Code Surgeon")]
    CodeSurgeon,
}

impl std::fmt::Display for AgentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AgentName::QueryCreator => "Query Creator",
            AgentName::ResearchTeam => "Research Team",
            AgentName::CodeSurgeon => "Code Surgeon",
        };
        write!(f, "{}", name)
    }
}

/// Status of a step. Advances Pending -> Running -> Completed | Error and
/// never regresses within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Error,
}

/// One progress record for one pipeline agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStep {
    /// Stable per-stage identifier ("1", "2", "3")
    pub id: String,
    pub agent: AgentName,
    pub status: StepStatus,
    /// Human-readable progress message
    pub message: String,
    /// Capability names the agent declares, informational only
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// Stage output payload, present once the stage completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl AgentStep {
    pub fn new(id: &str, agent: AgentName, status: StepStatus, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            agent,
            status,
            message: message.into(),
            tools_used: Vec::new(),
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.tools_used = tools.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Per-run step log plus the caller's observer channel.
///
/// The tracker owns nothing global: it lives and dies with one run, so two
/// concurrent runs can never see each other's steps. A dropped or full
/// receiver is ignored - the observer failing is never allowed to disturb
/// the stage state machine, and a caller that walked away simply stops
/// hearing about a run that then finishes into the void.
#[derive(Debug, Default)]
pub struct StepTracker {
    steps: Vec<AgentStep>,
    tx: Option<mpsc::Sender<AgentStep>>,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the caller's observer channel.
    pub fn with_channel(tx: mpsc::Sender<AgentStep>) -> Self {
        Self {
            steps: Vec::new(),
            tx: Some(tx),
        }
    }

    /// Record a step and forward it to the observer.
    ///
    /// A step with a known `id` replaces the existing record in place;
    /// a new `id` appends.
    pub async fn emit(&mut self, step: AgentStep) {
        match self.steps.iter_mut().find(|s| s.id == step.id) {
            Some(existing) => *existing = step.clone(),
            None => self.steps.push(step.clone()),
        }
        if let Some(tx) = &self.tx {
            let _ = tx.send(step).await;
        }
    }

    /// Steps recorded so far, in first-emission order.
    pub fn steps(&self) -> &[AgentStep] {
        &self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str, status: StepStatus) -> AgentStep {
        AgentStep::new(id, AgentName::QueryCreator, status, "msg")
    }

    #[tokio::test]
    async fn test_emit_replaces_by_id_preserving_order() {
        let mut tracker = StepTracker::new();
        tracker.emit(step("1", StepStatus::Running)).await;
        tracker.emit(step("2", StepStatus::Running)).await;
        tracker.emit(step("1", StepStatus::Completed)).await;

        assert_eq!(tracker.steps().len(), 2);
        assert_eq!(tracker.steps()[0].id, "1");
        assert_eq!(tracker.steps()[0].status, StepStatus::Completed);
        assert_eq!(tracker.steps()[1].id, "2");
    }

    #[tokio::test]
    async fn test_channel_receives_every_emission() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut tracker = StepTracker::with_channel(tx);
        tracker.emit(step("1", StepStatus::Running)).await;
        tracker.emit(step("1", StepStatus::Completed)).await;

        assert_eq!(rx.recv().await.unwrap().status, StepStatus::Running);
        assert_eq!(rx.recv().await.unwrap().status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_fail_emit() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut tracker = StepTracker::with_channel(tx);
        tracker.emit(step("1", StepStatus::Running)).await;
        assert_eq!(tracker.steps().len(), 1);
    }

    #[test]
    fn test_step_wire_format() {
        let recorded = step("1", StepStatus::Running).with_tools(&["google_search"]);
        let json = serde_json::to_string(&recorded).unwrap();
        assert!(json.contains("\"agent\":\"Query Creator\""));
        assert!(json.contains("\"status\":\"running\""));
        assert!(json.contains("\"toolsUsed\""));
        assert!(!json.contains("\"data\""));
    }
}
