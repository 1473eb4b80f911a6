//! Run-level state machine for the resolution pipeline.

use serde::{Deserialize, Serialize};

/// Phase of one resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// No stage has started
    #[default]
    NotStarted,
    /// A stage is running or awaiting the backend
    InProgress,
    /// All three stages completed
    Succeeded,
    /// A stage hit a fatal backend failure
    Failed,
}

impl RunPhase {
    /// Mark the run as started.
    pub fn start(&mut self) {
        if *self == RunPhase::NotStarted {
            *self = RunPhase::InProgress;
        }
    }

    /// Mark the run as finished successfully.
    pub fn complete(&mut self) {
        if *self == RunPhase::InProgress {
            *self = RunPhase::Succeeded;
        }
    }

    /// Mark the run as failed. Terminal states stay put.
    pub fn fail(&mut self) {
        if *self == RunPhase::InProgress {
            *self = RunPhase::Failed;
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Succeeded | RunPhase::Failed)
    }

    pub fn is_success(&self) -> bool {
        *self == RunPhase::Succeeded
    }
}
