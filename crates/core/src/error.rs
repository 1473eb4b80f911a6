//! Error taxonomy for resolution runs.
//!
//! Only a hard backend failure travels up to the caller. Malformed payloads
//! are absorbed by the normalizer, and observer failures are ignored by the
//! step tracker, so neither appears here.

use thiserror::Error;

/// Fatal errors surfaced to callers of the pipeline and tool operations.
#[derive(Debug, Error)]
pub enum DoctorError {
    /// The reasoning backend could not be reached (network/auth/quota).
    /// Aborts the run; any remaining stages never execute.
    #[error("could not reach reasoning backend during {stage}: {reason}")]
    BackendUnavailable { stage: String, reason: String },
}

impl DoctorError {
    pub(crate) fn unavailable(stage: impl Into<String>, reason: impl ToString) -> Self {
        Self::BackendUnavailable {
            stage: stage.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_the_backend() {
        let err = DoctorError::unavailable("Query Formulation", "401 Unauthorized");
        let msg = err.to_string();
        assert!(msg.contains("reasoning backend"));
        assert!(msg.contains("Query Formulation"));
    }
}
