//! # Code Surgeon Skill
//!
//! Final agent in the resolution pipeline. Feeds the research findings and
//! the original inputs back to the backend and asks for the corrected
//! manifest. When the reply cannot be decoded, the original manifest is
//! echoed unchanged with an explanation that says so - a degraded run still
//! completes.

use serde::{Deserialize, Serialize};

use crate::llm::{object_schema, string_prop, BackendReply, BackendRequest};
use crate::models::ConflictRequest;
use crate::normalize::{normalize, FieldSpec};
use crate::skills::{prompts, Parsed};

/// Explanation substituted when the backend reply had no usable fix.
pub const FALLBACK_EXPLANATION: &str =
    "Automatic resolution was unavailable; the original requirements are shown unchanged.";

/// Diagnosis substituted when the backend reply had no usable summary.
pub const FALLBACK_DIAGNOSIS: &str = "Analysis completed with reduced confidence.";

/// Output from the Code Surgeon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurgeonOutput {
    #[serde(default)]
    pub fixed_requirements: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub diagnosis_summary: String,
}

/// Code Surgeon: pure description of one backend invocation.
pub struct SurgeonSkill;

impl SurgeonSkill {
    pub const TOOLS: &'static [&'static str] = &["structured_output"];

    pub fn request(research_text: &str, request: &ConflictRequest) -> BackendRequest {
        let prompt = format!(
            "Research data: {}. Fix these: {}. Error: {}",
            research_text, request.requirements, request.error_log
        );
        BackendRequest::new(prompt)
            .with_system(prompts::CODE_SURGEON)
            .with_schema(object_schema(
                &[
                    ("fixedRequirements", string_prop()),
                    ("explanation", string_prop()),
                    ("diagnosisSummary", string_prop()),
                ],
                &["fixedRequirements", "explanation", "diagnosisSummary"],
            ))
    }

    /// Decode the reply; `original_requirements` is the fallback manifest.
    pub fn parse(reply: &BackendReply, original_requirements: &str) -> Parsed<SurgeonOutput> {
        let normalized = normalize(
            &reply.text,
            &[
                FieldSpec::text_or("fixedRequirements", original_requirements),
                FieldSpec::text_or("explanation", FALLBACK_EXPLANATION),
                FieldSpec::text_or("diagnosisSummary", FALLBACK_DIAGNOSIS),
            ],
        );
        let output = serde_json::from_value(normalized.value.clone()).unwrap_or_default();
        Parsed {
            output,
            degraded: normalized.degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canned_request() -> ConflictRequest {
        ConflictRequest::new("numpy==1.26.4\ntensorflow==2.10.0", "ERROR: conflict")
    }

    #[test]
    fn test_request_includes_research_and_originals() {
        let request = SurgeonSkill::request("numpy 1.26 pairs with tf 2.16", &canned_request());
        assert!(request.prompt.contains("numpy 1.26 pairs with tf 2.16"));
        assert!(request.prompt.contains("tensorflow==2.10.0"));
        assert!(!request.grounded_search);
    }

    #[test]
    fn test_parse_well_formed_reply() {
        let reply = BackendReply {
            text: r#"{"fixedRequirements": "numpy==1.26.4\ntensorflow==2.16.1", "explanation": "bumped tf", "diagnosisSummary": "tf 2.10 requires numpy<1.24"}"#.into(),
            sources: vec![],
        };
        let parsed = SurgeonSkill::parse(&reply, "numpy==1.26.4\ntensorflow==2.10.0");
        assert!(!parsed.degraded);
        assert!(parsed.output.fixed_requirements.contains("tensorflow==2.16.1"));
    }

    #[test]
    fn test_unparseable_reply_echoes_manifest() {
        let reply = BackendReply {
            text: "I am unable to comply.".into(),
            sources: vec![],
        };
        let parsed = SurgeonSkill::parse(&reply, "numpy==1.26.4");
        assert!(parsed.degraded);
        assert_eq!(parsed.output.fixed_requirements, "numpy==1.26.4");
        assert_eq!(parsed.output.explanation, FALLBACK_EXPLANATION);
        assert_eq!(parsed.output.diagnosis_summary, FALLBACK_DIAGNOSIS);
    }

    #[test]
    fn test_partial_reply_fills_only_missing_fields() {
        let reply = BackendReply {
            text: r#"{"fixedRequirements": "numpy==1.25.0", "explanation": "downgraded numpy"}"#.into(),
            sources: vec![],
        };
        let parsed = SurgeonSkill::parse(&reply, "numpy==1.26.4");
        assert!(parsed.degraded);
        assert_eq!(parsed.output.fixed_requirements, "numpy==1.25.0");
        assert_eq!(parsed.output.explanation, "downgraded numpy");
        assert_eq!(parsed.output.diagnosis_summary, FALLBACK_DIAGNOSIS);
    }
}
