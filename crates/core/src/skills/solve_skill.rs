//! # Solve Skill
//!
//! One-shot conflict resolution for the external tool surface: manifest and
//! error log in, [`ResolutionResult`] out, in a single grounded invocation
//! instead of the three-stage pipeline. Mirrors the tool contract the
//! desktop app registers with its MCP host.

use serde_json::Value;

use crate::error::DoctorError;
use crate::llm::{
    object_array_prop, object_schema, string_prop, BackendRequest, ReasoningBackend,
};
use crate::models::{ConflictRequest, ResolutionResult, SourceRef};
use crate::normalize::{normalize, FieldSpec};
use crate::skills::prompts;

/// Diagnosis substituted when the backend omitted one.
const FALLBACK_DIAGNOSIS: &str = "Analysis complete";

/// Explanation substituted when the backend omitted one.
const FALLBACK_EXPLANATION: &str = "Resolution provided.";

/// One-shot solver for the tool-invocation surface.
pub struct SolveSkill;

impl SolveSkill {
    /// Declarative description of this operation for tool-calling hosts.
    pub fn tool_declaration() -> Value {
        serde_json::json!({
            "name": "solve_dependency_issue",
            "description": "Analyzes and solves Python dependency conflicts using multi-agent reasoning and web search.",
            "parameters": {
                "type": "object",
                "properties": {
                    "requirements": {
                        "type": "string",
                        "description": "The content of the requirements.txt file or list of packages.",
                    },
                    "error_log": {
                        "type": "string",
                        "description": "The terminal output error showing the dependency conflict.",
                    },
                },
                "required": ["requirements", "error_log"],
            },
        })
    }

    fn request(request: &ConflictRequest) -> BackendRequest {
        let prompt = format!(
            "Analyze this conflict: Requirements: {} Error: {}",
            request.requirements, request.error_log
        );
        BackendRequest::new(prompt)
            .with_system(prompts::SOLVER)
            .with_schema(object_schema(
                &[
                    ("diagnosis", string_prop()),
                    ("fixedRequirements", string_prop()),
                    ("explanation", string_prop()),
                    (
                        "sources",
                        object_array_prop(&[("title", string_prop()), ("uri", string_prop())]),
                    ),
                ],
                &["diagnosis", "fixedRequirements", "explanation"],
            ))
            .grounded()
    }

    pub async fn run(
        backend: &dyn ReasoningBackend,
        request: &ConflictRequest,
    ) -> Result<ResolutionResult, DoctorError> {
        let reply = backend
            .generate(Self::request(request))
            .await
            .map_err(|e| DoctorError::unavailable("Conflict Solve", e))?;

        let normalized = normalize(
            &reply.text,
            &[
                FieldSpec::text_or("diagnosis", FALLBACK_DIAGNOSIS),
                FieldSpec::text_or("fixedRequirements", &request.requirements),
                FieldSpec::text_or("explanation", FALLBACK_EXPLANATION),
                FieldSpec::list("sources"),
            ],
        );

        // Prefer citations the model wrote into the body; fall back to the
        // grounding metadata when the body had none.
        let mut sources: Vec<SourceRef> =
            serde_json::from_value(normalized.value["sources"].clone()).unwrap_or_default();
        if sources.is_empty() {
            sources = reply.sources;
        }

        Ok(ResolutionResult {
            diagnosis: normalized.text("diagnosis"),
            original_requirements: request.requirements.clone(),
            fixed_requirements: normalized.text("fixedRequirements"),
            explanation: normalized.text("explanation"),
            sources,
        })
    }
}
