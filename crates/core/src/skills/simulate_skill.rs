//! # Simulate Skill
//!
//! Predicts what installing one package would do for a given Python
//! version and platform - dependency tree, likely conflicts, OS-level
//! requirements - before anyone runs pip. Single backend invocation, no
//! pipeline. The fallback path always yields a usable report: a status,
//! a (possibly empty) tree, and a non-empty summary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DoctorError;
use crate::llm::{object_schema, string_array_prop, string_prop, BackendRequest, ReasoningBackend};
use crate::normalize::{normalize, FieldSpec};
use crate::skills::prompts;

/// Status substituted when the backend did not classify the install.
const FALLBACK_STATUS: &str = "unknown";

/// Predicted outcome of installing a single package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    /// Classification: "success", "warning", "risk", or "unknown" on fallback
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub predicted_tree: Vec<String>,
    #[serde(default)]
    pub potential_conflicts: Vec<String>,
    #[serde(default)]
    pub system_requirements: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

/// Install simulator for the tool-invocation surface.
pub struct SimulateSkill;

impl SimulateSkill {
    /// Declarative description of this operation for tool-calling hosts.
    pub fn tool_declaration() -> Value {
        serde_json::json!({
            "name": "simulate_installation",
            "description": "Predicts the dependency tree, conflicts, and OS-level requirements of installing a Python package.",
            "parameters": {
                "type": "object",
                "properties": {
                    "package_name": { "type": "string", "description": "Package to simulate installing." },
                    "python_version": { "type": "string", "description": "Target Python version, e.g. 3.10." },
                    "platform": { "type": "string", "description": "Target platform, e.g. linux." },
                },
                "required": ["package_name"],
            },
        })
    }

    fn request(package_name: &str, python_version: &str, platform: &str) -> BackendRequest {
        let prompt = format!(
            "SIMULATE INSTALLATION:\nPackage: {}\nPython: {}\nPlatform: {}\n\nPredict the dependency tree, potential OS-level requirements, and common version conflicts.",
            package_name, python_version, platform
        );
        BackendRequest::new(prompt)
            .with_system(prompts::SIMULATOR)
            .with_schema(object_schema(
                &[
                    ("status", string_prop()),
                    ("predictedTree", string_array_prop()),
                    ("potentialConflicts", string_array_prop()),
                    ("systemRequirements", string_array_prop()),
                    ("summary", string_prop()),
                ],
                &["status", "predictedTree", "potentialConflicts", "summary"],
            ))
    }

    pub async fn run(
        backend: &dyn ReasoningBackend,
        package_name: &str,
        python_version: &str,
        platform: &str,
    ) -> Result<SimulationReport, DoctorError> {
        let reply = backend
            .generate(Self::request(package_name, python_version, platform))
            .await
            .map_err(|e| DoctorError::unavailable("Install Simulation", e))?;

        let fallback_summary = format!(
            "No structured prediction was returned for {}; try again or install in an isolated environment first.",
            package_name
        );
        let normalized = normalize(
            &reply.text,
            &[
                FieldSpec::text_or("status", FALLBACK_STATUS),
                FieldSpec::list("predictedTree"),
                FieldSpec::list("potentialConflicts"),
                FieldSpec::list("systemRequirements"),
                FieldSpec::text_or("summary", fallback_summary),
            ],
        );

        Ok(serde_json::from_value(normalized.value).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_names_target_environment() {
        let request = SimulateSkill::request("tensorflow", "3.11", "darwin");
        assert!(request.prompt.contains("Package: tensorflow"));
        assert!(request.prompt.contains("Python: 3.11"));
        assert!(request.prompt.contains("Platform: darwin"));
        assert!(!request.grounded_search);
    }

    #[test]
    fn test_tool_declaration_requires_package() {
        let tool = SimulateSkill::tool_declaration();
        assert_eq!(tool["parameters"]["required"][0], "package_name");
    }
}
