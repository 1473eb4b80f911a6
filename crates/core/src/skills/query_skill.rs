//! # Query Creator Skill
//!
//! First agent in the resolution pipeline. Reads the raw manifest and error
//! log, names the packages implicated in the conflict, and produces the
//! search query the research agent runs next.

use serde::{Deserialize, Serialize};

use crate::llm::{object_array_prop, object_schema, string_prop, BackendReply, BackendRequest};
use crate::models::ConflictRequest;
use crate::normalize::{normalize, FieldSpec};
use crate::skills::{prompts, Parsed};

/// A single package implicated in the conflict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyIssue {
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub reason: String,
}

/// Output from the Query Creator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutput {
    #[serde(default)]
    pub issues: Vec<DependencyIssue>,
    #[serde(default)]
    pub search_query: String,
}

/// Query Creator: pure description of one backend invocation.
pub struct QuerySkill;

impl QuerySkill {
    /// Capabilities this agent declares, surfaced on its progress steps.
    pub const TOOLS: &'static [&'static str] = &["structured_output"];

    pub fn request(request: &ConflictRequest) -> BackendRequest {
        let prompt = format!(
            "Analyze requirements and logs for conflicts: {}\nLogs: {}",
            request.requirements, request.error_log
        );
        BackendRequest::new(prompt)
            .with_system(prompts::QUERY_CREATOR)
            .with_schema(object_schema(
                &[
                    (
                        "issues",
                        object_array_prop(&[
                            ("packageName", string_prop()),
                            ("reason", string_prop()),
                        ]),
                    ),
                    ("searchQuery", string_prop()),
                ],
                &["issues", "searchQuery"],
            ))
    }

    pub fn parse(reply: &BackendReply) -> Parsed<QueryOutput> {
        let normalized = normalize(
            &reply.text,
            &[FieldSpec::list("issues"), FieldSpec::text("searchQuery")],
        );
        // Field presence and kinds are guaranteed; individual issue entries
        // may still be partial, which the serde defaults absorb.
        let output = serde_json::from_value(normalized.value.clone()).unwrap_or_default();
        Parsed {
            output,
            degraded: normalized.degraded,
        }
    }
}
