//! # Research Team Skill
//!
//! Second agent in the resolution pipeline. Takes the Query Creator's
//! search query and runs it through the backend with grounded search on.
//! Its value is the citation list and the raw findings text; the structured
//! fix comes later from the Code Surgeon.

use serde::{Deserialize, Serialize};

use crate::llm::{BackendReply, BackendRequest};
use crate::models::SourceRef;
use crate::skills::prompts;

/// How much of the raw findings text is kept as the step summary.
const SUMMARY_CHARS: usize = 200;

/// Output from the Research Team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchOutput {
    /// Citations from grounding metadata, in backend order
    pub sources: Vec<SourceRef>,
    /// Leading slice of the findings text, for progress display
    pub research_summary: String,
    /// Full findings text, consumed by the synthesis stage
    #[serde(skip)]
    pub full_text: String,
}

/// Research Team: pure description of one grounded backend invocation.
pub struct ResearchSkill;

impl ResearchSkill {
    pub const TOOLS: &'static [&'static str] = &["google_search"];

    /// This stage asks for free text, not JSON: grounded search and a
    /// response schema do not combine, and the findings feed a later
    /// stage's prompt rather than a decoder.
    pub fn request(search_query: &str) -> BackendRequest {
        BackendRequest::new(format!("Find compatible versions for: {}", search_query))
            .with_system(prompts::RESEARCHER)
            .grounded()
    }

    pub fn parse(reply: &BackendReply) -> ResearchOutput {
        ResearchOutput {
            sources: reply.sources.clone(),
            research_summary: reply.text.chars().take(SUMMARY_CHARS).collect(),
            full_text: reply.text.clone(),
        }
    }
}
