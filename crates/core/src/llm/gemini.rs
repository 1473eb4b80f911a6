//! Google Gemini `generateContent` client (non-streaming).
//!
//! Translates a [`BackendRequest`] into Google's wire format and extracts
//! text plus grounding citations from the reply. Grounding chunks arrive in
//! candidate metadata, outside the JSON body the model writes.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{BackendError, BackendReply, BackendRequest, ReasoningBackend};
use crate::models::{BackendConfig, SourceRef};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Connection establishment timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whole-request timeout. A run that hits this surfaces as
/// [`BackendError::Http`], which the pipeline treats as fatal.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Reqwest-backed Gemini client.
///
/// One explicitly-owned instance per process; stages share it through the
/// [`ReasoningBackend`] trait instead of reconstructing connections ad hoc.
pub struct GeminiClient {
    config: BackendConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: BackendConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    /// Endpoint for this client's model. Gemini authenticates with the key
    /// in the query string, not a bearer header.
    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_API_BASE)
            .trim_end_matches('/');
        format!(
            "{}/{}:generateContent?key={}",
            base, self.config.model, self.config.api_key
        )
    }

    fn build_body(request: &BackendRequest) -> GenerateContentRequest {
        let generation_config = request.response_schema.as_ref().map(|schema| {
            GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: Some(schema.clone()),
            }
        });

        let tools = request.grounded_search.then(|| {
            vec![WireTool {
                google_search: GoogleSearch {},
            }]
        });

        GenerateContentRequest {
            contents: vec![WireContent {
                role: Some("user".to_string()),
                parts: vec![WirePart {
                    text: Some(request.prompt.clone()),
                }],
            }],
            system_instruction: request.system.map(|text| WireContent {
                role: None,
                parts: vec![WirePart {
                    text: Some(text.to_string()),
                }],
            }),
            generation_config,
            tools,
        }
    }
}

/// Flatten candidate text parts. A reply with no candidates is not an
/// error here: the normalizer downgrades an empty payload to fallbacks.
fn extract_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .as_deref()
        .and_then(|c| c.first())
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

/// Pull `{title, uri}` citations out of grounding metadata, preserving
/// the backend's ordering.
fn extract_sources(response: &GenerateContentResponse) -> Vec<SourceRef> {
    response
        .candidates
        .as_deref()
        .and_then(|c| c.first())
        .and_then(|candidate| candidate.grounding_metadata.as_ref())
        .and_then(|metadata| metadata.grounding_chunks.as_deref())
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref())
                .map(|web| SourceRef {
                    title: web.title.clone().unwrap_or_else(|| "Doc".to_string()),
                    uri: web.uri.clone().unwrap_or_else(|| "#".to_string()),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ReasoningBackend for GeminiClient {
    #[instrument(skip(self, request), fields(model = %self.config.model, grounded = request.grounded_search))]
    async fn generate(&self, request: BackendRequest) -> Result<BackendReply, BackendError> {
        if self.config.api_key.is_empty() {
            return Err(BackendError::MissingApiKey);
        }

        let body = Self::build_body(&request);
        debug!(prompt_len = request.prompt.len(), "sending generateContent request");

        let response = self
            .http
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: payload.chars().take(500).collect(),
            });
        }

        let decoded: GenerateContentResponse = serde_json::from_str(&payload)
            .map_err(|e| BackendError::Protocol(e.to_string()))?;

        Ok(BackendReply {
            text: extract_text(&decoded),
            sources: extract_sources(&decoded),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uses_configured_model() {
        let client = GeminiClient::new(BackendConfig::with_model("key", "gemini-flash"));
        let endpoint = client.endpoint();
        assert!(endpoint.contains("googleapis.com"));
        assert!(endpoint.contains("/gemini-flash:generateContent"));
        assert!(endpoint.ends_with("key=key"));
    }

    #[test]
    fn test_base_url_override() {
        let config = BackendConfig::new("key").with_base_url("http://localhost:9090/models/");
        let client = GeminiClient::new(config);
        assert!(client.endpoint().starts_with("http://localhost:9090/models/"));
    }

    #[test]
    fn test_schema_toggles_json_mime() {
        let request = BackendRequest::new("hi").with_schema(serde_json::json!({"type": "object"}));
        let body = GeminiClient::build_body(&request);
        assert_eq!(
            body.generation_config.unwrap().response_mime_type,
            "application/json"
        );
        assert!(body.tools.is_none());
    }

    #[test]
    fn test_grounded_request_carries_search_tool() {
        let body = GeminiClient::build_body(&BackendRequest::new("hi").grounded());
        assert_eq!(body.tools.unwrap().len(), 1);
        assert!(body.generation_config.is_none());
    }

    #[test]
    fn test_extract_text_and_sources() {
        let payload = r#"{
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "numpy 1.26 pairs with " }, { "text": "tensorflow 2.16" }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "title": "PyPI", "uri": "https://pypi.org/project/numpy/" } },
                        { "web": { "uri": "https://github.com/tensorflow" } },
                        { "notWeb": {} }
                    ]
                }
            }]
        }"#;
        let decoded: GenerateContentResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(extract_text(&decoded), "numpy 1.26 pairs with tensorflow 2.16");

        let sources = extract_sources(&decoded);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "PyPI");
        assert_eq!(sources[1].title, "Doc");
    }

    #[test]
    fn test_empty_candidates_extracts_empty_reply() {
        let decoded: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(&decoded), "");
        assert!(extract_sources(&decoded).is_empty());
    }
}
