//! # Reasoning Backend
//!
//! The seam between the pipeline and the generative backend. Everything
//! upstream of this module treats the backend as one opaque operation:
//! instruction text in, raw text plus optional citations out.
//!
//! The schema in a [`BackendRequest`] is a request, not a guarantee - the
//! backend is instructed to honor it but routinely does not, which is why
//! decoding lives in [`crate::normalize`] rather than here.

pub mod gemini;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::SourceRef;

pub use gemini::GeminiClient;

/// One structured request to the reasoning backend.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    /// System instruction establishing the agent's role
    pub system: Option<&'static str>,
    /// Free-form instruction text for this invocation
    pub prompt: String,
    /// Expected response shape (JSON schema description), if any.
    /// When set, the backend is asked for `application/json` output.
    pub response_schema: Option<Value>,
    /// Whether the backend may use grounded web search and attach
    /// citation metadata to the reply.
    pub grounded_search: bool,
}

impl BackendRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            response_schema: None,
            grounded_search: false,
        }
    }

    pub fn with_system(mut self, system: &'static str) -> Self {
        self.system = Some(system);
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn grounded(mut self) -> Self {
        self.grounded_search = true;
        self
    }
}

/// Raw reply from the reasoning backend.
///
/// `text` is whatever the model produced - hopefully JSON matching the
/// requested schema, but never trusted to be. `sources` carries grounding
/// citations delivered out-of-band (not inside the JSON body).
#[derive(Debug, Clone, Default)]
pub struct BackendReply {
    pub text: String,
    pub sources: Vec<SourceRef>,
}

/// Failures talking to the backend. All of these are fatal for the run
/// in progress; retry policy, if any, belongs to the caller.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend API key is not configured")]
    MissingApiKey,

    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response envelope from backend: {0}")]
    Protocol(String),
}

/// The one operation the pipeline needs from a generative backend.
///
/// Implemented by [`GeminiClient`] in production and by scripted mocks in
/// tests. Exactly one outbound call per invocation; no retries here.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn generate(&self, request: BackendRequest) -> Result<BackendReply, BackendError>;
}

/// Shorthand for a `{type: "object"}` schema description.
///
/// `props` maps field names to property schemas; `required` lists the
/// fields the backend must populate.
pub fn object_schema(props: &[(&str, Value)], required: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = props
        .iter()
        .map(|(name, schema)| (name.to_string(), schema.clone()))
        .collect();
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

pub fn string_prop() -> Value {
    serde_json::json!({ "type": "string" })
}

pub fn string_array_prop() -> Value {
    serde_json::json!({ "type": "array", "items": { "type": "string" } })
}

pub fn object_array_prop(props: &[(&str, Value)]) -> Value {
    let properties: serde_json::Map<String, Value> = props
        .iter()
        .map(|(name, schema)| (name.to_string(), schema.clone()))
        .collect();
    serde_json::json!({
        "type": "array",
        "items": { "type": "object", "properties": properties },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = BackendRequest::new("find versions")
            .with_schema(string_prop())
            .grounded();
        assert!(request.grounded_search);
        assert!(request.response_schema.is_some());
        assert!(request.system.is_none());
    }

    #[test]
    fn test_object_schema_shape() {
        let schema = object_schema(
            &[("searchQuery", string_prop()), ("tags", string_array_prop())],
            &["searchQuery"],
        );
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["searchQuery"]["type"], "string");
        assert_eq!(schema["required"][0], "searchQuery");
    }
}
