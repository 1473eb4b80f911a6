//! # Package Doctor Models
//!
//! Centralized backend configuration and the domain types shared across
//! the pipeline, the standalone tool operations, and the server surface.

use serde::{Deserialize, Serialize};

/// Default model used when no override is configured.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// Environment variable holding the backend API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable holding an optional model override.
pub const MODEL_ENV: &str = "PKGDOCTOR_MODEL";

/// Configuration for the reasoning backend connection.
///
/// Constructed once (usually via [`BackendConfig::from_env`]) and handed to
/// the client at startup. Nothing in the pipeline rebuilds the connection
/// per stage; the configured client is injected into the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// API key for the generative backend
    pub api_key: String,
    /// Model name (e.g., "gemini-3-pro-preview")
    pub model: String,
    /// Optional base URL override (for proxies / test servers)
    pub base_url: Option<String>,
}

impl BackendConfig {
    /// Create a config with the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
        }
    }

    /// Create a config for a specific model.
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    /// Set a base URL override (for OpenAI-compatible proxies or tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Load configuration from the environment.
    ///
    /// `GEMINI_API_KEY` is required; `PKGDOCTOR_MODEL` optionally overrides
    /// the default model.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| anyhow::anyhow!("{} not set", API_KEY_ENV))?;
        let model = std::env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self {
            api_key,
            model,
            base_url: None,
        })
    }
}

/// Immutable input for one resolution run.
///
/// Supplied once per run and never mutated; stages read from it but only
/// ever append their own outputs to the stage context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRequest {
    /// Raw requirements.txt content (or a pasted package list)
    pub requirements: String,
    /// Raw terminal output showing the dependency conflict
    pub error_log: String,
}

impl ConflictRequest {
    pub fn new(requirements: impl Into<String>, error_log: impl Into<String>) -> Self {
        Self {
            requirements: requirements.into(),
            error_log: error_log.into(),
        }
    }
}

/// A citation attached to a grounded backend response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub uri: String,
}

/// Terminal output of a resolution run.
///
/// `sources` is exactly the list the research stage produced; the synthesis
/// stage never adds, removes, or reorders citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub diagnosis: String,
    pub original_requirements: String,
    pub fixed_requirements: String,
    pub explanation: String,
    pub sources: Vec<SourceRef>,
}
