//! # Package Doctor Core
//!
//! The "Brain" of Package Doctor - contains the resolution pipeline,
//! the reasoning backend client, and progress event plumbing.
//!
//! ## Architecture
//!
//! - `llm/` - Reasoning backend seam and the Gemini `generateContent` client
//! - `normalize` - Defensive decoding of semi-structured backend payloads
//! - `skills/` - Agent definitions (prompt, schema, parse rule per agent)
//! - `pipeline/` - Three-stage orchestration, step events, run state machine
//! - `models` - Backend configuration and shared domain types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pkgdoctor_core::llm::GeminiClient;
//! use pkgdoctor_core::models::{BackendConfig, ConflictRequest};
//! use pkgdoctor_core::pipeline::Resolver;
//! use std::sync::Arc;
//!
//! let backend = Arc::new(GeminiClient::new(BackendConfig::from_env()?));
//! let mut resolver = Resolver::new(backend);
//! let request = ConflictRequest::new(requirements, error_log);
//! let result = resolver.resolve(&request).await?;
//! ```

pub mod error;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod skills;

pub use error::DoctorError;
pub use models::{BackendConfig, ConflictRequest, ResolutionResult, SourceRef};
pub use pipeline::{AgentStep, Resolver};
