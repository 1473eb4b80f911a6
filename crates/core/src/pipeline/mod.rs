//! # Resolution Pipeline
//!
//! Orchestrates the three reasoning agents for one conflict request.
//!
//! ## Pipeline Flow
//!
//! ```text
//! ConflictRequest -> Query Creator -> Research Team -> Code Surgeon -> ResolutionResult
//! ```
//!
//! Stages run strictly in order; each one's request is built from the
//! original input plus the previous outputs. Progress is delivered as
//! [`AgentStep`] records with stable ids, so observers update rows in
//! place rather than appending duplicates.

pub mod events;
pub mod phase;
pub mod resolver;
pub mod stages;

pub use events::{AgentName, AgentStep, StepStatus, StepTracker};
pub use phase::RunPhase;
pub use resolver::Resolver;
pub use stages::{StageContext, StageKind};
