//! # Package Doctor Skills
//!
//! Agent definitions for the resolution pipeline and the standalone tool
//! surface. Each skill is a pure description of one backend invocation:
//! how to build the request from prior outputs, which response shape to ask
//! for, and how to decode whatever comes back. Skills hold no state and no
//! connection - the orchestrator owns the backend client.
//!
//! **Pipeline agents** (run in order by [`crate::pipeline::Resolver`]):
//! - `QuerySkill` - extract conflict signatures and a search query
//! - `ResearchSkill` - grounded search for compatible versions
//! - `SurgeonSkill` - synthesize the fixed manifest
//!
//! **Standalone tools** (single invocation, no pipeline):
//! - `SolveSkill` - one-shot manifest fix
//! - `SimulateSkill` - predict a pip install before it happens

pub mod prompts;

pub mod query_skill;
pub mod research_skill;
pub mod surgeon_skill;

pub mod simulate_skill;
pub mod solve_skill;

pub use query_skill::{DependencyIssue, QueryOutput, QuerySkill};
pub use research_skill::{ResearchOutput, ResearchSkill};
pub use simulate_skill::{SimulateSkill, SimulationReport};
pub use solve_skill::SolveSkill;
pub use surgeon_skill::{SurgeonOutput, SurgeonSkill};

/// A decoded stage output plus whether fallbacks were substituted while
/// decoding it. Degraded output still flows downstream; the flag only
/// annotates reduced confidence.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub output: T,
    pub degraded: bool,
}
