//! API route modules.

pub mod resolve;
