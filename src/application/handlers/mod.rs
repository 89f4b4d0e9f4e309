//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod gym;
pub mod lifecycle;
pub mod plan;
