//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, calendar, errors, state machine)
//! - `plan` - Membership plan catalog entries and expiry math
//! - `membership` - Assigned memberships and their status lifecycle
//! - `client` - Client records and their membership linkage
//! - `activity` - Append-only activity log entries
//! - `gym` - Per-gym lifecycle settings

pub mod activity;
pub mod client;
pub mod foundation;
pub mod gym;
pub mod membership;
pub mod plan;
