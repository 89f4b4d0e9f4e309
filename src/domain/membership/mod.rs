//! Assigned membership domain module.
//!
//! Handles the lifecycle of concrete plan grants.
//!
//! # Module Structure
//!
//! - `aggregate` - AssignedMembership grant
//! - `status` - MembershipStatus state machine
//! - `errors` - LifecycleError taxonomy

mod aggregate;
mod errors;
mod status;

pub use aggregate::{initial_status, AssignedMembership, GrantOrigin, NewGrant};
pub use errors::LifecycleError;
pub use status::MembershipStatus;

pub use crate::domain::plan::compute_end_date;
