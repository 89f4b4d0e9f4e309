//! Membership plan catalog domain.
//!
//! - `aggregate` - MembershipPlan template
//! - `duration` - PlanDuration and the expiry calculation
//! - `plan_type` - Individual/couple/group capacity rules

mod aggregate;
mod duration;
mod plan_type;

pub use aggregate::{MembershipPlan, NewPlan};
pub use duration::{compute_end_date, PlanDuration};
pub use plan_type::{PlanType, MAX_GROUP_MEMBERS};
