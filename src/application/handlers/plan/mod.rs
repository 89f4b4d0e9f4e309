//! Plan catalog handlers.
//!
//! ## Commands
//! - Creating a plan
//! - Soft-disabling a plan
//!
//! ## Queries
//! - Listing a gym's plans

mod create_plan;
mod deactivate_plan;
mod list_plans;

// Commands
pub use create_plan::{CreatePlanCommand, CreatePlanHandler};
pub use deactivate_plan::{DeactivatePlanCommand, DeactivatePlanHandler};

// Queries
pub use list_plans::{ListPlansHandler, ListPlansQuery};
