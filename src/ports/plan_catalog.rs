//! Plan catalog port.
//!
//! Plans are templates configured per gym. They are never deleted once a
//! grant references them; `MembershipPlan::deactivate` soft-disables instead.

use crate::domain::foundation::{DomainError, GymId, PlanId};
use crate::domain::plan::MembershipPlan;
use async_trait::async_trait;

#[async_trait]
pub trait PlanCatalog: Send + Sync {
    /// Looks up a plan within a gym.
    ///
    /// Returns `None` if the plan does not exist or belongs to another gym.
    async fn get_plan(
        &self,
        gym_id: &GymId,
        plan_id: &PlanId,
    ) -> Result<Option<MembershipPlan>, DomainError>;

    /// All plans of a gym, inactive ones included, oldest first.
    async fn list_plans(&self, gym_id: &GymId) -> Result<Vec<MembershipPlan>, DomainError>;

    /// Stores a new plan.
    async fn save_plan(&self, plan: &MembershipPlan) -> Result<(), DomainError>;

    /// Replaces an existing plan.
    ///
    /// # Errors
    ///
    /// - `PlanNotFound` if the plan doesn't exist
    async fn update_plan(&self, plan: &MembershipPlan) -> Result<(), DomainError>;
}
