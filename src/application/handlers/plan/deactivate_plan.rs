//! DeactivatePlanHandler - Command handler for soft-disabling a plan.

use std::sync::Arc;

use crate::domain::foundation::{GymId, PlanId};
use crate::domain::membership::LifecycleError;
use crate::domain::plan::MembershipPlan;
use crate::ports::{Clock, PlanCatalog};

#[derive(Debug, Clone)]
pub struct DeactivatePlanCommand {
    pub gym_id: GymId,
    pub plan_id: PlanId,
}

/// Stops a plan from being sold. Existing grants keep their snapshot.
pub struct DeactivatePlanHandler {
    plans: Arc<dyn PlanCatalog>,
    clock: Arc<dyn Clock>,
}

impl DeactivatePlanHandler {
    pub fn new(plans: Arc<dyn PlanCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self { plans, clock }
    }

    pub async fn handle(&self, cmd: DeactivatePlanCommand) -> Result<MembershipPlan, LifecycleError> {
        let mut plan = self
            .plans
            .get_plan(&cmd.gym_id, &cmd.plan_id)
            .await?
            .ok_or(LifecycleError::PlanNotFound(cmd.plan_id))?;

        if plan.active {
            plan.deactivate(self.clock.now());
            self.plans.update_plan(&plan).await?;
            tracing::info!(gym_id = %plan.gym_id, plan_id = %plan.id, "Plan deactivated");
        }
        Ok(plan)
    }
}
