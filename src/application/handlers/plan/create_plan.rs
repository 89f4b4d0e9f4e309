//! CreatePlanHandler - Command handler for adding a plan to a gym's catalog.

use std::sync::Arc;

use crate::domain::foundation::GymId;
use crate::domain::membership::LifecycleError;
use crate::domain::plan::{MembershipPlan, NewPlan, PlanDuration, PlanType};
use crate::ports::{Clock, GymDirectory, PlanCatalog};

/// Command to create a plan.
///
/// Exactly one of `duration_in_months` and `duration_in_days` must be positive.
#[derive(Debug, Clone)]
pub struct CreatePlanCommand {
    pub gym_id: GymId,
    pub plan_name: String,
    pub duration_in_months: Option<u32>,
    pub duration_in_days: Option<u32>,
    pub price: i64,
    pub is_trial: bool,
    pub plan_type: PlanType,
    pub members_allowed: u32,
}

pub struct CreatePlanHandler {
    gyms: Arc<dyn GymDirectory>,
    plans: Arc<dyn PlanCatalog>,
    clock: Arc<dyn Clock>,
}

impl CreatePlanHandler {
    pub fn new(
        gyms: Arc<dyn GymDirectory>,
        plans: Arc<dyn PlanCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { gyms, plans, clock }
    }

    pub async fn handle(&self, cmd: CreatePlanCommand) -> Result<MembershipPlan, LifecycleError> {
        if self.gyms.get(&cmd.gym_id).await?.is_none() {
            return Err(LifecycleError::GymNotFound(cmd.gym_id));
        }

        let duration = PlanDuration::from_parts(cmd.duration_in_months, cmd.duration_in_days)?;
        let plan = MembershipPlan::create(
            cmd.gym_id,
            NewPlan {
                plan_name: cmd.plan_name,
                duration,
                price: cmd.price,
                is_trial: cmd.is_trial,
                plan_type: cmd.plan_type,
                members_allowed: cmd.members_allowed,
            },
            self.clock.now(),
        )?;
        self.plans.save_plan(&plan).await?;

        tracing::info!(gym_id = %plan.gym_id, plan_id = %plan.id, plan_name = %plan.plan_name, "Plan created");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::SystemClock;
    use crate::adapters::memory::{InMemoryGymDirectory, InMemoryPlanCatalog};
    use crate::domain::gym::GymSettings;

    fn setup() -> (GymId, Arc<InMemoryPlanCatalog>, CreatePlanHandler) {
        let gym = GymSettings::new(GymId::new(), "Iron Temple");
        let gym_id = gym.gym_id;
        let plans = Arc::new(InMemoryPlanCatalog::new());
        let handler = CreatePlanHandler::new(
            Arc::new(InMemoryGymDirectory::with_gyms([gym])),
            plans.clone(),
            Arc::new(SystemClock),
        );
        (gym_id, plans, handler)
    }

    fn command(gym_id: GymId) -> CreatePlanCommand {
        CreatePlanCommand {
            gym_id,
            plan_name: "Quarterly".to_string(),
            duration_in_months: Some(3),
            duration_in_days: None,
            price: 2700,
            is_trial: false,
            plan_type: PlanType::Individual,
            members_allowed: 1,
        }
    }

    #[tokio::test]
    async fn creates_active_plan() {
        let (gym_id, plans, handler) = setup();

        let plan = handler.handle(command(gym_id)).await.unwrap();
        assert!(plan.active);
        assert_eq!(plan.duration, PlanDuration::Months(3));

        let stored = plans.get_plan(&gym_id, &plan.id).await.unwrap();
        assert_eq!(stored, Some(plan));
    }

    #[tokio::test]
    async fn rejects_both_durations() {
        let (gym_id, _, handler) = setup();
        let mut cmd = command(gym_id);
        cmd.duration_in_days = Some(7);

        let result = handler.handle(cmd).await;
        assert!(matches!(result, Err(LifecycleError::ValidationFailed { .. })));
    }

    #[tokio::test]
    async fn rejects_couple_plan_for_three() {
        let (gym_id, _, handler) = setup();
        let mut cmd = command(gym_id);
        cmd.plan_type = PlanType::Couple;
        cmd.members_allowed = 3;

        let result = handler.handle(cmd).await;
        assert!(matches!(result, Err(LifecycleError::ValidationFailed { .. })));
    }

    #[tokio::test]
    async fn fails_for_unknown_gym() {
        let (_, _, handler) = setup();
        let result = handler.handle(command(GymId::new())).await;
        assert!(matches!(result, Err(LifecycleError::GymNotFound(_))));
    }
}
