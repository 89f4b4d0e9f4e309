//! ListPlansHandler - Query handler for a gym's catalog.

use std::sync::Arc;

use crate::domain::foundation::GymId;
use crate::domain::membership::LifecycleError;
use crate::domain::plan::MembershipPlan;
use crate::ports::PlanCatalog;

#[derive(Debug, Clone)]
pub struct ListPlansQuery {
    pub gym_id: GymId,
    pub include_inactive: bool,
}

pub struct ListPlansHandler {
    plans: Arc<dyn PlanCatalog>,
}

impl ListPlansHandler {
    pub fn new(plans: Arc<dyn PlanCatalog>) -> Self {
        Self { plans }
    }

    pub async fn handle(&self, query: ListPlansQuery) -> Result<Vec<MembershipPlan>, LifecycleError> {
        let mut plans = self.plans.list_plans(&query.gym_id).await?;
        if !query.include_inactive {
            plans.retain(|p| p.active);
        }
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPlanCatalog;
    use crate::domain::foundation::Timestamp;
    use crate::domain::plan::{NewPlan, PlanDuration, PlanType};

    #[tokio::test]
    async fn hides_inactive_plans_unless_asked() {
        let gym_id = GymId::new();
        let catalog = Arc::new(InMemoryPlanCatalog::new());
        for (name, active) in [("Monthly", true), ("Old Annual", false)] {
            let mut plan = MembershipPlan::create(
                gym_id,
                NewPlan {
                    plan_name: name.to_string(),
                    duration: PlanDuration::Months(1),
                    price: 1000,
                    is_trial: false,
                    plan_type: PlanType::Individual,
                    members_allowed: 1,
                },
                Timestamp::now(),
            )
            .unwrap();
            if !active {
                plan.deactivate(Timestamp::now());
            }
            catalog.save_plan(&plan).await.unwrap();
        }
        let handler = ListPlansHandler::new(catalog);

        let active = handler
            .handle(ListPlansQuery { gym_id, include_inactive: false })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].plan_name, "Monthly");

        let all = handler
            .handle(ListPlansQuery { gym_id, include_inactive: true })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
