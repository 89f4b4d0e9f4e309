//! In-memory plan catalog.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, GymId, PlanId};
use crate::domain::plan::MembershipPlan;
use crate::ports::PlanCatalog;

#[derive(Debug, Default)]
pub struct InMemoryPlanCatalog {
    plans: RwLock<HashMap<PlanId, MembershipPlan>>,
}

impl InMemoryPlanCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlanCatalog for InMemoryPlanCatalog {
    async fn get_plan(
        &self,
        gym_id: &GymId,
        plan_id: &PlanId,
    ) -> Result<Option<MembershipPlan>, DomainError> {
        Ok(self
            .plans
            .read()
            .await
            .get(plan_id)
            .filter(|p| &p.gym_id == gym_id)
            .cloned())
    }

    async fn list_plans(&self, gym_id: &GymId) -> Result<Vec<MembershipPlan>, DomainError> {
        let mut plans: Vec<_> = self
            .plans
            .read()
            .await
            .values()
            .filter(|p| &p.gym_id == gym_id)
            .cloned()
            .collect();
        plans.sort_by_key(|p| p.created_at);
        Ok(plans)
    }

    async fn save_plan(&self, plan: &MembershipPlan) -> Result<(), DomainError> {
        self.plans.write().await.insert(plan.id, plan.clone());
        Ok(())
    }

    async fn update_plan(&self, plan: &MembershipPlan) -> Result<(), DomainError> {
        let mut plans = self.plans.write().await;
        match plans.get_mut(&plan.id) {
            Some(existing) => {
                *existing = plan.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::PlanNotFound,
                format!("Plan not found: {}", plan.id),
            )),
        }
    }
}
