//! PostgreSQL implementation of PlanCatalog.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, GymId, PlanId};
use crate::domain::plan::MembershipPlan;
use crate::ports::PlanCatalog;

pub struct PostgresPlanCatalog {
    pool: PgPool,
}

impl PostgresPlanCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanCatalog for PostgresPlanCatalog {
    async fn get_plan(
        &self,
        gym_id: &GymId,
        plan_id: &PlanId,
    ) -> Result<Option<MembershipPlan>, DomainError> {
        let row: Option<(Json<MembershipPlan>,)> =
            sqlx::query_as("SELECT document FROM membership_plans WHERE id = $1 AND gym_id = $2")
                .bind(plan_id.as_uuid())
                .bind(gym_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(ErrorCode::DatabaseError, format!("Failed to find plan: {}", e))
                })?;
        Ok(row.map(|(doc,)| doc.0))
    }

    async fn list_plans(&self, gym_id: &GymId) -> Result<Vec<MembershipPlan>, DomainError> {
        let rows: Vec<(Json<MembershipPlan>,)> = sqlx::query_as(
            "SELECT document FROM membership_plans WHERE gym_id = $1 ORDER BY created_at ASC",
        )
        .bind(gym_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to list plans: {}", e)))?;
        Ok(rows.into_iter().map(|(doc,)| doc.0).collect())
    }

    async fn save_plan(&self, plan: &MembershipPlan) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO membership_plans (id, gym_id, active, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(plan.gym_id.as_uuid())
        .bind(plan.active)
        .bind(Json(plan))
        .bind(plan.created_at.as_datetime())
        .bind(plan.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to save plan: {}", e)))?;
        Ok(())
    }

    async fn update_plan(&self, plan: &MembershipPlan) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE membership_plans SET active = $3, document = $4, updated_at = $5
            WHERE id = $1 AND gym_id = $2
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(plan.gym_id.as_uuid())
        .bind(plan.active)
        .bind(Json(plan))
        .bind(plan.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to update plan: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PlanNotFound,
                format!("Plan not found: {}", plan.id),
            ));
        }
        Ok(())
    }
}
