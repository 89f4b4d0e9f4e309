//! PostgreSQL implementation of GymDirectory.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, GymId};
use crate::domain::gym::GymSettings;
use crate::ports::GymDirectory;

pub struct PostgresGymDirectory {
    pool: PgPool,
}

impl PostgresGymDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GymDirectory for PostgresGymDirectory {
    async fn get(&self, gym_id: &GymId) -> Result<Option<GymSettings>, DomainError> {
        let row: Option<(Json<GymSettings>,)> = sqlx::query_as("SELECT document FROM gyms WHERE id = $1")
            .bind(gym_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to find gym: {}", e)))?;
        Ok(row.map(|(doc,)| doc.0))
    }

    async fn list(&self) -> Result<Vec<GymSettings>, DomainError> {
        let rows: Vec<(Json<GymSettings>,)> = sqlx::query_as("SELECT document FROM gyms ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to list gyms: {}", e)))?;
        Ok(rows.into_iter().map(|(doc,)| doc.0).collect())
    }

    async fn save(&self, settings: &GymSettings) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO gyms (id, name, document, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                document = EXCLUDED.document,
                updated_at = NOW()
            "#,
        )
        .bind(settings.gym_id.as_uuid())
        .bind(&settings.name)
        .bind(Json(settings))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to save gym: {}", e)))?;
        Ok(())
    }
}
