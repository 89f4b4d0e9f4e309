//! PostgreSQL implementation of LifecycleStore.
//!
//! Clients, memberships and activities are stored as JSONB documents next to
//! the columns the lifecycle queries filter on. `apply` writes a whole batch
//! in one transaction; updates are guarded by the `version` column.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::activity::Activity;
use crate::domain::client::{Client, PhoneNumber};
use crate::domain::foundation::{
    ClientId, DomainError, ErrorCode, GymId, MembershipId, Timestamp,
};
use crate::domain::membership::AssignedMembership;
use crate::ports::{LifecycleChanges, LifecycleStore};

/// Unique `(gym_id, phone_number)` constraint on `clients`.
const PHONE_CONSTRAINT: &str = "clients_gym_phone_key";

/// Statuses of grants still in force.
const IN_FORCE: [&str; 2] = ["active", "trial"];

pub struct PostgresLifecycleStore {
    pool: PgPool,
}

impl PostgresLifecycleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

/// Maps a client write failure, recognising the phone uniqueness constraint.
fn client_write_error(client: &Client, e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.constraint() == Some(PHONE_CONSTRAINT) {
            return DomainError::new(
                ErrorCode::PhoneNumberTaken,
                format!("Phone number {} is already registered", client.phone_number),
            )
            .with_detail("phone_number", client.phone_number.as_str());
        }
    }
    db_error("Failed to write client", e)
}

fn stale(kind: &str, id: &str) -> DomainError {
    DomainError::new(
        ErrorCode::ConcurrentModification,
        format!("{} {} was modified concurrently", kind, id),
    )
}

/// Orders `found` like `ids`, dropping ids that weren't found.
fn in_order<K, T>(ids: &[K], found: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T>
where
    K: std::hash::Hash + Eq + Copy,
{
    let mut by_id: HashMap<K, T> = found.into_iter().map(|item| (key(&item), item)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

async fn insert_client(tx: &mut Transaction<'_, Postgres>, client: &Client) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO clients (
            id, gym_id, phone_number, upcoming_membership_id, version, document, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(client.id.as_uuid())
    .bind(client.gym_id.as_uuid())
    .bind(client.phone_number.as_str())
    .bind(client.upcoming_membership().map(|id| *id.as_uuid()))
    .bind(client.version)
    .bind(Json(client))
    .bind(client.created_at.as_datetime())
    .bind(client.updated_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| client_write_error(client, e))?;
    Ok(())
}

async fn update_client(tx: &mut Transaction<'_, Postgres>, mut client: Client) -> Result<(), DomainError> {
    let expected = client.version;
    client.version += 1;

    let result = sqlx::query(
        r#"
        UPDATE clients SET
            phone_number = $3,
            upcoming_membership_id = $4,
            version = version + 1,
            document = $5,
            updated_at = $6
        WHERE id = $1 AND gym_id = $2 AND version = $7
        "#,
    )
    .bind(client.id.as_uuid())
    .bind(client.gym_id.as_uuid())
    .bind(client.phone_number.as_str())
    .bind(client.upcoming_membership().map(|id| *id.as_uuid()))
    .bind(Json(&client))
    .bind(client.updated_at.as_datetime())
    .bind(expected)
    .execute(&mut **tx)
    .await
    .map_err(|e| client_write_error(&client, e))?;

    if result.rows_affected() == 0 {
        let exists: Option<(i32,)> = sqlx::query_as("SELECT version FROM clients WHERE id = $1 AND gym_id = $2")
            .bind(client.id.as_uuid())
            .bind(client.gym_id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_error("Failed to check client", e))?;
        return Err(match exists {
            Some(_) => stale("Client", &client.id.to_string()),
            None => DomainError::new(
                ErrorCode::ClientNotFound,
                format!("Client not found: {}", client.id),
            ),
        });
    }
    Ok(())
}

async fn insert_membership(
    tx: &mut Transaction<'_, Postgres>,
    membership: &AssignedMembership,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO assigned_memberships (
            id, gym_id, status, start_date, end_date, version, document, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(membership.id.as_uuid())
    .bind(membership.gym_id.as_uuid())
    .bind(membership.status.as_str())
    .bind(membership.start_date)
    .bind(membership.end_date)
    .bind(membership.version)
    .bind(Json(membership))
    .bind(membership.created_at.as_datetime())
    .bind(membership.updated_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to insert membership", e))?;
    Ok(())
}

async fn update_membership(
    tx: &mut Transaction<'_, Postgres>,
    mut membership: AssignedMembership,
) -> Result<(), DomainError> {
    let expected = membership.version;
    membership.version += 1;

    let result = sqlx::query(
        r#"
        UPDATE assigned_memberships SET
            status = $3,
            version = version + 1,
            document = $4,
            updated_at = $5
        WHERE id = $1 AND gym_id = $2 AND version = $6
        "#,
    )
    .bind(membership.id.as_uuid())
    .bind(membership.gym_id.as_uuid())
    .bind(membership.status.as_str())
    .bind(Json(&membership))
    .bind(membership.updated_at.as_datetime())
    .bind(expected)
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to update membership", e))?;

    if result.rows_affected() == 0 {
        let exists: Option<(i32,)> =
            sqlx::query_as("SELECT version FROM assigned_memberships WHERE id = $1 AND gym_id = $2")
                .bind(membership.id.as_uuid())
                .bind(membership.gym_id.as_uuid())
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| db_error("Failed to check membership", e))?;
        return Err(match exists {
            Some(_) => stale("Membership", &membership.id.to_string()),
            None => DomainError::new(
                ErrorCode::MembershipNotFound,
                format!("Membership not found: {}", membership.id),
            ),
        });
    }
    Ok(())
}

async fn insert_activity(tx: &mut Transaction<'_, Postgres>, activity: &Activity) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO activities (id, gym_id, member_id, activity_type, document, occurred_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(activity.id.as_uuid())
    .bind(activity.gym_id.as_uuid())
    .bind(activity.member_id.as_uuid())
    .bind(activity.activity_type.as_str())
    .bind(Json(activity))
    .bind(activity.occurred_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to insert activity", e))?;
    Ok(())
}

#[async_trait]
impl LifecycleStore for PostgresLifecycleStore {
    async fn find_client(
        &self,
        gym_id: &GymId,
        client_id: &ClientId,
    ) -> Result<Option<Client>, DomainError> {
        let row: Option<(Json<Client>,)> =
            sqlx::query_as("SELECT document FROM clients WHERE id = $1 AND gym_id = $2")
                .bind(client_id.as_uuid())
                .bind(gym_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find client", e))?;
        Ok(row.map(|(doc,)| doc.0))
    }

    async fn find_clients(
        &self,
        gym_id: &GymId,
        ids: &[ClientId],
    ) -> Result<Vec<Client>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<(Json<Client>,)> =
            sqlx::query_as("SELECT document FROM clients WHERE gym_id = $1 AND id = ANY($2)")
                .bind(gym_id.as_uuid())
                .bind(&uuids)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find clients", e))?;
        let found = rows.into_iter().map(|(doc,)| doc.0).collect();
        Ok(in_order(ids, found, |c: &Client| c.id))
    }

    async fn find_client_by_phone(
        &self,
        gym_id: &GymId,
        phone_number: &PhoneNumber,
    ) -> Result<Option<Client>, DomainError> {
        let row: Option<(Json<Client>,)> =
            sqlx::query_as("SELECT document FROM clients WHERE gym_id = $1 AND phone_number = $2")
                .bind(gym_id.as_uuid())
                .bind(phone_number.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find client by phone", e))?;
        Ok(row.map(|(doc,)| doc.0))
    }

    async fn find_membership(
        &self,
        gym_id: &GymId,
        membership_id: &MembershipId,
    ) -> Result<Option<AssignedMembership>, DomainError> {
        let row: Option<(Json<AssignedMembership>,)> =
            sqlx::query_as("SELECT document FROM assigned_memberships WHERE id = $1 AND gym_id = $2")
                .bind(membership_id.as_uuid())
                .bind(gym_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find membership", e))?;
        Ok(row.map(|(doc,)| doc.0))
    }

    async fn find_memberships(
        &self,
        gym_id: &GymId,
        ids: &[MembershipId],
    ) -> Result<Vec<AssignedMembership>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<(Json<AssignedMembership>,)> = sqlx::query_as(
            "SELECT document FROM assigned_memberships WHERE gym_id = $1 AND id = ANY($2)",
        )
        .bind(gym_id.as_uuid())
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find memberships", e))?;
        let found = rows.into_iter().map(|(doc,)| doc.0).collect();
        Ok(in_order(ids, found, |m: &AssignedMembership| m.id))
    }

    async fn clients_with_upcoming(&self, gym_id: &GymId) -> Result<Vec<Client>, DomainError> {
        let rows: Vec<(Json<Client>,)> = sqlx::query_as(
            r#"
            SELECT document FROM clients
            WHERE gym_id = $1 AND upcoming_membership_id IS NOT NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(gym_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find clients with upcoming memberships", e))?;
        Ok(rows.into_iter().map(|(doc,)| doc.0).collect())
    }

    async fn memberships_due_for_expiry(
        &self,
        gym_id: &GymId,
        today: NaiveDate,
    ) -> Result<Vec<AssignedMembership>, DomainError> {
        let rows: Vec<(Json<AssignedMembership>,)> = sqlx::query_as(
            r#"
            SELECT document FROM assigned_memberships
            WHERE gym_id = $1 AND status = ANY($2) AND end_date < $3
            ORDER BY end_date ASC, created_at ASC
            "#,
        )
        .bind(gym_id.as_uuid())
        .bind(&IN_FORCE[..])
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find memberships due for expiry", e))?;
        Ok(rows.into_iter().map(|(doc,)| doc.0).collect())
    }

    async fn memberships_ending_on(
        &self,
        gym_id: &GymId,
        date: NaiveDate,
    ) -> Result<Vec<AssignedMembership>, DomainError> {
        let rows: Vec<(Json<AssignedMembership>,)> = sqlx::query_as(
            r#"
            SELECT document FROM assigned_memberships
            WHERE gym_id = $1 AND status = ANY($2) AND end_date = $3
            ORDER BY created_at ASC
            "#,
        )
        .bind(gym_id.as_uuid())
        .bind(&IN_FORCE[..])
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find memberships ending on date", e))?;
        Ok(rows.into_iter().map(|(doc,)| doc.0).collect())
    }

    async fn list_activities(
        &self,
        gym_id: &GymId,
        member_id: Option<&ClientId>,
        limit: usize,
    ) -> Result<Vec<Activity>, DomainError> {
        let rows: Vec<(Json<Activity>,)> = sqlx::query_as(
            r#"
            SELECT document FROM activities
            WHERE gym_id = $1 AND ($2::uuid IS NULL OR member_id = $2)
            ORDER BY occurred_at DESC
            LIMIT $3
            "#,
        )
        .bind(gym_id.as_uuid())
        .bind(member_id.map(|id| *id.as_uuid()))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list activities", e))?;
        Ok(rows.into_iter().map(|(doc,)| doc.0).collect())
    }

    async fn apply(&self, changes: LifecycleChanges) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to start transaction", e))?;

        for client in &changes.new_clients {
            insert_client(&mut tx, client).await?;
        }
        for client in changes.updated_clients {
            update_client(&mut tx, client).await?;
        }
        for membership in &changes.new_memberships {
            insert_membership(&mut tx, membership).await?;
        }
        for membership in changes.updated_memberships {
            update_membership(&mut tx, membership).await?;
        }
        for activity in &changes.activities {
            insert_activity(&mut tx, activity).await?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;
        Ok(())
    }

    async fn purge_activities_before(
        &self,
        gym_id: &GymId,
        cutoff: Timestamp,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM activities WHERE gym_id = $1 AND occurred_at < $2")
            .bind(gym_id.as_uuid())
            .bind(cutoff.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to purge activities", e))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::membership::MembershipStatus;

    #[test]
    fn in_order_follows_requested_ids_and_skips_missing() {
        let a = ClientId::new();
        let b = ClientId::new();
        let missing = ClientId::new();

        let ordered = in_order(&[b, missing, a], vec![(a, "a"), (b, "b")], |item| item.0);
        let names: Vec<_> = ordered.iter().map(|item| item.1).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn in_force_statuses_match_status_spelling() {
        assert_eq!(IN_FORCE, [MembershipStatus::Active.as_str(), MembershipStatus::Trial.as_str()]);
    }
}
