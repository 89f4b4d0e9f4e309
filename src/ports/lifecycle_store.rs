//! Lifecycle store port.
//!
//! Persists clients, assigned memberships and activities. All lifecycle
//! writes go through [`LifecycleStore::apply`], which commits a
//! [`LifecycleChanges`] batch as one transaction.
//!
//! # Design
//!
//! - **All or nothing**: a failing entry leaves nothing from the batch behind
//! - **Optimistic locking**: updated records carry the `version` they were read
//!   at; a mismatch fails the batch with `ConcurrentModification`
//! - **Unique phone numbers**: `(gym_id, phone_number)` is unique; a clash
//!   fails the batch with `PhoneNumberTaken`
//!
//! # Example
//!
//! ```ignore
//! let mut changes = LifecycleChanges::default();
//! changes.create_client(client.clone());
//! changes.create_membership(grant.clone());
//! changes.log(Activity::onboarding(&client, &grant, now));
//! store.apply(changes).await?;
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::activity::Activity;
use crate::domain::client::{Client, PhoneNumber};
use crate::domain::foundation::{ClientId, DomainError, GymId, MembershipId, Timestamp};
use crate::domain::membership::AssignedMembership;

/// A batch of writes committed together.
#[derive(Debug, Clone, Default)]
pub struct LifecycleChanges {
    pub new_clients: Vec<Client>,
    pub updated_clients: Vec<Client>,
    pub new_memberships: Vec<AssignedMembership>,
    pub updated_memberships: Vec<AssignedMembership>,
    pub activities: Vec<Activity>,
}

impl LifecycleChanges {
    pub fn create_client(&mut self, client: Client) {
        self.new_clients.push(client);
    }

    pub fn update_client(&mut self, client: Client) {
        self.updated_clients.push(client);
    }

    pub fn create_membership(&mut self, membership: AssignedMembership) {
        self.new_memberships.push(membership);
    }

    pub fn update_membership(&mut self, membership: AssignedMembership) {
        self.updated_memberships.push(membership);
    }

    pub fn log(&mut self, activity: Activity) {
        self.activities.push(activity);
    }

    pub fn is_empty(&self) -> bool {
        self.new_clients.is_empty()
            && self.updated_clients.is_empty()
            && self.new_memberships.is_empty()
            && self.updated_memberships.is_empty()
            && self.activities.is_empty()
    }
}

#[async_trait]
pub trait LifecycleStore: Send + Sync {
    async fn find_client(
        &self,
        gym_id: &GymId,
        client_id: &ClientId,
    ) -> Result<Option<Client>, DomainError>;

    /// Clients among `ids`; unknown ids are skipped.
    async fn find_clients(
        &self,
        gym_id: &GymId,
        ids: &[ClientId],
    ) -> Result<Vec<Client>, DomainError>;

    async fn find_client_by_phone(
        &self,
        gym_id: &GymId,
        phone_number: &PhoneNumber,
    ) -> Result<Option<Client>, DomainError>;

    async fn find_membership(
        &self,
        gym_id: &GymId,
        membership_id: &MembershipId,
    ) -> Result<Option<AssignedMembership>, DomainError>;

    /// Memberships among `ids`; unknown ids are skipped.
    async fn find_memberships(
        &self,
        gym_id: &GymId,
        ids: &[MembershipId],
    ) -> Result<Vec<AssignedMembership>, DomainError>;

    /// Clients whose `upcoming_membership` is set.
    async fn clients_with_upcoming(&self, gym_id: &GymId) -> Result<Vec<Client>, DomainError>;

    /// Memberships still `active` or `trial` whose `end_date` is before `today`.
    async fn memberships_due_for_expiry(
        &self,
        gym_id: &GymId,
        today: NaiveDate,
    ) -> Result<Vec<AssignedMembership>, DomainError>;

    /// Memberships still `active` or `trial` whose last day is `date`.
    async fn memberships_ending_on(
        &self,
        gym_id: &GymId,
        date: NaiveDate,
    ) -> Result<Vec<AssignedMembership>, DomainError>;

    /// Most recent activities first, optionally for one member.
    async fn list_activities(
        &self,
        gym_id: &GymId,
        member_id: Option<&ClientId>,
        limit: usize,
    ) -> Result<Vec<Activity>, DomainError>;

    /// Commits the batch atomically.
    ///
    /// # Errors
    ///
    /// - `PhoneNumberTaken` on a `(gym_id, phone_number)` clash
    /// - `ConcurrentModification` if an updated record changed since it was read
    /// - `ClientNotFound` / `MembershipNotFound` if an updated record doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn apply(&self, changes: LifecycleChanges) -> Result<(), DomainError>;

    /// Deletes activities that occurred before `cutoff`; returns how many.
    async fn purge_activities_before(
        &self,
        gym_id: &GymId,
        cutoff: Timestamp,
    ) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn LifecycleStore) {}
    }

    #[test]
    fn default_changes_are_empty() {
        assert!(LifecycleChanges::default().is_empty());
    }
}
