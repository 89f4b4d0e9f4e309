//! In-memory lifecycle store.
//!
//! `apply` stages the batch on a copy of the state and swaps it in only when
//! every entry passed its checks, so a rejected batch leaves nothing behind.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::activity::Activity;
use crate::domain::client::{Client, PhoneNumber};
use crate::domain::foundation::{
    ClientId, DomainError, ErrorCode, GymId, MembershipId, Timestamp,
};
use crate::domain::membership::AssignedMembership;
use crate::ports::{LifecycleChanges, LifecycleStore};

#[derive(Debug, Clone, Default)]
struct State {
    clients: HashMap<ClientId, Client>,
    memberships: HashMap<MembershipId, AssignedMembership>,
    activities: Vec<Activity>,
}

impl State {
    fn phone_taken(&self, client: &Client) -> bool {
        self.clients.values().any(|c| {
            c.gym_id == client.gym_id && c.phone_number == client.phone_number && c.id != client.id
        })
    }

    fn stage(&mut self, changes: LifecycleChanges) -> Result<(), DomainError> {
        for client in changes.new_clients {
            if self.clients.contains_key(&client.id) {
                return Err(DomainError::new(
                    ErrorCode::ConcurrentModification,
                    format!("Client {} already exists", client.id),
                ));
            }
            if self.phone_taken(&client) {
                return Err(phone_taken(&client.phone_number));
            }
            self.clients.insert(client.id, client);
        }

        for mut client in changes.updated_clients {
            let stored = self.clients.get(&client.id).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::ClientNotFound,
                    format!("Client not found: {}", client.id),
                )
            })?;
            if stored.version != client.version {
                return Err(stale("Client", &client.id.to_string()));
            }
            if self.phone_taken(&client) {
                return Err(phone_taken(&client.phone_number));
            }
            client.version += 1;
            self.clients.insert(client.id, client);
        }

        for membership in changes.new_memberships {
            if self.memberships.contains_key(&membership.id) {
                return Err(DomainError::new(
                    ErrorCode::ConcurrentModification,
                    format!("Membership {} already exists", membership.id),
                ));
            }
            self.memberships.insert(membership.id, membership);
        }

        for mut membership in changes.updated_memberships {
            let stored = self.memberships.get(&membership.id).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::MembershipNotFound,
                    format!("Membership not found: {}", membership.id),
                )
            })?;
            if stored.version != membership.version {
                return Err(stale("Membership", &membership.id.to_string()));
            }
            membership.version += 1;
            self.memberships.insert(membership.id, membership);
        }

        self.activities.extend(changes.activities);
        Ok(())
    }
}

fn phone_taken(phone: &PhoneNumber) -> DomainError {
    DomainError::new(
        ErrorCode::PhoneNumberTaken,
        format!("Phone number {} is already registered", phone),
    )
    .with_detail("phone_number", phone.as_str())
}

fn stale(kind: &str, id: &str) -> DomainError {
    DomainError::new(
        ErrorCode::ConcurrentModification,
        format!("{} {} was modified concurrently", kind, id),
    )
}

/// Lifecycle store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryLifecycleStore {
    state: RwLock<State>,
}

impl InMemoryLifecycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All activities, oldest first.
    pub async fn activities(&self) -> Vec<Activity> {
        self.state.read().await.activities.clone()
    }

    /// All memberships of a gym, oldest first.
    pub async fn memberships(&self, gym_id: &GymId) -> Vec<AssignedMembership> {
        let state = self.state.read().await;
        let mut memberships: Vec<_> = state
            .memberships
            .values()
            .filter(|m| &m.gym_id == gym_id)
            .cloned()
            .collect();
        memberships.sort_by_key(|m| m.created_at);
        memberships
    }
}

#[async_trait]
impl LifecycleStore for InMemoryLifecycleStore {
    async fn find_client(
        &self,
        gym_id: &GymId,
        client_id: &ClientId,
    ) -> Result<Option<Client>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .clients
            .get(client_id)
            .filter(|c| &c.gym_id == gym_id)
            .cloned())
    }

    async fn find_clients(
        &self,
        gym_id: &GymId,
        ids: &[ClientId],
    ) -> Result<Vec<Client>, DomainError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.clients.get(id))
            .filter(|c| &c.gym_id == gym_id)
            .cloned()
            .collect())
    }

    async fn find_client_by_phone(
        &self,
        gym_id: &GymId,
        phone_number: &PhoneNumber,
    ) -> Result<Option<Client>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .clients
            .values()
            .find(|c| &c.gym_id == gym_id && &c.phone_number == phone_number)
            .cloned())
    }

    async fn find_membership(
        &self,
        gym_id: &GymId,
        membership_id: &MembershipId,
    ) -> Result<Option<AssignedMembership>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .get(membership_id)
            .filter(|m| &m.gym_id == gym_id)
            .cloned())
    }

    async fn find_memberships(
        &self,
        gym_id: &GymId,
        ids: &[MembershipId],
    ) -> Result<Vec<AssignedMembership>, DomainError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.memberships.get(id))
            .filter(|m| &m.gym_id == gym_id)
            .cloned()
            .collect())
    }

    async fn clients_with_upcoming(&self, gym_id: &GymId) -> Result<Vec<Client>, DomainError> {
        let state = self.state.read().await;
        let mut clients: Vec<_> = state
            .clients
            .values()
            .filter(|c| &c.gym_id == gym_id && c.upcoming_membership().is_some())
            .cloned()
            .collect();
        clients.sort_by_key(|c| c.created_at);
        Ok(clients)
    }

    async fn memberships_due_for_expiry(
        &self,
        gym_id: &GymId,
        today: NaiveDate,
    ) -> Result<Vec<AssignedMembership>, DomainError> {
        let state = self.state.read().await;
        let mut due: Vec<_> = state
            .memberships
            .values()
            .filter(|m| &m.gym_id == gym_id && m.status.is_in_force() && m.end_date < today)
            .cloned()
            .collect();
        due.sort_by_key(|m| (m.end_date, m.created_at));
        Ok(due)
    }

    async fn memberships_ending_on(
        &self,
        gym_id: &GymId,
        date: NaiveDate,
    ) -> Result<Vec<AssignedMembership>, DomainError> {
        let state = self.state.read().await;
        let mut ending: Vec<_> = state
            .memberships
            .values()
            .filter(|m| &m.gym_id == gym_id && m.status.is_in_force() && m.end_date == date)
            .cloned()
            .collect();
        ending.sort_by_key(|m| m.created_at);
        Ok(ending)
    }

    async fn list_activities(
        &self,
        gym_id: &GymId,
        member_id: Option<&ClientId>,
        limit: usize,
    ) -> Result<Vec<Activity>, DomainError> {
        let state = self.state.read().await;
        let mut activities: Vec<_> = state
            .activities
            .iter()
            .filter(|a| &a.gym_id == gym_id)
            .filter(|a| member_id.map_or(true, |id| &a.member_id == id))
            .cloned()
            .collect();
        activities.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        activities.truncate(limit);
        Ok(activities)
    }

    async fn apply(&self, changes: LifecycleChanges) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();
        staged.stage(changes)?;
        *state = staged;
        Ok(())
    }

    async fn purge_activities_before(
        &self,
        gym_id: &GymId,
        cutoff: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut state = self.state.write().await;
        let before = state.activities.len();
        state
            .activities
            .retain(|a| &a.gym_id != gym_id || !a.occurred_at.is_before(&cutoff));
        Ok((before - state.activities.len()) as u64)
    }
}
