//! GetMembershipHistoryHandler - Query handler for a client's grants and activity.

use std::sync::Arc;

use crate::domain::activity::Activity;
use crate::domain::foundation::{ClientId, GymId};
use crate::domain::membership::{AssignedMembership, LifecycleError};
use crate::ports::LifecycleStore;

const DEFAULT_ACTIVITY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct GetMembershipHistoryQuery {
    pub gym_id: GymId,
    pub client_id: ClientId,
    pub activity_limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct MembershipHistory {
    pub client_id: ClientId,
    /// Grants in the order the client received them.
    pub memberships: Vec<AssignedMembership>,
    /// Most recent first.
    pub activities: Vec<Activity>,
}

pub struct GetMembershipHistoryHandler {
    store: Arc<dyn LifecycleStore>,
}

impl GetMembershipHistoryHandler {
    pub fn new(store: Arc<dyn LifecycleStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetMembershipHistoryQuery,
    ) -> Result<MembershipHistory, LifecycleError> {
        let client = self
            .store
            .find_client(&query.gym_id, &query.client_id)
            .await?
            .ok_or(LifecycleError::ClientNotFound(query.client_id))?;

        let memberships = self
            .store
            .find_memberships(&query.gym_id, client.membership_history())
            .await?;
        let activities = self
            .store
            .list_activities(
                &query.gym_id,
                Some(&client.id),
                query.activity_limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT),
            )
            .await?;

        Ok(MembershipHistory {
            client_id: client.id,
            memberships,
            activities,
        })
    }
}
