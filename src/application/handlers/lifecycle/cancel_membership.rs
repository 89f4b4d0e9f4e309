//! CancelMembershipHandler - Command handler for withdrawing a grant.

use std::sync::Arc;

use crate::domain::activity::Activity;
use crate::domain::foundation::{GymId, MembershipId};
use crate::domain::membership::{AssignedMembership, LifecycleError};
use crate::ports::{Clock, LifecycleChanges, LifecycleStore};

#[derive(Debug, Clone)]
pub struct CancelMembershipCommand {
    pub gym_id: GymId,
    pub membership_id: MembershipId,
}

/// Handler for cancelling a future or in-force grant.
///
/// Members using the grant are shown `cancelled`; members waiting on it lose
/// the upcoming link and keep whatever they have in force.
pub struct CancelMembershipHandler {
    store: Arc<dyn LifecycleStore>,
    clock: Arc<dyn Clock>,
}

impl CancelMembershipHandler {
    pub fn new(store: Arc<dyn LifecycleStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn handle(
        &self,
        cmd: CancelMembershipCommand,
    ) -> Result<AssignedMembership, LifecycleError> {
        // 1. Find the grant
        let mut grant = self
            .store
            .find_membership(&cmd.gym_id, &cmd.membership_id)
            .await?
            .ok_or(LifecycleError::MembershipNotFound(cmd.membership_id))?;

        // 2. Cancel it (domain logic)
        let now = self.clock.now();
        let previous = grant.status;
        grant.cancel(now).map_err(|_| LifecycleError::InvalidState {
            current: previous.to_string(),
            attempted: "cancel".to_string(),
        })?;

        // 3. Mirror onto members and persist
        let mut changes = LifecycleChanges::default();
        for mut client in self.store.find_clients(&cmd.gym_id, &grant.member_ids).await? {
            if client.mirror_cancellation(&grant, now) {
                changes.update_client(client);
            }
        }
        changes.update_membership(grant.clone());
        changes.log(Activity::cancellation(&grant, now));
        self.store.apply(changes).await?;

        tracing::info!(
            gym_id = %cmd.gym_id,
            membership_id = %grant.id,
            previous = %previous,
            "Membership cancelled"
        );
        Ok(grant)
    }
}
