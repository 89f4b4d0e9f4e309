//! RecordPaymentHandler - Command handler for paying down a client's balance.

use std::sync::Arc;

use crate::domain::activity::Activity;
use crate::domain::client::{Client, PaymentMethod, PaymentRecord};
use crate::domain::foundation::{ClientId, GymId, MembershipId};
use crate::domain::membership::LifecycleError;
use crate::ports::{Clock, LifecycleChanges, LifecycleStore};

#[derive(Debug, Clone)]
pub struct RecordPaymentCommand {
    pub gym_id: GymId,
    pub client_id: ClientId,
    pub amount: i64,
    pub method: PaymentMethod,
    pub remarks: Option<String>,
    /// Grant the payment is for; must include the client.
    pub membership_id: Option<MembershipId>,
}

/// Handler for recording payments against an outstanding balance.
///
/// Overpaying is rejected; the balance never goes negative.
pub struct RecordPaymentHandler {
    store: Arc<dyn LifecycleStore>,
    clock: Arc<dyn Clock>,
}

impl RecordPaymentHandler {
    pub fn new(store: Arc<dyn LifecycleStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn handle(&self, cmd: RecordPaymentCommand) -> Result<Client, LifecycleError> {
        let mut client = self
            .store
            .find_client(&cmd.gym_id, &cmd.client_id)
            .await?
            .ok_or(LifecycleError::ClientNotFound(cmd.client_id))?;

        if let Some(membership_id) = cmd.membership_id {
            let grant = self
                .store
                .find_membership(&cmd.gym_id, &membership_id)
                .await?
                .ok_or(LifecycleError::MembershipNotFound(membership_id))?;
            if !grant.includes(client.id) {
                return Err(LifecycleError::validation(
                    "membership_id",
                    "membership does not cover this client",
                ));
            }
        }

        let now = self.clock.now();
        client.settle(cmd.amount, now)?;
        client.record_payment(
            PaymentRecord {
                amount: cmd.amount,
                method: cmd.method,
                paid_at: now,
                remarks: cmd.remarks,
                membership_id: cmd.membership_id,
            },
            now,
        );

        let mut changes = LifecycleChanges::default();
        changes.update_client(client.clone());
        changes.log(Activity::payment(&client, cmd.amount, cmd.membership_id, now));
        self.store.apply(changes).await?;

        tracing::info!(
            gym_id = %cmd.gym_id,
            client_id = %client.id,
            amount = cmd.amount,
            balance = client.balance(),
            "Payment recorded"
        );
        Ok(client)
    }
}
