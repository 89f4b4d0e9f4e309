//! RenewMembershipHandler - Command handler for renewing a client's membership.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::domain::activity::Activity;
use crate::domain::client::{Client, ClientRole, PaymentMethod, PaymentRecord};
use crate::domain::foundation::{ClientId, GymId, PlanId};
use crate::domain::membership::{
    AssignedMembership, GrantOrigin, LifecycleError, MembershipStatus, NewGrant,
};
use crate::ports::{
    Clock, GymDirectory, LifecycleChanges, LifecycleStore, NotificationTemplate, Notifier,
    PlanCatalog,
};

use super::support::{self, DependentInput, LifecyclePolicy};

/// Command to renew onto a new grant.
///
/// `dependents` is the full member list for the new grant; dependents of the
/// previous grant who are left out keep their old grant until it runs out.
#[derive(Debug, Clone)]
pub struct RenewMembershipCommand {
    pub gym_id: GymId,
    pub client_id: ClientId,
    pub plan_id: PlanId,
    pub dependents: Vec<DependentInput>,
    pub method: PaymentMethod,
    pub payment_received: bool,
    /// Gym-local first day; today when omitted.
    pub start_date: Option<NaiveDate>,
    /// Billed amount; the plan price when omitted.
    pub amount: Option<i64>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RenewMembershipResult {
    pub client: Client,
    pub dependents: Vec<Client>,
    pub membership: AssignedMembership,
    /// The previous grant, if this renewal closed it out.
    pub closed_out: Option<AssignedMembership>,
}

/// Handler for renewals.
///
/// Always creates a new grant. A renewal starting later sits in
/// `upcoming_membership` until reconciliation promotes it; one starting today
/// takes over immediately and closes out a previous grant that already ended.
pub struct RenewMembershipHandler {
    gyms: Arc<dyn GymDirectory>,
    plans: Arc<dyn PlanCatalog>,
    store: Arc<dyn LifecycleStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: LifecyclePolicy,
}

impl RenewMembershipHandler {
    pub fn new(
        gyms: Arc<dyn GymDirectory>,
        plans: Arc<dyn PlanCatalog>,
        store: Arc<dyn LifecycleStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            gyms,
            plans,
            store,
            notifier,
            clock,
            policy,
        }
    }

    pub async fn handle(
        &self,
        cmd: RenewMembershipCommand,
    ) -> Result<RenewMembershipResult, LifecycleError> {
        let gym = support::load_gym(self.gyms.as_ref(), &cmd.gym_id).await?;
        let mut primary = self
            .store
            .find_client(&cmd.gym_id, &cmd.client_id)
            .await?
            .ok_or(LifecycleError::ClientNotFound(cmd.client_id))?;
        let plan = support::load_active_plan(self.plans.as_ref(), &cmd.gym_id, &cmd.plan_id).await?;
        support::check_capacity(&plan, cmd.dependents.len())?;
        let amount = support::resolve_amount(&plan, cmd.amount)?;

        let now = self.clock.now();
        let today = gym.calendar(self.policy.default_timezone).today(now);
        let start_date = cmd.start_date.unwrap_or(today);

        let mut dependents =
            support::resolve_dependents(self.store.as_ref(), cmd.gym_id, cmd.dependents, now).await?;
        support::check_distinct_phones(&primary, &dependents)?;
        let everyone: Vec<&Client> = std::iter::once(&primary)
            .chain(dependents.iter().map(|m| &m.client))
            .collect();
        support::check_couple(&plan, &everyone)?;

        // Previous grant that already ran out is closed in this same batch
        let closed_out = self.lapsed_active_grant(&primary, today).await?;
        let closed_out = match closed_out {
            Some(mut old) => {
                old.expire(now)?;
                primary.mirror_expiry(&old, now);
                for member in dependents.iter_mut() {
                    member.client.mirror_expiry(&old, now);
                }
                Some(old)
            }
            None => None,
        };

        let membership = AssignedMembership::grant(
            NewGrant {
                plan: &plan,
                origin: GrantOrigin::Renewal,
                primary_member_id: primary.id,
                dependent_ids: dependents.iter().map(|m| m.client.id).collect(),
                start_date,
                total_amount: amount,
                payment_received: cmd.payment_received,
            },
            today,
            now,
        )?;
        let in_advance = membership.status == MembershipStatus::Future;

        primary.assign_role(ClientRole::Primary, now);
        primary.link(&membership, now)?;
        for member in dependents.iter_mut() {
            member.client.assign_role(ClientRole::Dependent, now);
            member.client.link(&membership, now)?;
        }

        if cmd.payment_received {
            primary.record_payment(
                PaymentRecord {
                    amount,
                    method: cmd.method,
                    paid_at: now,
                    remarks: cmd.remarks,
                    membership_id: Some(membership.id),
                },
                now,
            );
        } else {
            primary.charge(amount, now)?;
        }

        // Members of the closed grant who are not on the new one
        let mut left_behind = Vec::new();
        if let Some(old) = &closed_out {
            let others: Vec<ClientId> = old
                .member_ids
                .iter()
                .filter(|id| !membership.includes(**id))
                .copied()
                .collect();
            for mut client in self.store.find_clients(&cmd.gym_id, &others).await? {
                if client.mirror_expiry(old, now) {
                    left_behind.push(client);
                }
            }
        }

        let mut changes = LifecycleChanges::default();
        changes.update_client(primary.clone());
        for member in &dependents {
            if member.is_new {
                changes.create_client(member.client.clone());
            } else {
                changes.update_client(member.client.clone());
            }
        }
        for client in left_behind {
            changes.update_client(client);
        }
        if let Some(old) = &closed_out {
            changes.update_membership(old.clone());
            changes.log(Activity::expiry(old, now));
        }
        changes.create_membership(membership.clone());
        changes.log(if in_advance {
            Activity::advance_renewal(&primary, &membership, now)
        } else {
            Activity::renewal(&primary, &membership, now)
        });
        self.store.apply(changes).await?;

        tracing::info!(
            gym_id = %cmd.gym_id,
            client_id = %primary.id,
            membership_id = %membership.id,
            status = %membership.status,
            in_advance,
            closed_out = closed_out.is_some(),
            "Membership renewed"
        );

        let dependents: Vec<Client> = dependents.into_iter().map(|m| m.client).collect();
        if gym.notify_renewal {
            let requests = std::iter::once(&primary)
                .chain(dependents.iter())
                .map(|c| {
                    support::notification(
                        &gym,
                        c,
                        NotificationTemplate::RenewalComplete,
                        support::membership_params(c, &membership),
                    )
                })
                .collect();
            support::dispatch(self.notifier.as_ref(), requests).await;
        }

        Ok(RenewMembershipResult {
            client: primary,
            dependents,
            membership,
            closed_out,
        })
    }

    async fn lapsed_active_grant(
        &self,
        client: &Client,
        today: NaiveDate,
    ) -> Result<Option<AssignedMembership>, LifecycleError> {
        let Some(active_id) = client.active_membership() else {
            return Ok(None);
        };
        let grant = self.store.find_membership(&client.gym_id, &active_id).await?;
        Ok(grant.filter(|g| g.status.is_in_force() && g.has_lapsed(today)))
    }
}
