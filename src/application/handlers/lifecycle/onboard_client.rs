//! OnboardClientHandler - Command handler for enrolling a new client.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::domain::activity::Activity;
use crate::domain::client::{Client, ClientRole, NewClientProfile, PaymentMethod, PaymentRecord};
use crate::domain::foundation::{GymId, PlanId};
use crate::domain::membership::{AssignedMembership, GrantOrigin, LifecycleError, NewGrant};
use crate::ports::{Clock, GymDirectory, LifecycleChanges, LifecycleStore, NotificationTemplate, Notifier, PlanCatalog};

use super::support::{self, DependentInput, LifecyclePolicy};

/// Command to onboard a primary member, optionally with dependents.
#[derive(Debug, Clone)]
pub struct OnboardClientCommand {
    pub gym_id: GymId,
    pub primary: NewClientProfile,
    pub dependents: Vec<DependentInput>,
    pub plan_id: PlanId,
    pub method: PaymentMethod,
    pub payment_received: bool,
    /// Gym-local first day; today when omitted.
    pub start_date: Option<NaiveDate>,
    /// Billed amount; the plan price when omitted.
    pub amount: Option<i64>,
    pub remarks: Option<String>,
}

/// Result of successful onboarding.
#[derive(Debug, Clone)]
pub struct OnboardClientResult {
    pub client: Client,
    pub dependents: Vec<Client>,
    pub membership: AssignedMembership,
}

/// Handler for onboarding.
///
/// Creates the primary client, any new dependents, the grant and the
/// `ONBOARDING` activity in one batch. The onboarding message goes out after
/// the batch is committed.
pub struct OnboardClientHandler {
    gyms: Arc<dyn GymDirectory>,
    plans: Arc<dyn PlanCatalog>,
    store: Arc<dyn LifecycleStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: LifecyclePolicy,
}

impl OnboardClientHandler {
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
        cmd: OnboardClientCommand,
    ) -> Result<OnboardClientResult, LifecycleError> {
        // 1. Everything the grant depends on must exist
        let gym = support::load_gym(self.gyms.as_ref(), &cmd.gym_id).await?;
        let plan = support::load_active_plan(self.plans.as_ref(), &cmd.gym_id, &cmd.plan_id).await?;
        support::check_capacity(&plan, cmd.dependents.len())?;
        let amount = support::resolve_amount(&plan, cmd.amount)?;

        let now = self.clock.now();
        let today = gym.calendar(self.policy.default_timezone).today(now);
        let start_date = cmd.start_date.unwrap_or(today);

        // 2. Resolve members
        let mut primary = support::register_client(
            self.store.as_ref(),
            cmd.gym_id,
            cmd.primary,
            ClientRole::Primary,
            now,
        )
        .await?;
        let mut dependents =
            support::resolve_dependents(self.store.as_ref(), cmd.gym_id, cmd.dependents, now).await?;
        support::check_distinct_phones(&primary, &dependents)?;

        let everyone: Vec<&Client> = std::iter::once(&primary)
            .chain(dependents.iter().map(|m| &m.client))
            .collect();
        support::check_couple(&plan, &everyone)?;

        // 3. Grant and linkage
        let membership = AssignedMembership::grant(
            NewGrant {
                plan: &plan,
                origin: GrantOrigin::Onboarding,
                primary_member_id: primary.id,
                dependent_ids: dependents.iter().map(|m| m.client.id).collect(),
                start_date,
                total_amount: amount,
                payment_received: cmd.payment_received,
            },
            today,
            now,
        )?;

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

        // 4. Commit as one unit
        let mut changes = LifecycleChanges::default();
        changes.create_client(primary.clone());
        for member in &dependents {
            if member.is_new {
                changes.create_client(member.client.clone());
            } else {
                changes.update_client(member.client.clone());
            }
        }
        changes.create_membership(membership.clone());
        changes.log(Activity::onboarding(&primary, &membership, now));
        self.store.apply(changes).await?;

        tracing::info!(
            gym_id = %cmd.gym_id,
            client_id = %primary.id,
            membership_id = %membership.id,
            status = %membership.status,
            members = membership.member_ids.len(),
            "Client onboarded"
        );

        // 5. Best-effort notification
        let dependents: Vec<Client> = dependents.into_iter().map(|m| m.client).collect();
        if gym.notify_onboarding {
            let requests = std::iter::once(&primary)
                .chain(dependents.iter())
                .map(|c| {
                    support::notification(
                        &gym,
                        c,
                        NotificationTemplate::Onboarding,
                        support::membership_params(c, &membership),
                    )
                })
                .collect();
            support::dispatch(self.notifier.as_ref(), requests).await;
        }

        Ok(OnboardClientResult {
            client: primary,
            dependents,
            membership,
        })
    }
}
