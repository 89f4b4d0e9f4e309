//! Helpers shared by the lifecycle handlers.

use chrono::NaiveDate;
use chrono_tz::Tz;
use futures::future::join_all;
use std::collections::HashSet;

use crate::domain::client::{Client, ClientRole, NewClientProfile};
use crate::domain::foundation::{ClientId, GymId, PlanId, Timestamp, DEFAULT_TIMEZONE};
use crate::domain::gym::GymSettings;
use crate::domain::membership::{AssignedMembership, LifecycleError};
use crate::domain::plan::{MembershipPlan, PlanType};
use crate::ports::{
    GymDirectory, LifecycleStore, NotificationRequest, NotificationTemplate, Notifier, PlanCatalog,
};

/// Engine-wide settings that gyms can't override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Zone for gyms without their own.
    pub default_timezone: Tz,
    /// Activities older than this many days are purged by reconciliation.
    pub activity_retention_days: u32,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            default_timezone: DEFAULT_TIMEZONE,
            activity_retention_days: 90,
        }
    }
}

/// A member to put on a grant besides the primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependentInput {
    Existing(ClientId),
    New(NewClientProfile),
}

/// A member resolved for a new grant; `is_new` ones are created in the batch.
pub(super) struct Member {
    pub client: Client,
    pub is_new: bool,
}

pub(super) async fn load_gym(
    directory: &dyn GymDirectory,
    gym_id: &GymId,
) -> Result<GymSettings, LifecycleError> {
    directory
        .get(gym_id)
        .await?
        .ok_or(LifecycleError::GymNotFound(*gym_id))
}

/// Fetches a plan that can still be sold.
pub(super) async fn load_active_plan(
    catalog: &dyn PlanCatalog,
    gym_id: &GymId,
    plan_id: &PlanId,
) -> Result<MembershipPlan, LifecycleError> {
    let plan = catalog
        .get_plan(gym_id, plan_id)
        .await?
        .ok_or(LifecycleError::PlanNotFound(*plan_id))?;
    if !plan.active {
        return Err(LifecycleError::PlanInactive(*plan_id));
    }
    Ok(plan)
}

pub(super) fn check_capacity(plan: &MembershipPlan, dependents: usize) -> Result<(), LifecycleError> {
    let requested = dependents + 1;
    if !plan.admits(requested) {
        return Err(LifecycleError::CapacityExceeded {
            allowed: plan.members_allowed,
            requested,
        });
    }
    Ok(())
}

/// Couple plans need two different genders when both are on record.
pub(super) fn check_couple(plan: &MembershipPlan, members: &[&Client]) -> Result<(), LifecycleError> {
    if plan.plan_type != PlanType::Couple {
        return Ok(());
    }
    if let [a, b] = members {
        if let (Some(ga), Some(gb)) = (a.gender, b.gender) {
            if ga == gb {
                return Err(LifecycleError::validation(
                    "gender",
                    "couple plan members must have different genders",
                ));
            }
        }
    }
    Ok(())
}

/// New members can't share a phone number with anyone else on the grant.
pub(super) fn check_distinct_phones(primary: &Client, dependents: &[Member]) -> Result<(), LifecycleError> {
    let mut seen = HashSet::from([&primary.phone_number]);
    for member in dependents {
        if !seen.insert(&member.client.phone_number) && member.is_new {
            return Err(LifecycleError::PhoneNumberTaken(
                member.client.phone_number.to_string(),
            ));
        }
    }
    Ok(())
}

/// Amount billed for the grant, defaulting to the plan price.
pub(super) fn resolve_amount(plan: &MembershipPlan, amount: Option<i64>) -> Result<i64, LifecycleError> {
    let amount = amount.unwrap_or(plan.price);
    if amount < 0 {
        return Err(LifecycleError::validation("amount", "amount cannot be negative"));
    }
    Ok(amount)
}

/// Registers a new client after checking the phone number is free.
pub(super) async fn register_client(
    store: &dyn LifecycleStore,
    gym_id: GymId,
    profile: NewClientProfile,
    role: ClientRole,
    now: Timestamp,
) -> Result<Client, LifecycleError> {
    let client = Client::register(gym_id, profile, role, now)?;
    if store
        .find_client_by_phone(&gym_id, &client.phone_number)
        .await?
        .is_some()
    {
        return Err(LifecycleError::PhoneNumberTaken(
            client.phone_number.to_string(),
        ));
    }
    Ok(client)
}

/// Resolves dependents into clients, creating profiles that don't exist yet.
pub(super) async fn resolve_dependents(
    store: &dyn LifecycleStore,
    gym_id: GymId,
    dependents: Vec<DependentInput>,
    now: Timestamp,
) -> Result<Vec<Member>, LifecycleError> {
    let mut members = Vec::with_capacity(dependents.len());
    for dependent in dependents {
        let member = match dependent {
            DependentInput::Existing(id) => Member {
                client: store
                    .find_client(&gym_id, &id)
                    .await?
                    .ok_or(LifecycleError::ClientNotFound(id))?,
                is_new: false,
            },
            DependentInput::New(profile) => Member {
                client: register_client(store, gym_id, profile, ClientRole::Dependent, now).await?,
                is_new: true,
            },
        };
        members.push(member);
    }
    Ok(members)
}

pub(super) fn format_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// Template parameters: name, plan, first day, last day.
pub(super) fn membership_params(client: &Client, grant: &AssignedMembership) -> Vec<String> {
    vec![
        client.name.clone(),
        grant.plan_name.clone(),
        format_date(grant.start_date),
        format_date(grant.end_date),
    ]
}

pub(super) fn notification(
    gym: &GymSettings,
    client: &Client,
    template: NotificationTemplate,
    params: Vec<String>,
) -> NotificationRequest {
    NotificationRequest {
        gym_id: gym.gym_id,
        gym_name: gym.name.clone(),
        phone_number: client.phone_number.clone(),
        template,
        params,
    }
}

/// Sends every request concurrently. Failures are logged and dropped.
///
/// Returns the number of requests the notifier accepted.
pub(super) async fn dispatch(notifier: &dyn Notifier, requests: Vec<NotificationRequest>) -> usize {
    let results = join_all(requests.into_iter().map(|request| async move {
        let gym_id = request.gym_id;
        let template = request.template;
        (gym_id, template, notifier.notify(request).await)
    }))
    .await;

    let mut delivered = 0;
    for (gym_id, template, result) in results {
        match result {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(
                gym_id = %gym_id,
                template = template.name(),
                error = %e,
                "Notification failed, dropping"
            ),
        }
    }
    delivered
}
