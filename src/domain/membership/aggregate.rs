//! Assigned membership aggregate.
//!
//! An `AssignedMembership` is a concrete grant of a plan to a primary member
//! and their dependents. Grants are never deleted: renewals create a new
//! grant and the old one runs out on its own.
//!
//! # Design Decisions
//!
//! - **Calendar dates**: `start_date` and `end_date` are gym-local calendar
//!   days, both inclusive. Instants are derived through `GymCalendar`.
//! - **Money in minor units**: `total_amount` is an integer amount.
//! - **Optimistic concurrency**: `version` is bumped by the store on every
//!   update; stale writers are rejected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ClientId, DomainError, ErrorCode, GymCalendar, GymId, MembershipId, PlanId, StateMachine,
    Timestamp, ValidationError,
};
use crate::domain::plan::{compute_end_date, MembershipPlan};

use super::MembershipStatus;

/// Which lifecycle operation produced a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantOrigin {
    Onboarding,
    Renewal,
}

/// A grant of a plan to one or more clients.
///
/// # Invariants
///
/// - `end_date >= start_date`
/// - `member_ids` is non-empty, duplicate free and starts with `primary_member_id`
/// - `member_ids.len() <= ` the plan's `members_allowed` at grant time
/// - `status` only moves forward per [`MembershipStatus`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedMembership {
    pub id: MembershipId,
    pub gym_id: GymId,
    pub primary_member_id: ClientId,
    pub member_ids: Vec<ClientId>,
    pub plan_id: PlanId,
    /// Snapshot of the plan name at grant time.
    pub plan_name: String,
    /// Snapshot of the plan's trial flag at grant time.
    pub is_trial: bool,
    pub origin: GrantOrigin,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: MembershipStatus,
    pub total_amount: i64,
    pub payment_received: bool,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Inputs for [`AssignedMembership::grant`].
#[derive(Debug, Clone)]
pub struct NewGrant<'a> {
    pub plan: &'a MembershipPlan,
    pub origin: GrantOrigin,
    pub primary_member_id: ClientId,
    pub dependent_ids: Vec<ClientId>,
    pub start_date: NaiveDate,
    pub total_amount: i64,
    pub payment_received: bool,
}

/// Status a new grant starts in.
///
/// Grants starting after `today` wait as `future`. Only onboarding onto a
/// trial plan yields `trial`; renewals are never trials.
pub fn initial_status(
    start_date: NaiveDate,
    today: NaiveDate,
    is_trial: bool,
    origin: GrantOrigin,
) -> MembershipStatus {
    if start_date > today {
        MembershipStatus::Future
    } else if is_trial && origin == GrantOrigin::Onboarding {
        MembershipStatus::Trial
    } else {
        MembershipStatus::Active
    }
}

impl AssignedMembership {
    /// Creates a grant, computing its end date and initial status.
    ///
    /// # Errors
    ///
    /// Returns a validation error if members repeat or exceed plan capacity.
    pub fn grant(input: NewGrant<'_>, today: NaiveDate, now: Timestamp) -> Result<Self, ValidationError> {
        let mut member_ids = Vec::with_capacity(input.dependent_ids.len() + 1);
        member_ids.push(input.primary_member_id);
        for id in input.dependent_ids {
            if member_ids.contains(&id) {
                return Err(ValidationError::invalid_format(
                    "member_ids",
                    format!("client {} appears more than once", id),
                ));
            }
            member_ids.push(id);
        }
        if !input.plan.admits(member_ids.len()) {
            return Err(ValidationError::out_of_range(
                "member_ids",
                1,
                input.plan.members_allowed as i64,
                member_ids.len() as i64,
            ));
        }
        if input.total_amount < 0 {
            return Err(ValidationError::out_of_range("amount", 0, i64::MAX, input.total_amount));
        }

        let is_trial = input.plan.is_trial && input.origin == GrantOrigin::Onboarding;
        Ok(Self {
            id: MembershipId::new(),
            gym_id: input.plan.gym_id,
            primary_member_id: input.primary_member_id,
            member_ids,
            plan_id: input.plan.id,
            plan_name: input.plan.plan_name.clone(),
            is_trial,
            origin: input.origin,
            start_date: input.start_date,
            end_date: compute_end_date(input.start_date, input.plan.duration),
            status: initial_status(input.start_date, today, is_trial, input.origin),
            total_amount: input.total_amount,
            payment_received: input.payment_received,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// True once the first day has arrived.
    pub fn has_started(&self, today: NaiveDate) -> bool {
        self.start_date <= today
    }

    /// True once the last day is in the past.
    pub fn has_lapsed(&self, today: NaiveDate) -> bool {
        self.end_date < today
    }

    /// True if `client_id` is covered by this grant.
    pub fn includes(&self, client_id: ClientId) -> bool {
        self.member_ids.contains(&client_id)
    }

    /// Dependents only, primary excluded.
    pub fn dependent_ids(&self) -> impl Iterator<Item = &ClientId> {
        self.member_ids
            .iter()
            .filter(move |id| **id != self.primary_member_id)
    }

    /// Final instant of the grant in the gym's timezone.
    pub fn ends_at(&self, calendar: &GymCalendar) -> Timestamp {
        calendar.end_of_day(self.end_date)
    }

    /// Future grant reaches its start date.
    ///
    /// # Errors
    ///
    /// Returns error unless the grant is `future`.
    pub fn activate(&mut self, now: Timestamp) -> Result<MembershipStatus, DomainError> {
        let target = if self.is_trial {
            MembershipStatus::Trial
        } else {
            MembershipStatus::Active
        };
        self.transition_to(target, now)?;
        Ok(target)
    }

    /// Grant in force passes its end date.
    ///
    /// # Errors
    ///
    /// Returns error unless the grant is `active` or `trial`.
    pub fn expire(&mut self, now: Timestamp) -> Result<MembershipStatus, DomainError> {
        let target = self.status.expired_counterpart().ok_or_else(|| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot expire membership {} in {} state", self.id, self.status),
            )
        })?;
        self.transition_to(target, now)?;
        Ok(target)
    }

    /// Withdraws the grant.
    ///
    /// # Errors
    ///
    /// Returns error if the grant already ended.
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(MembershipStatus::Cancelled, now)
    }

    fn transition_to(&mut self, target: MembershipStatus, now: Timestamp) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition membership {} from {} to {}",
                    self.id, self.status, target
                ),
            )
        })?;
        self.updated_at = now;
        Ok(())
    }
}
