//! Membership plan aggregate.
//!
//! A plan is an immutable template a gym sells. Plans referenced by history
//! are never deleted; they are soft-disabled with [`MembershipPlan::deactivate`].

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GymId, PlanId, Timestamp, ValidationError};

use super::{PlanDuration, PlanType};

/// A membership template configured by a gym admin.
///
/// # Invariants
///
/// - `plan_name` is non-empty
/// - `members_allowed` agrees with `plan_type`
/// - `price` is not negative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipPlan {
    pub id: PlanId,
    pub gym_id: GymId,
    pub plan_name: String,
    pub duration: PlanDuration,
    /// Price in minor currency units.
    pub price: i64,
    pub is_trial: bool,
    pub plan_type: PlanType,
    pub members_allowed: u32,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields an admin supplies when creating a plan.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub plan_name: String,
    pub duration: PlanDuration,
    pub price: i64,
    pub is_trial: bool,
    pub plan_type: PlanType,
    pub members_allowed: u32,
}

impl MembershipPlan {
    /// Creates an active plan after validating its fields.
    pub fn create(gym_id: GymId, new_plan: NewPlan, now: Timestamp) -> Result<Self, ValidationError> {
        let plan_name = new_plan.plan_name.trim().to_string();
        if plan_name.is_empty() {
            return Err(ValidationError::empty_field("plan_name"));
        }
        if new_plan.price < 0 {
            return Err(ValidationError::out_of_range("price", 0, i64::MAX, new_plan.price));
        }
        new_plan.plan_type.validate_capacity(new_plan.members_allowed)?;

        Ok(Self {
            id: PlanId::new(),
            gym_id,
            plan_name,
            duration: new_plan.duration,
            price: new_plan.price,
            is_trial: new_plan.is_trial,
            plan_type: new_plan.plan_type,
            members_allowed: new_plan.members_allowed,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Soft-disables the plan. Idempotent.
    pub fn deactivate(&mut self, now: Timestamp) {
        if self.active {
            self.active = false;
            self.updated_at = now;
        }
    }

    /// True if `member_count` people (primary included) fit on one grant.
    pub fn admits(&self, member_count: usize) -> bool {
        member_count >= 1 && member_count <= self.members_allowed as usize
    }
}
