//! Activity log entries.
//!
//! Activities are immutable, written in the same transaction as the lifecycle
//! change they describe, and purged after the retention window.

use serde::{Deserialize, Serialize};

use crate::domain::client::Client;
use crate::domain::foundation::{ActivityId, ClientId, GymId, MembershipId, Timestamp};
use crate::domain::membership::AssignedMembership;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Onboarding,
    Renewal,
    AdvanceRenewal,
    Expiry,
    Payment,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Onboarding => "ONBOARDING",
            ActivityType::Renewal => "RENEWAL",
            ActivityType::AdvanceRenewal => "ADVANCE_RENEWAL",
            ActivityType::Expiry => "EXPIRY",
            ActivityType::Payment => "PAYMENT",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub gym_id: GymId,
    pub activity_type: ActivityType,
    pub title: String,
    pub description: String,
    pub member_id: ClientId,
    pub membership_id: Option<MembershipId>,
    pub amount: Option<i64>,
    pub occurred_at: Timestamp,
}

impl Activity {
    fn new(
        activity_type: ActivityType,
        gym_id: GymId,
        member_id: ClientId,
        title: impl Into<String>,
        description: impl Into<String>,
        occurred_at: Timestamp,
    ) -> Self {
        Self {
            id: ActivityId::new(),
            gym_id,
            activity_type,
            title: title.into(),
            description: description.into(),
            member_id,
            membership_id: None,
            amount: None,
            occurred_at,
        }
    }

    fn for_grant(mut self, grant: &AssignedMembership) -> Self {
        self.membership_id = Some(grant.id);
        self.amount = Some(grant.total_amount);
        self
    }

    pub fn onboarding(client: &Client, grant: &AssignedMembership, now: Timestamp) -> Self {
        Self::new(
            ActivityType::Onboarding,
            client.gym_id,
            client.id,
            "New client onboarded",
            format!(
                "{} joined on {} starting {}",
                client.name, grant.plan_name, grant.start_date
            ),
            now,
        )
        .for_grant(grant)
    }

    pub fn renewal(client: &Client, grant: &AssignedMembership, now: Timestamp) -> Self {
        Self::new(
            ActivityType::Renewal,
            client.gym_id,
            client.id,
            "Membership renewed",
            format!(
                "{} renewed {} until {}",
                client.name, grant.plan_name, grant.end_date
            ),
            now,
        )
        .for_grant(grant)
    }

    pub fn advance_renewal(client: &Client, grant: &AssignedMembership, now: Timestamp) -> Self {
        Self::new(
            ActivityType::AdvanceRenewal,
            client.gym_id,
            client.id,
            "Advance renewal",
            format!(
                "{} renewed {} in advance, starting {}",
                client.name, grant.plan_name, grant.start_date
            ),
            now,
        )
        .for_grant(grant)
    }

    /// Logged by reconciliation when an upcoming grant comes into force.
    pub fn activation(grant: &AssignedMembership, now: Timestamp) -> Self {
        Self::new(
            ActivityType::Renewal,
            grant.gym_id,
            grant.primary_member_id,
            "Membership activated",
            format!("{} started on {}", grant.plan_name, grant.start_date),
            now,
        )
        .for_grant(grant)
    }

    /// One entry per grant, recorded against its primary member.
    pub fn expiry(grant: &AssignedMembership, now: Timestamp) -> Self {
        Self::new(
            ActivityType::Expiry,
            grant.gym_id,
            grant.primary_member_id,
            "Membership expired",
            format!("{} ended on {}", grant.plan_name, grant.end_date),
            now,
        )
        .for_grant(grant)
    }

    pub fn cancellation(grant: &AssignedMembership, now: Timestamp) -> Self {
        Self::new(
            ActivityType::Expiry,
            grant.gym_id,
            grant.primary_member_id,
            "Membership cancelled",
            format!("{} was cancelled", grant.plan_name),
            now,
        )
        .for_grant(grant)
    }

    pub fn payment(
        client: &Client,
        amount: i64,
        membership_id: Option<MembershipId>,
        now: Timestamp,
    ) -> Self {
        let mut activity = Self::new(
            ActivityType::Payment,
            client.gym_id,
            client.id,
            "Payment received",
            format!("{} paid {}", client.name, amount),
            now,
        );
        activity.membership_id = membership_id;
        activity.amount = Some(amount);
        activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_types_serialize_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&ActivityType::AdvanceRenewal).unwrap(),
            "\"ADVANCE_RENEWAL\""
        );
        assert_eq!(ActivityType::Expiry.to_string(), "EXPIRY");
    }
}
