//! Membership status state machine.
//!
//! Statuses only move forward: a grant starts `future`, `active` or `trial`
//! and ends `expired`, `trial_expired` or `cancelled`.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an assigned membership.
///
/// The same value is mirrored onto each member's client record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Starts on a later calendar day.
    Future,

    /// Paid grant currently in force.
    Active,

    /// Trial grant currently in force.
    Trial,

    /// Paid grant whose last day has passed.
    Expired,

    /// Trial grant whose last day has passed.
    TrialExpired,

    /// Withdrawn by the gym. Also the default mirror for never-enrolled clients.
    #[default]
    Cancelled,
}

impl MembershipStatus {
    /// True while the grant entitles members to use the gym.
    pub fn is_in_force(&self) -> bool {
        matches!(self, MembershipStatus::Active | MembershipStatus::Trial)
    }

    /// The terminal status a grant in force reaches when it runs out.
    pub fn expired_counterpart(&self) -> Option<MembershipStatus> {
        match self {
            MembershipStatus::Active => Some(MembershipStatus::Expired),
            MembershipStatus::Trial => Some(MembershipStatus::TrialExpired),
            _ => None,
        }
    }

    /// Wire/storage spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Future => "future",
            MembershipStatus::Active => "active",
            MembershipStatus::Trial => "trial",
            MembershipStatus::Expired => "expired",
            MembershipStatus::TrialExpired => "trial_expired",
            MembershipStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for MembershipStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use MembershipStatus::*;
        matches!(
            (self, target),
            (Future, Active)
                | (Future, Trial)
                | (Future, Cancelled)
                | (Active, Expired)
                | (Active, Cancelled)
                | (Trial, TrialExpired)
                | (Trial, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MembershipStatus::*;
        match self {
            Future => vec![Active, Trial, Cancelled],
            Active => vec![Expired, Cancelled],
            Trial => vec![TrialExpired, Cancelled],
            Expired | TrialExpired | Cancelled => vec![],
        }
    }
}
