//! Plan types and their member capacity rules.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Largest group a single grant may cover.
pub const MAX_GROUP_MEMBERS: u32 = 50;

/// Who a plan is sold to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    /// One member.
    Individual,

    /// Exactly two members billed to one primary.
    Couple,

    /// A primary plus any number of dependents up to the plan's capacity.
    Group,
}

impl PlanType {
    /// Checks that `members_allowed` agrees with this plan type.
    pub fn validate_capacity(&self, members_allowed: u32) -> Result<(), ValidationError> {
        let (min, max) = match self {
            PlanType::Individual => (1, 1),
            PlanType::Couple => (2, 2),
            PlanType::Group => (2, MAX_GROUP_MEMBERS),
        };
        if members_allowed < min || members_allowed > max {
            return Err(ValidationError::out_of_range(
                "members_allowed",
                min as i64,
                max as i64,
                members_allowed as i64,
            ));
        }
        Ok(())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlanType::Individual => "Individual",
            PlanType::Couple => "Couple",
            PlanType::Group => "Group",
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
