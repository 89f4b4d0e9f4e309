//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares a UUID-backed identifier with the usual conversions.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Tenant identifier. All records are partitioned by gym.
    GymId
);

uuid_id!(
    /// Unique identifier for a client (gym member).
    ClientId
);

uuid_id!(
    /// Unique identifier for a membership plan in a gym's catalog.
    PlanId
);

uuid_id!(
    /// Unique identifier for an assigned membership (a concrete grant).
    MembershipId
);

uuid_id!(
    /// Unique identifier for an activity log entry.
    ActivityId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(ClientId::new(), ClientId::new());
        assert_ne!(MembershipId::new(), MembershipId::new());
    }

    #[test]
    fn id_displays_as_uuid() {
        let uuid = Uuid::new_v4();
        let id = GymId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn id_parses_from_string() {
        let uuid = Uuid::new_v4();
        let parsed: PlanId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed.as_uuid(), &uuid);
    }

    #[test]
    fn id_rejects_garbage() {
        assert!("not-a-uuid".parse::<ClientId>().is_err());
    }

    #[test]
    fn id_serializes_transparently() {
        let id = MembershipId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
