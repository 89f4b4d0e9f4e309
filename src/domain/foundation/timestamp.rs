//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
///
/// Used for audit times (creation, payment and activity dates). Calendar
/// reasoning about membership days goes through `GymCalendar` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by subtracting the specified number of days.
    pub fn minus_days(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn fixed() -> Timestamp {
        DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
            .into()
    }

    #[test]
    fn add_and_minus_days_are_inverse() {
        let ts = fixed();
        assert_eq!(ts.add_days(90).minus_days(90), ts);
    }

    #[test]
    fn is_before_compares_instants() {
        let ts = fixed();
        assert!(ts.is_before(&ts.add_days(1)));
        assert!(!ts.add_days(1).is_before(&ts));
    }

    #[test]
    fn timestamp_round_trips_through_json() {
        let json = serde_json::to_string(&fixed()).unwrap();
        assert!(json.contains("2024-01-15"));

        let ts: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts.as_datetime().year(), 2024);
    }
}
