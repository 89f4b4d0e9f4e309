//! Plan duration and the expiry calculation.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// How long a grant of a plan lasts.
///
/// Month and day durations are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "count", rename_all = "lowercase")]
pub enum PlanDuration {
    Months(u32),
    Days(u32),
}

impl PlanDuration {
    /// Builds a duration from the catalog's pair of fields.
    ///
    /// Exactly one of the two must be positive.
    pub fn from_parts(
        duration_in_months: Option<u32>,
        duration_in_days: Option<u32>,
    ) -> Result<Self, ValidationError> {
        match (
            duration_in_months.filter(|m| *m > 0),
            duration_in_days.filter(|d| *d > 0),
        ) {
            (Some(months), None) => Ok(PlanDuration::Months(months)),
            (None, Some(days)) => Ok(PlanDuration::Days(days)),
            (Some(_), Some(_)) => Err(ValidationError::invalid_format(
                "duration",
                "set either duration_in_months or duration_in_days, not both",
            )),
            (None, None) => Err(ValidationError::invalid_format(
                "duration",
                "one of duration_in_months or duration_in_days must be positive",
            )),
        }
    }

    pub fn months(&self) -> Option<u32> {
        match self {
            PlanDuration::Months(m) => Some(*m),
            PlanDuration::Days(_) => None,
        }
    }

    pub fn days(&self) -> Option<u32> {
        match self {
            PlanDuration::Days(d) => Some(*d),
            PlanDuration::Months(_) => None,
        }
    }
}

/// Last day (inclusive) of a grant starting on `start`.
///
/// A one month plan starting Jan 1 ends Jan 31. Month arithmetic clamps to
/// the last day of shorter months, so a one month plan starting Jan 31 ends
/// Feb 27 (or Feb 28 in a leap year). The result is a gym-local calendar
/// date; `GymCalendar::end_of_day` turns it into an instant.
pub fn compute_end_date(start: NaiveDate, duration: PlanDuration) -> NaiveDate {
    let exclusive_end = match duration {
        PlanDuration::Months(months) => start.checked_add_months(Months::new(months)),
        PlanDuration::Days(days) => start.checked_add_days(Days::new(u64::from(days))),
    };
    exclusive_end
        .and_then(|end| end.pred_opt())
        .map(|end| end.max(start))
        .unwrap_or(NaiveDate::MAX)
}
