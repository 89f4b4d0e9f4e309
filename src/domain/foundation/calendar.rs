//! Gym-local calendar arithmetic.
//!
//! Membership days are calendar days in the gym's timezone. Every "today",
//! start-of-day and end-of-day computation in the crate goes through
//! [`GymCalendar`] so that UTC midnight never leaks into lifecycle decisions.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::Timestamp;

/// The fallback zone used when neither the gym nor configuration set one.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

/// Calendar pinned to a single timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GymCalendar {
    tz: Tz,
}

impl GymCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// The local calendar date at instant `now`.
    pub fn today(&self, now: Timestamp) -> NaiveDate {
        now.as_datetime().with_timezone(&self.tz).date_naive()
    }

    /// First instant of `date` in local time, as UTC.
    pub fn start_of_day(&self, date: NaiveDate) -> Timestamp {
        self.resolve(date, NaiveTime::MIN)
    }

    /// Last millisecond of `date` in local time, as UTC.
    pub fn end_of_day(&self, date: NaiveDate) -> Timestamp {
        match date.succ_opt() {
            Some(next) => Timestamp::from_datetime(
                *self.start_of_day(next).as_datetime() - Duration::milliseconds(1),
            ),
            None => self.resolve(date, NaiveTime::MIN),
        }
    }

    // Local midnight can be skipped or repeated around DST changes; take the
    // earliest valid instant.
    fn resolve(&self, date: NaiveDate, time: NaiveTime) -> Timestamp {
        let naive = date.and_time(time);
        let local: DateTime<Tz> = match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => {
                let shifted = naive + Duration::hours(1);
                match self.tz.from_local_datetime(&shifted) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
                    LocalResult::None => return Timestamp::from_datetime(Utc.from_utc_datetime(&naive)),
                }
            }
        };
        Timestamp::from_datetime(local.with_timezone(&Utc))
    }
}

impl Default for GymCalendar {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}
