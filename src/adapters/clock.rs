//! Clock adapters.

use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::foundation::Timestamp;
use crate::ports::Clock;

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that stays where it is put. Millisecond precision.
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(at: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(at.as_datetime().timestamp_millis()),
        }
    }

    pub fn set(&self, at: Timestamp) {
        self.millis
            .store(at.as_datetime().timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i64) {
        self.millis
            .fetch_add(days * 24 * 60 * 60 * 1000, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        let millis = self.millis.load(Ordering::SeqCst);
        Timestamp::from_datetime(
            Utc.timestamp_millis_opt(millis)
                .single()
                .unwrap_or_default(),
        )
    }
}
