//! Gym (tenant) settings relevant to the membership lifecycle.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GymCalendar, GymId};

pub const DEFAULT_REMINDER_DAYS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GymSettings {
    pub gym_id: GymId,
    pub name: String,
    /// Overrides the configured default zone when set.
    pub timezone: Option<Tz>,
    pub reminder_days: u32,
    pub notify_onboarding: bool,
    pub notify_renewal: bool,
    pub notify_expiry_reminder: bool,
}

impl GymSettings {
    /// Settings with every notification enabled and no timezone override.
    pub fn new(gym_id: GymId, name: impl Into<String>) -> Self {
        Self {
            gym_id,
            name: name.into(),
            timezone: None,
            reminder_days: DEFAULT_REMINDER_DAYS,
            notify_onboarding: true,
            notify_renewal: true,
            notify_expiry_reminder: true,
        }
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = Some(tz);
        self
    }

    /// Calendar for this gym, falling back to `default_tz`.
    pub fn calendar(&self, default_tz: Tz) -> GymCalendar {
        GymCalendar::new(self.timezone.unwrap_or(default_tz))
    }
}
