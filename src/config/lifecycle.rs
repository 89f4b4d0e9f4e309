//! Lifecycle engine configuration

use chrono::NaiveTime;
use chrono_tz::Tz;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::scheduler::DailyReconcilerConfig;
use crate::application::handlers::lifecycle::LifecyclePolicy;

const MAX_REMINDER_DAYS: u32 = 30;
const MIN_SECRET_LEN: usize = 16;

/// Lifecycle engine configuration (calendar, reminders, retention, schedule)
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// IANA zone used for gyms without their own
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// Days before expiry that reminders go out, for gyms without a setting
    #[serde(default = "default_reminder_days")]
    pub reminder_days: u32,

    /// Activities older than this are purged during reconciliation
    #[serde(default = "default_retention_days")]
    pub activity_retention_days: u32,

    /// Local time of the daily reconciliation pass (HH:MM)
    #[serde(default = "default_reconcile_at")]
    pub reconcile_at: String,

    /// Run a reconciliation pass as soon as the service starts
    #[serde(default = "default_reconcile_on_start")]
    pub reconcile_on_start: bool,

    /// Shared secret for the manual reconciliation endpoint; unset disables it
    pub reconciliation_secret: Option<Secret<String>>,
}

impl LifecycleConfig {
    pub fn timezone(&self) -> Result<Tz, ValidationError> {
        self.default_timezone
            .parse::<Tz>()
            .map_err(|_| ValidationError::InvalidTimezone(self.default_timezone.clone()))
    }

    pub fn reconcile_time(&self) -> Result<NaiveTime, ValidationError> {
        NaiveTime::parse_from_str(&self.reconcile_at, "%H:%M")
            .map_err(|_| ValidationError::InvalidReconcileTime(self.reconcile_at.clone()))
    }

    pub fn policy(&self) -> Result<LifecyclePolicy, ValidationError> {
        Ok(LifecyclePolicy {
            default_timezone: self.timezone()?,
            activity_retention_days: self.activity_retention_days,
        })
    }

    pub fn scheduler(&self) -> Result<DailyReconcilerConfig, ValidationError> {
        Ok(DailyReconcilerConfig {
            reconcile_at: self.reconcile_time()?,
            timezone: self.timezone()?,
            run_on_start: self.reconcile_on_start,
        })
    }

    /// Validate lifecycle configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.timezone()?;
        self.reconcile_time()?;
        if self.reminder_days > MAX_REMINDER_DAYS {
            return Err(ValidationError::InvalidReminderDays);
        }
        if self.activity_retention_days == 0 {
            return Err(ValidationError::InvalidRetention);
        }
        if let Some(secret) = &self.reconciliation_secret {
            if secret.expose_secret().len() < MIN_SECRET_LEN {
                return Err(ValidationError::WeakReconciliationSecret);
            }
        }
        Ok(())
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            reminder_days: default_reminder_days(),
            activity_retention_days: default_retention_days(),
            reconcile_at: default_reconcile_at(),
            reconcile_on_start: default_reconcile_on_start(),
            reconciliation_secret: None,
        }
    }
}

fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_reminder_days() -> u32 {
    3
}

fn default_retention_days() -> u32 {
    90
}

fn default_reconcile_at() -> String {
    "00:05".to_string()
}

fn default_reconcile_on_start() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LifecycleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timezone().unwrap(), chrono_tz::Asia::Kolkata);
        assert_eq!(
            config.reconcile_time().unwrap(),
            NaiveTime::from_hms_opt(0, 5, 0).unwrap()
        );
    }

    #[test]
    fn test_policy_carries_zone_and_retention() {
        let config = LifecycleConfig {
            default_timezone: "Europe/London".to_string(),
            activity_retention_days: 30,
            ..Default::default()
        };
        let policy = config.policy().unwrap();
        assert_eq!(policy.default_timezone, chrono_tz::Europe::London);
        assert_eq!(policy.activity_retention_days, 30);
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let config = LifecycleConfig {
            default_timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTimezone(_))));
    }

    #[test]
    fn test_bad_reconcile_time_rejected() {
        let config = LifecycleConfig {
            reconcile_at: "25:00".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidReconcileTime(_))
        ));
    }

    #[test]
    fn test_reminder_days_bounded() {
        let config = LifecycleConfig {
            reminder_days: 31,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidReminderDays)));
    }

    #[test]
    fn test_zero_retention_rejected() {
        let config = LifecycleConfig {
            activity_retention_days: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidRetention)));
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = LifecycleConfig {
            reconciliation_secret: Some(Secret::new("short".to_string())),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::WeakReconciliationSecret)
        ));
    }
}
