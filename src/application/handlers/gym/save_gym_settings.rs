//! SaveGymSettingsHandler - Command handler for registering or updating a gym.

use chrono_tz::Tz;
use std::sync::Arc;

use crate::domain::foundation::GymId;
use crate::domain::gym::GymSettings;
use crate::domain::membership::LifecycleError;
use crate::ports::GymDirectory;

/// Longest reminder lead time a gym may configure.
pub const MAX_REMINDER_DAYS: u32 = 30;

/// Creates or replaces a gym's settings. Unset fields fall back to defaults.
#[derive(Debug, Clone)]
pub struct SaveGymSettingsCommand {
    pub gym_id: GymId,
    pub name: String,
    /// IANA zone name, e.g. `Asia/Kolkata`.
    pub timezone: Option<String>,
    pub reminder_days: Option<u32>,
    pub notify_onboarding: Option<bool>,
    pub notify_renewal: Option<bool>,
    pub notify_expiry_reminder: Option<bool>,
}

pub struct SaveGymSettingsHandler {
    gyms: Arc<dyn GymDirectory>,
    default_reminder_days: u32,
}

impl SaveGymSettingsHandler {
    pub fn new(gyms: Arc<dyn GymDirectory>, default_reminder_days: u32) -> Self {
        Self {
            gyms,
            default_reminder_days,
        }
    }

    pub async fn handle(&self, cmd: SaveGymSettingsCommand) -> Result<GymSettings, LifecycleError> {
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(LifecycleError::validation("name", "gym name cannot be empty"));
        }

        let timezone = match cmd.timezone.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(zone) => Some(zone.parse::<Tz>().map_err(|_| {
                LifecycleError::validation("timezone", format!("unknown timezone '{}'", zone))
            })?),
        };

        let reminder_days = cmd.reminder_days.unwrap_or(self.default_reminder_days);
        if reminder_days > MAX_REMINDER_DAYS {
            return Err(LifecycleError::validation(
                "reminder_days",
                format!("must be at most {}", MAX_REMINDER_DAYS),
            ));
        }

        let mut settings = GymSettings::new(cmd.gym_id, name);
        settings.timezone = timezone;
        settings.reminder_days = reminder_days;
        settings.notify_onboarding = cmd.notify_onboarding.unwrap_or(true);
        settings.notify_renewal = cmd.notify_renewal.unwrap_or(true);
        settings.notify_expiry_reminder = cmd.notify_expiry_reminder.unwrap_or(true);

        self.gyms.save(&settings).await?;
        tracing::info!(gym_id = %settings.gym_id, name = %settings.name, "Gym settings saved");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryGymDirectory;

    fn command(gym_id: GymId) -> SaveGymSettingsCommand {
        SaveGymSettingsCommand {
            gym_id,
            name: "  Iron Temple ".to_string(),
            timezone: Some("Europe/London".to_string()),
            reminder_days: None,
            notify_onboarding: None,
            notify_renewal: Some(false),
            notify_expiry_reminder: None,
        }
    }

    #[tokio::test]
    async fn saves_settings_with_defaults() {
        let gyms = Arc::new(InMemoryGymDirectory::new());
        let handler = SaveGymSettingsHandler::new(gyms.clone(), 5);
        let gym_id = GymId::new();

        let saved = handler.handle(command(gym_id)).await.unwrap();
        assert_eq!(saved.name, "Iron Temple");
        assert_eq!(saved.timezone, Some(chrono_tz::Europe::London));
        assert_eq!(saved.reminder_days, 5);
        assert!(saved.notify_onboarding);
        assert!(!saved.notify_renewal);

        assert_eq!(gyms.get(&gym_id).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn rejects_unknown_timezone() {
        let handler = SaveGymSettingsHandler::new(Arc::new(InMemoryGymDirectory::new()), 3);
        let mut cmd = command(GymId::new());
        cmd.timezone = Some("Mars/Olympus".to_string());

        let result = handler.handle(cmd).await;
        assert!(matches!(result, Err(LifecycleError::ValidationFailed { ref field, .. }) if field == "timezone"));
    }

    #[tokio::test]
    async fn rejects_long_reminder_window() {
        let handler = SaveGymSettingsHandler::new(Arc::new(InMemoryGymDirectory::new()), 3);
        let mut cmd = command(GymId::new());
        cmd.reminder_days = Some(31);

        assert!(handler.handle(cmd).await.is_err());
    }
}
