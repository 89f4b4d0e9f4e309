//! Notification delivery configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Notification configuration (WhatsApp Cloud API)
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Master switch; when false, messages are only logged
    #[serde(default)]
    pub enabled: bool,

    /// Delivery provider
    #[serde(default)]
    pub provider: NotificationProvider,

    /// Messages endpoint of the provider
    pub api_url: Option<String>,

    /// Provider access token
    pub access_token: Option<Secret<String>>,

    /// Template language code
    #[serde(default = "default_language")]
    pub language: String,

    /// Per-message timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Notification provider
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationProvider {
    #[default]
    Log,
    Whatsapp,
}

impl NotificationConfig {
    /// Whether messages should actually be delivered through WhatsApp
    pub fn delivers_whatsapp(&self) -> bool {
        self.enabled && self.provider == NotificationProvider::Whatsapp
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate notification configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.delivers_whatsapp() {
            return Ok(());
        }
        let url = self
            .api_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ValidationError::MissingRequired("NOTIFICATIONS__API_URL"))?;
        if !url.starts_with("https://") {
            return Err(ValidationError::NotificationUrlMustBeHttps);
        }
        let has_token = self
            .access_token
            .as_ref()
            .is_some_and(|token| !token.expose_secret().is_empty());
        if !has_token {
            return Err(ValidationError::MissingRequired("NOTIFICATIONS__ACCESS_TOKEN"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: NotificationProvider::default(),
            api_url: None,
            access_token: None,
            language: default_language(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_timeout() -> u64 {
    10
}
