//! Notifier port for templated client messages.
//!
//! Delivery is best-effort. Callers log a returned [`NotifyError`] and carry
//! on; a failed message never undoes a committed lifecycle change.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::client::PhoneNumber;
use crate::domain::foundation::GymId;

/// Message templates registered with the messaging provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    Onboarding,
    RenewalComplete,
    ExpiryReminder,
}

impl NotificationTemplate {
    /// Template name as registered with the provider.
    pub fn name(&self) -> &'static str {
        match self {
            NotificationTemplate::Onboarding => "onboarding",
            NotificationTemplate::RenewalComplete => "renewal_complete",
            NotificationTemplate::ExpiryReminder => "expiry_reminder",
        }
    }
}

/// A single templated message to one phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub gym_id: GymId,
    pub gym_name: String,
    pub phone_number: PhoneNumber,
    pub template: NotificationTemplate,
    /// Positional template parameters.
    pub params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("Notification transport failed: {0}")]
    Transport(String),

    #[error("Notification rejected by provider ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Notifications are not configured: {0}")]
    NotConfigured(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, request: NotificationRequest) -> Result<(), NotifyError>;
}
