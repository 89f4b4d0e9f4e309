//! Notifier that only writes to the log.
//!
//! Used when notifications are disabled or no provider is configured.

use async_trait::async_trait;

use crate::ports::{NotificationRequest, Notifier, NotifyError};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        tracing::info!(
            gym_id = %request.gym_id,
            template = request.template.name(),
            params = ?request.params,
            "Notification (log only)"
        );
        Ok(())
    }
}
