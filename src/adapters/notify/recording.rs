//! Notifier that records requests for assertions.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::ports::{NotificationRequest, NotificationTemplate, Notifier, NotifyError};

/// Captures every request. Can be switched to fail after recording, which
/// exercises the "log and drop" path of callers.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationRequest>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every call fails (after recording the attempt).
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_with(&self, template: NotificationTemplate) -> Vec<NotificationRequest> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|r| r.template == template)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        self.sent.lock().await.push(request);
        if self.fail {
            return Err(NotifyError::Transport("simulated delivery failure".to_string()));
        }
        Ok(())
    }
}
