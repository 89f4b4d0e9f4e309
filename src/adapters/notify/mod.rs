//! Notifier adapters.
//!
//! - `WhatsAppNotifier` - WhatsApp Cloud API template messages
//! - `LogNotifier` - tracing only
//! - `RecordingNotifier` - captures requests for tests

mod log_notifier;
mod recording;
mod whatsapp;

pub use log_notifier::LogNotifier;
pub use recording::RecordingNotifier;
pub use whatsapp::{WhatsAppConfig, WhatsAppNotifier};
