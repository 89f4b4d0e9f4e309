//! WhatsApp Cloud API notifier.
//!
//! Sends approved message templates with positional body parameters.
//!
//! # Configuration
//!
//! ```ignore
//! let config = WhatsAppConfig::new(api_url, access_token)
//!     .with_language("en")
//!     .with_timeout(Duration::from_secs(10));
//!
//! let notifier = WhatsAppNotifier::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::time::Duration;

use crate::ports::{NotificationRequest, Notifier, NotifyError};

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// Messages endpoint, e.g. `https://graph.facebook.com/v19.0/<phone-id>/messages`.
    pub api_url: String,
    access_token: Secret<String>,
    /// Template language code.
    pub language: String,
    pub timeout: Duration,
}

impl WhatsAppConfig {
    pub fn new(api_url: impl Into<String>, access_token: Secret<String>) -> Self {
        Self {
            api_url: api_url.into(),
            access_token,
            language: "en".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct WhatsAppNotifier {
    config: WhatsAppConfig,
    client: Client,
}

impl WhatsAppNotifier {
    pub fn new(config: WhatsAppConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifyError::NotConfigured(format!("HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn to_message<'a>(&'a self, request: &'a NotificationRequest) -> TemplateMessage<'a> {
        TemplateMessage {
            messaging_product: "whatsapp",
            to: request.phone_number.as_str(),
            kind: "template",
            template: Template {
                name: request.template.name(),
                language: Language {
                    code: &self.config.language,
                },
                components: vec![Component {
                    kind: "body",
                    parameters: request
                        .params
                        .iter()
                        .map(|text| Parameter { kind: "text", text })
                        .collect(),
                }],
            },
        }
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn notify(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        let message = self.to_message(&request);

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Transport(format!("timed out after {:?}", self.config.timeout))
                } else {
                    NotifyError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                gym_id = %request.gym_id,
                template = request.template.name(),
                "WhatsApp template sent"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Debug, Serialize)]
struct TemplateMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    template: Template<'a>,
}

#[derive(Debug, Serialize)]
struct Template<'a> {
    name: &'static str,
    language: Language<'a>,
    components: Vec<Component<'a>>,
}

#[derive(Debug, Serialize)]
struct Language<'a> {
    code: &'a str,
}

#[derive(Debug, Serialize)]
struct Component<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    parameters: Vec<Parameter<'a>>,
}

#[derive(Debug, Serialize)]
struct Parameter<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}
