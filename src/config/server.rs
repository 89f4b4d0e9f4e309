//! HTTP listener settings for the membership API

use axum::http::HeaderValue;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use super::error::ValidationError;

/// Longest a single API call may run before the timeout layer answers for it.
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Listener, logging and browser-access settings for the API process.
///
/// Missing keys fall back to [`ServerConfig::default`], so an empty
/// `GYM_MEMBERSHIP__SERVER__*` environment serves on `0.0.0.0:8080`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub environment: Environment,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,
    pub request_timeout_secs: u64,
    /// Comma-separated origins for the front desk app; unset allows any origin
    pub cors_origins: Option<String>,
}

/// Deployment stage; production switches logs to JSON.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            environment: Environment::Development,
            log_level: "info,gym_membership=debug,sqlx=warn".to_string(),
            request_timeout_secs: 30,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Origins allowed to call the API from a browser. Empty means any.
    pub fn allowed_origins(&self) -> Result<Vec<HeaderValue>, ValidationError> {
        let Some(raw) = self.cors_origins.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| ValidationError::InvalidCorsOrigin(origin.to_string()))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        self.allowed_origins()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_on_all_interfaces_by_default() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert!(config.log_level.contains("gym_membership=debug"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn only_production_is_production() {
        let staging = ServerConfig {
            environment: Environment::Staging,
            ..Default::default()
        };
        let production = ServerConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        assert!(!staging.is_production());
        assert!(production.is_production());
    }

    #[test]
    fn front_desk_origins_are_parsed_and_blanks_dropped() {
        let config = ServerConfig {
            cors_origins: Some("https://desk.irontemple.in, ,http://localhost:5173".to_string()),
            ..Default::default()
        };
        let origins = config.allowed_origins().unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://desk.irontemple.in");
    }

    #[test]
    fn origin_with_control_characters_is_rejected() {
        let config = ServerConfig {
            cors_origins: Some("https://desk\u{7f}.in".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidCorsOrigin(_))
        ));
    }

    #[test]
    fn request_timeout_must_be_between_one_second_and_five_minutes() {
        for secs in [0, MAX_REQUEST_TIMEOUT_SECS + 1] {
            let config = ServerConfig {
                request_timeout_secs: secs,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(ValidationError::InvalidTimeout)));
        }
        let config = ServerConfig {
            request_timeout_secs: MAX_REQUEST_TIMEOUT_SECS,
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
    }
}
