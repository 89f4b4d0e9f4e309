//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `GYM_MEMBERSHIP_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use gym_membership::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod database;
mod error;
mod lifecycle;
mod notifications;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use lifecycle::LifecycleConfig;
pub use notifications::{NotificationConfig, NotificationProvider};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Lifecycle engine (timezone, reminders, retention, daily schedule)
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Outbound member notifications
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `GYM_MEMBERSHIP` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `GYM_MEMBERSHIP__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `GYM_MEMBERSHIP__DATABASE__URL=...` -> `database.url = ...`
    /// - `GYM_MEMBERSHIP__LIFECYCLE__RECONCILE_AT=00:05` -> `lifecycle.reconcile_at`
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GYM_MEMBERSHIP")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.lifecycle.validate()?;
        self.notifications.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
