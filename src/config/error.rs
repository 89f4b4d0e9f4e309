//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid reconcile_at time '{0}', expected HH:MM")]
    InvalidReconcileTime(String),

    #[error("reminder_days must be between 0 and 30")]
    InvalidReminderDays,

    #[error("activity_retention_days must be at least 1")]
    InvalidRetention,

    #[error("Reconciliation secret must be at least 16 characters")]
    WeakReconciliationSecret,

    #[error("Notification api_url must use HTTPS")]
    NotificationUrlMustBeHttps,
}
