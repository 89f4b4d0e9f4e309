//! gym-membership: membership lifecycle service
//!
//! Long-running service that:
//! - Serves the lifecycle REST API (onboarding, renewals, payments, plans)
//! - Runs daily reconciliation (promotion, expiry, reminders, retention)
//! - Sends member notifications through the configured provider

use std::sync::Arc;

use secrecy::Secret;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use gym_membership::adapters::http::{lifecycle_router, LifecycleAppState};
use gym_membership::adapters::notify::{LogNotifier, WhatsAppConfig, WhatsAppNotifier};
use gym_membership::adapters::postgres::{
    run_migrations, PostgresGymDirectory, PostgresLifecycleStore, PostgresPlanCatalog,
};
use gym_membership::adapters::{DailyReconciler, SystemClock};
use gym_membership::application::handlers::lifecycle::ReconcileMembershipsHandler;
use gym_membership::config::{AppConfig, NotificationConfig, ServerConfig};
use gym_membership::ports::{Clock, GymDirectory, LifecycleStore, Notifier, PlanCatalog};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        "Starting gym-membership"
    );

    // Database
    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    // Adapters
    let gyms: Arc<dyn GymDirectory> = Arc::new(PostgresGymDirectory::new(pool.clone()));
    let plans: Arc<dyn PlanCatalog> = Arc::new(PostgresPlanCatalog::new(pool.clone()));
    let store: Arc<dyn LifecycleStore> = Arc::new(PostgresLifecycleStore::new(pool.clone()));
    let notifier = build_notifier(&config.notifications)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let policy = config.lifecycle.policy()?;

    let reconciler = Arc::new(ReconcileMembershipsHandler::new(
        gyms.clone(),
        store.clone(),
        notifier.clone(),
        clock.clone(),
        policy,
    ));

    // Daily reconciliation
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = DailyReconciler::new(
        reconciler.clone(),
        clock.clone(),
        config.lifecycle.scheduler()?,
    );
    let scheduler_handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    // HTTP
    let state = LifecycleAppState {
        gyms,
        plans,
        store,
        notifier,
        clock,
        policy,
        default_reminder_days: config.lifecycle.reminder_days,
        reconciler,
        reconciliation_secret: config
            .lifecycle
            .reconciliation_secret
            .clone()
            .map(Arc::new),
    };
    if state.reconciliation_secret.is_none() {
        tracing::warn!("No reconciliation secret configured; manual runs are disabled");
    }

    let app = lifecycle_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(config.server.request_timeout()))
            .layer(cors_layer(&config.server)?),
    );

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the scheduler between passes
    let _ = shutdown_tx.send(true);
    scheduler_handle.await?;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_notifier(config: &NotificationConfig) -> Result<Arc<dyn Notifier>, BoxError> {
    if !config.delivers_whatsapp() {
        tracing::info!("Notifications are logged only");
        return Ok(Arc::new(LogNotifier::new()));
    }

    let api_url = config.api_url.clone().unwrap_or_default();
    let token = config
        .access_token
        .clone()
        .unwrap_or_else(|| Secret::new(String::new()));
    let whatsapp = WhatsAppConfig::new(api_url, token)
        .with_language(config.language.clone())
        .with_timeout(config.timeout());
    Ok(Arc::new(WhatsAppNotifier::new(whatsapp)?))
}

fn cors_layer(config: &ServerConfig) -> Result<CorsLayer, BoxError> {
    let origins = config.allowed_origins()?;
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
