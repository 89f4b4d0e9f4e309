//! PostgreSQL adapters - Database implementations of the persistence ports.
//!
//! - `PostgresLifecycleStore` - Clients, assigned memberships and activities
//! - `PostgresPlanCatalog` - Membership plan templates
//! - `PostgresGymDirectory` - Per-gym lifecycle settings
//!
//! Schema lives in `migrations/` and is applied with [`run_migrations`].

mod gym_directory;
mod lifecycle_store;
mod plan_catalog;

pub use gym_directory::PostgresGymDirectory;
pub use lifecycle_store::PostgresLifecycleStore;
pub use plan_catalog::PostgresPlanCatalog;

use sqlx::PgPool;

/// Applies pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
