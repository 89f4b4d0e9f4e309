//! In-memory adapters for tests and local runs without a database.

mod gym_directory;
mod lifecycle_store;
mod plan_catalog;

pub use gym_directory::InMemoryGymDirectory;
pub use lifecycle_store::InMemoryLifecycleStore;
pub use plan_catalog::InMemoryPlanCatalog;
