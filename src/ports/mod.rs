//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the lifecycle engine and the outside world. Adapters implement these ports.
//!
//! - `PlanCatalog` - Membership plan lookup and storage
//! - `LifecycleStore` - Transactional client/membership/activity persistence
//! - `GymDirectory` - Per-gym settings
//! - `Notifier` - Best-effort templated messages
//! - `Clock` - Current instant

mod clock;
mod gym_directory;
mod lifecycle_store;
mod notifier;
mod plan_catalog;

pub use clock::Clock;
pub use gym_directory::GymDirectory;
pub use lifecycle_store::{LifecycleChanges, LifecycleStore};
pub use notifier::{NotificationRequest, NotificationTemplate, Notifier, NotifyError};
pub use plan_catalog::PlanCatalog;
