//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - PostgreSQL persistence
//! - `memory` - In-process persistence for tests and local runs
//! - `notify` - WhatsApp and log notifiers
//! - `clock` - System and fixed clocks
//! - `scheduler` - Daily reconciliation task
//! - `http` - Axum REST API

pub mod clock;
pub mod http;
pub mod memory;
pub mod notify;
pub mod postgres;
pub mod scheduler;

pub use clock::{FixedClock, SystemClock};
pub use scheduler::{DailyReconciler, DailyReconcilerConfig};
