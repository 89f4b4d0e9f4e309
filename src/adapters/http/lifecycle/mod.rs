//! HTTP adapter for the membership lifecycle.
//!
//! Exposes onboarding, renewal, payments, cancellation, the plan catalog,
//! gym settings and manual reconciliation as a REST API. See
//! [`routes`] for the route table.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{LifecycleApiError, LifecycleAppState, RECONCILIATION_SECRET_HEADER};
pub use routes::lifecycle_router;
