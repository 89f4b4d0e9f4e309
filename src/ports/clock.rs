//! Clock port.
//!
//! Handlers never call `Timestamp::now()` directly so that reconciliation can
//! be driven against any day in tests.

use crate::domain::foundation::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
