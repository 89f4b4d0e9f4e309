//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, time and calendar value objects, the state machine
//! trait and error types that form the vocabulary of the membership domain.

mod calendar;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use calendar::{GymCalendar, DEFAULT_TIMEZONE};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ActivityId, ClientId, GymId, MembershipId, PlanId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
