//! Lifecycle error types.
//!
//! Errors surfaced by onboarding, renewal, payment and plan operations.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | GymNotFound, PlanNotFound, ClientNotFound, MembershipNotFound | 404 |
//! | PlanInactive, CapacityExceeded, ValidationFailed | 400 |
//! | PhoneNumberTaken, Conflict, InvalidState | 409 |
//! | Storage | 500 |

use thiserror::Error;

use crate::domain::foundation::{
    ClientId, DomainError, ErrorCode, GymId, MembershipId, PlanId, ValidationError,
};

/// Errors from lifecycle operations.
///
/// Every variant is raised before anything is committed, so callers may
/// retry the whole operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Gym not found: {0}")]
    GymNotFound(GymId),

    #[error("Membership plan not found: {0}")]
    PlanNotFound(PlanId),

    #[error("Membership plan {0} is no longer offered")]
    PlanInactive(PlanId),

    #[error("Client not found: {0}")]
    ClientNotFound(ClientId),

    #[error("Membership not found: {0}")]
    MembershipNotFound(MembershipId),

    #[error("Plan allows {allowed} member(s) but {requested} were given")]
    CapacityExceeded { allowed: u32, requested: usize },

    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("A client with phone number {0} already exists in this gym")]
    PhoneNumberTaken(String),

    #[error("Cannot {attempted} membership in {current} state")]
    InvalidState { current: String, attempted: String },

    #[error("Conflicting update: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LifecycleError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LifecycleError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        LifecycleError::Storage(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            LifecycleError::GymNotFound(_) => ErrorCode::GymNotFound,
            LifecycleError::PlanNotFound(_) => ErrorCode::PlanNotFound,
            LifecycleError::PlanInactive(_) => ErrorCode::PlanInactive,
            LifecycleError::ClientNotFound(_) => ErrorCode::ClientNotFound,
            LifecycleError::MembershipNotFound(_) => ErrorCode::MembershipNotFound,
            LifecycleError::CapacityExceeded { .. } => ErrorCode::CapacityExceeded,
            LifecycleError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            LifecycleError::PhoneNumberTaken(_) => ErrorCode::PhoneNumberTaken,
            LifecycleError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            LifecycleError::Conflict(_) => ErrorCode::ConcurrentModification,
            LifecycleError::Storage(_) => ErrorCode::DatabaseError,
        }
    }

    /// True for failures where repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LifecycleError::Storage(_) | LifecycleError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LifecycleError::GymNotFound(_)
                | LifecycleError::PlanNotFound(_)
                | LifecycleError::ClientNotFound(_)
                | LifecycleError::MembershipNotFound(_)
        )
    }
}

impl From<ValidationError> for LifecycleError {
    fn from(err: ValidationError) -> Self {
        LifecycleError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for LifecycleError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PhoneNumberTaken => LifecycleError::PhoneNumberTaken(
                err.detail("phone_number").unwrap_or("unknown").to_string(),
            ),
            ErrorCode::ConcurrentModification => LifecycleError::Conflict(err.message),
            ErrorCode::InvalidStateTransition => LifecycleError::InvalidState {
                current: err.detail("current").unwrap_or("unknown").to_string(),
                attempted: err.message,
            },
            ErrorCode::ValidationFailed | ErrorCode::CapacityExceeded | ErrorCode::PlanInactive => {
                LifecycleError::ValidationFailed {
                    field: err.detail("field").unwrap_or("unknown").to_string(),
                    message: err.message,
                }
            }
            _ => LifecycleError::Storage(err.to_string()),
        }
    }
}

impl From<LifecycleError> for DomainError {
    fn from(err: LifecycleError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
