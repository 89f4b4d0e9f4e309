//! Gym directory port.

use crate::domain::foundation::{DomainError, GymId};
use crate::domain::gym::GymSettings;
use async_trait::async_trait;

/// Source of per-gym lifecycle settings.
#[async_trait]
pub trait GymDirectory: Send + Sync {
    async fn get(&self, gym_id: &GymId) -> Result<Option<GymSettings>, DomainError>;

    /// Every gym known to the system; reconciliation walks this list.
    async fn list(&self) -> Result<Vec<GymSettings>, DomainError>;

    /// Creates or replaces a gym's settings.
    async fn save(&self, settings: &GymSettings) -> Result<(), DomainError>;
}
