//! In-memory gym directory.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, GymId};
use crate::domain::gym::GymSettings;
use crate::ports::GymDirectory;

#[derive(Debug, Default)]
pub struct InMemoryGymDirectory {
    gyms: RwLock<HashMap<GymId, GymSettings>>,
}

impl InMemoryGymDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gyms(gyms: impl IntoIterator<Item = GymSettings>) -> Self {
        Self {
            gyms: RwLock::new(gyms.into_iter().map(|g| (g.gym_id, g)).collect()),
        }
    }
}

#[async_trait]
impl GymDirectory for InMemoryGymDirectory {
    async fn get(&self, gym_id: &GymId) -> Result<Option<GymSettings>, DomainError> {
        Ok(self.gyms.read().await.get(gym_id).cloned())
    }

    async fn list(&self) -> Result<Vec<GymSettings>, DomainError> {
        let mut gyms: Vec<_> = self.gyms.read().await.values().cloned().collect();
        gyms.sort_by_key(|g| g.gym_id);
        Ok(gyms)
    }

    async fn save(&self, settings: &GymSettings) -> Result<(), DomainError> {
        self.gyms
            .write()
            .await
            .insert(settings.gym_id, settings.clone());
        Ok(())
    }
}
