//! GetClientHandler - Query handler for a client's current membership state.

use std::sync::Arc;

use crate::domain::client::Client;
use crate::domain::foundation::{ClientId, GymId, MembershipId};
use crate::domain::membership::{AssignedMembership, LifecycleError};
use crate::ports::LifecycleStore;

#[derive(Debug, Clone)]
pub struct GetClientQuery {
    pub gym_id: GymId,
    pub client_id: ClientId,
}

/// A client with its linked grants resolved.
#[derive(Debug, Clone)]
pub struct ClientView {
    pub client: Client,
    pub active: Option<AssignedMembership>,
    pub upcoming: Option<AssignedMembership>,
}

pub struct GetClientHandler {
    store: Arc<dyn LifecycleStore>,
}

impl GetClientHandler {
    pub fn new(store: Arc<dyn LifecycleStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetClientQuery) -> Result<ClientView, LifecycleError> {
        let client = self
            .store
            .find_client(&query.gym_id, &query.client_id)
            .await?
            .ok_or(LifecycleError::ClientNotFound(query.client_id))?;

        let active = self.resolve(&query.gym_id, client.active_membership()).await?;
        let upcoming = self.resolve(&query.gym_id, client.upcoming_membership()).await?;

        Ok(ClientView {
            client,
            active,
            upcoming,
        })
    }

    async fn resolve(
        &self,
        gym_id: &GymId,
        id: Option<MembershipId>,
    ) -> Result<Option<AssignedMembership>, LifecycleError> {
        match id {
            Some(id) => Ok(self.store.find_membership(gym_id, &id).await?),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLifecycleStore;
    use crate::domain::client::{ClientRole, NewClientProfile};
    use crate::domain::foundation::Timestamp;
    use crate::ports::LifecycleChanges;

    #[tokio::test]
    async fn returns_unenrolled_client_without_grants() {
        let store = Arc::new(InMemoryLifecycleStore::new());
        let client = Client::register(
            GymId::new(),
            NewClientProfile {
                name: "Asha".to_string(),
                phone_number: "9876543210".to_string(),
                ..Default::default()
            },
            ClientRole::Primary,
            Timestamp::now(),
        )
        .unwrap();
        let mut changes = LifecycleChanges::default();
        changes.create_client(client.clone());
        store.apply(changes).await.unwrap();

        let view = GetClientHandler::new(store)
            .handle(GetClientQuery {
                gym_id: client.gym_id,
                client_id: client.id,
            })
            .await
            .unwrap();
        assert_eq!(view.client.id, client.id);
        assert!(view.active.is_none());
        assert!(view.upcoming.is_none());
    }

    #[tokio::test]
    async fn fails_for_unknown_client() {
        let handler = GetClientHandler::new(Arc::new(InMemoryLifecycleStore::new()));
        let result = handler
            .handle(GetClientQuery {
                gym_id: GymId::new(),
                client_id: ClientId::new(),
            })
            .await;
        assert!(matches!(result, Err(LifecycleError::ClientNotFound(_))));
    }
}
