//! Process-wide directory of live towns.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::broker::MediaBroker;
use crate::controller::{TownController, DEFAULT_CAPACITY};
use crate::ids::TownId;

/// One row of the public town directory.
#[derive(Debug, Clone)]
pub struct TownListing {
    pub town_id: TownId,
    pub friendly_name: String,
    pub current_occupancy: usize,
    pub maximum_occupancy: usize,
}

/// Maps town id to controller. Intended to be a single value per process,
/// shared by reference with every adapter; ids are random and never reused
/// within the registry's lifetime.
pub struct TownRegistry {
    capacity: usize,
    broker: Arc<dyn MediaBroker>,
    towns: Mutex<HashMap<TownId, Arc<TownController>>>,
}

impl TownRegistry {
    pub fn new(broker: Arc<dyn MediaBroker>) -> Self {
        Self::with_capacity(broker, DEFAULT_CAPACITY)
    }

    /// `capacity` applies to every town this registry creates.
    pub fn with_capacity(broker: Arc<dyn MediaBroker>, capacity: usize) -> Self {
        Self {
            capacity,
            broker,
            towns: Mutex::new(HashMap::new()),
        }
    }

    pub async fn create_town(
        &self,
        friendly_name: &str,
        publicly_listed: bool,
    ) -> Arc<TownController> {
        let controller = Arc::new(TownController::with_capacity(
            friendly_name,
            publicly_listed,
            self.capacity,
            self.broker.clone(),
        ));
        info!(town = %controller.town_id(), name = %friendly_name, public = publicly_listed, "town created");
        self.towns
            .lock()
            .await
            .insert(controller.town_id().clone(), controller.clone());
        controller
    }

    pub async fn controller_for_town(&self, town_id: &TownId) -> Option<Arc<TownController>> {
        self.towns.lock().await.get(town_id).cloned()
    }

    /// Snapshot of the publicly listed towns only.
    pub async fn list_towns(&self) -> Vec<TownListing> {
        let controllers: Vec<Arc<TownController>> =
            self.towns.lock().await.values().cloned().collect();

        // Controller locks are taken after the directory lock is dropped.
        let mut listings = Vec::new();
        for c in controllers {
            if !c.is_publicly_listed().await {
                continue;
            }
            listings.push(TownListing {
                town_id: c.town_id().clone(),
                friendly_name: c.friendly_name().await,
                current_occupancy: c.occupancy().await,
                maximum_occupancy: c.capacity(),
            });
        }
        listings
    }

    /// Password-authenticated settings update. Unknown town or wrong
    /// password leaves everything untouched.
    pub async fn update_town(
        &self,
        town_id: &TownId,
        password: &str,
        friendly_name: Option<&str>,
        publicly_listed: Option<bool>,
    ) -> bool {
        let Some(controller) = self.controller_for_town(town_id).await else {
            return false;
        };
        if controller.update_password() != password {
            return false;
        }
        if let Some(name) = friendly_name {
            controller.set_friendly_name(name).await;
        }
        if let Some(listed) = publicly_listed {
            controller.set_publicly_listed(listed).await;
        }
        true
    }

    /// Password-authenticated teardown: the controller disconnects everyone
    /// (emitting `town_destroyed`) and the id is dropped from the directory.
    pub async fn delete_town(&self, town_id: &TownId, password: &str) -> bool {
        let controller = {
            let mut towns = self.towns.lock().await;
            match towns.get(town_id) {
                Some(c) if c.update_password() == password => towns.remove(town_id),
                _ => None,
            }
        };
        let Some(controller) = controller else {
            return false;
        };
        controller.disconnect_all_players().await;
        info!(town = %town_id, "town deleted");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BrokerError;
    use crate::listener::TownListener;
    use crate::player::{Player, PlayerId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubBroker;

    #[async_trait]
    impl MediaBroker for StubBroker {
        async fn token_for_town(
            &self,
            _town_id: &TownId,
            _player_id: &PlayerId,
        ) -> Result<String, BrokerError> {
            Ok("media".to_string())
        }
    }

    fn registry() -> TownRegistry {
        TownRegistry::new(Arc::new(StubBroker))
    }

    #[tokio::test]
    async fn created_towns_are_resolvable() {
        let reg = registry();
        let town = reg.create_town("square", true).await;
        let found = reg.controller_for_town(town.town_id()).await.unwrap();
        assert_eq!(found.town_id(), town.town_id());
        assert!(reg.controller_for_town(&TownId::random()).await.is_none());
    }

    #[tokio::test]
    async fn listing_shows_public_towns_only() {
        let reg = registry();
        let public = reg.create_town("open", true).await;
        reg.create_town("hidden", false).await;
        public.add_player(Player::new("alice")).await.unwrap();

        let listings = reg.list_towns().await;
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].town_id, *public.town_id());
        assert_eq!(listings[0].friendly_name, "open");
        assert_eq!(listings[0].current_occupancy, 1);
        assert_eq!(listings[0].maximum_occupancy, public.capacity());
    }

    #[tokio::test]
    async fn update_requires_the_password() {
        let reg = registry();
        let town = reg.create_town("before", false).await;
        let id = town.town_id().clone();

        assert!(
            !reg.update_town(&id, "wrong", Some("after"), Some(true))
                .await
        );
        assert_eq!(town.friendly_name().await, "before");

        let password = town.update_password().to_string();
        assert!(
            reg.update_town(&id, &password, Some("after"), Some(true))
                .await
        );
        assert_eq!(town.friendly_name().await, "after");
        assert!(town.is_publicly_listed().await);

        // Partial updates leave the other field alone.
        assert!(reg.update_town(&id, &password, None, Some(false)).await);
        assert_eq!(town.friendly_name().await, "after");
        assert!(!town.is_publicly_listed().await);
    }

    #[tokio::test]
    async fn delete_requires_the_password_and_tears_down() {
        #[derive(Default)]
        struct CloseCounter(AtomicUsize);

        impl TownListener for CloseCounter {
            fn town_destroyed(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let reg = registry();
        let town = reg.create_town("doomed", true).await;
        let id = town.town_id().clone();
        let counter = Arc::new(CloseCounter::default());
        town.add_listener(counter.clone()).await;

        assert!(!reg.delete_town(&id, "wrong").await);
        assert!(reg.controller_for_town(&id).await.is_some());
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);

        let password = town.update_password().to_string();
        assert!(reg.delete_town(&id, &password).await);
        assert!(reg.controller_for_town(&id).await.is_none());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        // A second delete of the same id finds nothing.
        assert!(!reg.delete_town(&id, &password).await);
    }

    #[tokio::test]
    async fn town_ids_are_unique() {
        let reg = registry();
        let mut ids = std::collections::HashSet::new();
        for _ in 0..32 {
            let town = reg.create_town("t", false).await;
            assert!(ids.insert(town.town_id().clone()));
        }
    }
}
