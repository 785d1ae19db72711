//! Port to the external media provider.

use async_trait::async_trait;

use crate::ids::TownId;
use crate::player::PlayerId;

#[derive(Debug, Clone)]
pub enum BrokerError {
    /// The provider refused to issue a credential.
    Denied(String),
    /// The provider could not be reached, or timed out.
    Unavailable(String),
}

impl std::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerError::Denied(msg) => write!(f, "media broker denied token: {msg}"),
            BrokerError::Unavailable(msg) => write!(f, "media broker unavailable: {msg}"),
        }
    }
}

impl std::error::Error for BrokerError {}

/// Issues per-(town, player) media credentials. Called exactly once per
/// successful join, with no town lock held; implementations are expected to
/// bound their own time.
#[async_trait]
pub trait MediaBroker: Send + Sync {
    async fn token_for_town(
        &self,
        town_id: &TownId,
        player_id: &PlayerId,
    ) -> Result<String, BrokerError>;
}
