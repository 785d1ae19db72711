//! A session is an authenticated client's ticket into one town.

use crate::ids::{self, TownId};
use crate::player::PlayerId;

/// Unguessable session token, compared by exact equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn random() -> Self {
        Self(ids::new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Binds a player to a town, carrying whatever the media broker returned.
/// Created once per join; destroyed on disconnect or town teardown.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    token: SessionToken,
    player_id: PlayerId,
    town_id: TownId,
    media_token: String,
}

impl PlayerSession {
    pub fn new(player_id: PlayerId, town_id: TownId, media_token: String) -> Self {
        Self {
            token: SessionToken::random(),
            player_id,
            town_id,
            media_token,
        }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    pub fn town_id(&self) -> &TownId {
        &self.town_id
    }

    /// Opaque credential for the external media provider.
    pub fn media_token(&self) -> &str {
        &self.media_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_get_distinct_tokens() {
        let town = TownId::random();
        let a = PlayerSession::new(PlayerId::random(), town.clone(), "m1".to_string());
        let b = PlayerSession::new(PlayerId::random(), town, "m2".to_string());
        assert_ne!(a.token(), b.token());
        assert_eq!(a.media_token(), "m1");
    }
}
