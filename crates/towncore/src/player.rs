//! Avatar identity and position.

use crate::ids;
use crate::geometry::BoundingBox;

/// Opaque, stable player identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn random() -> Self {
        Self(ids::new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Facing of an avatar sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Front,
    Back,
    Left,
    Right,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Front => "front",
            Direction::Back => "back",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Some(Direction::Front),
            "back" => Some(Direction::Back),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// A reported avatar position. `conversation_label` is the client-asserted
/// conversation-area membership hint; the controller reconciles it against
/// the areas that actually exist.
#[derive(Debug, Clone, PartialEq)]
pub struct UserLocation {
    pub x: f64,
    pub y: f64,
    pub rotation: Direction,
    pub moving: bool,
    pub conversation_label: Option<String>,
}

impl UserLocation {
    /// Stationary location facing front, asserting no area membership.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            rotation: Direction::Front,
            moving: false,
            conversation_label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.conversation_label = Some(label.into());
        self
    }
}

/// One avatar in one town. The controller is the sole mutator; everything
/// here is read-only outside the crate.
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    user_name: String,
    location: UserLocation,
    active_conversation_label: Option<String>,
}

impl Player {
    /// A new player spawns at the origin with no active area.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::random(),
            user_name: user_name.into(),
            location: UserLocation::at(0.0, 0.0),
            active_conversation_label: None,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn location(&self) -> &UserLocation {
        &self.location
    }

    /// Label of the conversation area this player currently occupies, if any.
    /// Matches the area's occupant list at every quiescent point.
    pub fn active_conversation_label(&self) -> Option<&str> {
        self.active_conversation_label.as_deref()
    }

    pub fn is_within(&self, bounds: &BoundingBox) -> bool {
        bounds.contains(self.location.x, self.location.y)
    }

    pub(crate) fn set_location(&mut self, location: UserLocation) {
        self.location = location;
    }

    pub(crate) fn set_active_conversation_label(&mut self, label: Option<String>) {
        self.active_conversation_label = label;
    }

    pub(crate) fn take_active_conversation_label(&mut self) -> Option<String> {
        self.active_conversation_label.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_spawns_at_origin() {
        let p = Player::new("alice");
        assert_eq!(p.user_name(), "alice");
        assert_eq!((p.location().x, p.location().y), (0.0, 0.0));
        assert!(p.active_conversation_label().is_none());
        assert!(!p.location().moving);
    }

    #[test]
    fn direction_round_trips() {
        for d in [
            Direction::Front,
            Direction::Back,
            Direction::Left,
            Direction::Right,
        ] {
            assert_eq!(Direction::parse(d.as_str()), Some(d));
        }
        assert_eq!(Direction::parse("sideways"), None);
    }
}
