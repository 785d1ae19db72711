//! Wire snapshots of core state.

use serde::{Deserialize, Serialize};

use towncore::{BoundingBox, ConversationArea, Direction, Player, UserLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionDto {
    Front,
    Back,
    Left,
    Right,
}

impl From<Direction> for DirectionDto {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Front => DirectionDto::Front,
            Direction::Back => DirectionDto::Back,
            Direction::Left => DirectionDto::Left,
            Direction::Right => DirectionDto::Right,
        }
    }
}

impl From<DirectionDto> for Direction {
    fn from(d: DirectionDto) -> Self {
        match d {
            DirectionDto::Front => Direction::Front,
            DirectionDto::Back => Direction::Back,
            DirectionDto::Left => Direction::Left,
            DirectionDto::Right => Direction::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    pub x: f64,
    pub y: f64,
    pub rotation: DirectionDto,
    pub moving: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_label: Option<String>,
}

impl From<&UserLocation> for LocationDto {
    fn from(l: &UserLocation) -> Self {
        Self {
            x: l.x,
            y: l.y,
            rotation: l.rotation.into(),
            moving: l.moving,
            conversation_label: l.conversation_label.clone(),
        }
    }
}

impl From<LocationDto> for UserLocation {
    fn from(l: LocationDto) -> Self {
        Self {
            x: l.x,
            y: l.y,
            rotation: l.rotation.into(),
            moving: l.moving,
            conversation_label: l.conversation_label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: String,
    pub user_name: String,
    pub location: LocationDto,
}

impl From<&Player> for PlayerSnapshot {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id().to_string(),
            user_name: p.user_name().to_string(),
            location: p.location().into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxDto {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<BoundingBox> for BoundingBoxDto {
    fn from(b: BoundingBox) -> Self {
        Self {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
        }
    }
}

impl From<BoundingBoxDto> for BoundingBox {
    fn from(b: BoundingBoxDto) -> Self {
        BoundingBox::new(b.x, b.y, b.width, b.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSnapshot {
    pub label: String,
    pub topic: String,
    #[serde(rename = "occupantsByID")]
    pub occupants_by_id: Vec<String>,
    pub bounding_box: BoundingBoxDto,
}

impl From<&ConversationArea> for AreaSnapshot {
    fn from(a: &ConversationArea) -> Self {
        Self {
            label: a.label().to_string(),
            topic: a.topic().to_string(),
            occupants_by_id: a.occupants().iter().map(|id| id.to_string()).collect(),
            bounding_box: a.bounding_box().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_snapshot_uses_camel_case() {
        let p = Player::new("alice");
        let json = serde_json::to_string(&PlayerSnapshot::from(&p)).unwrap();
        assert!(json.contains("\"userName\":\"alice\""));
        assert!(json.contains("\"rotation\":\"front\""));
        // An absent label is omitted, not null.
        assert!(!json.contains("conversationLabel"));
    }

    #[test]
    fn area_snapshot_keeps_occupant_key_spelling() {
        let a = ConversationArea::new("porch", "news", BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        let json = serde_json::to_string(&AreaSnapshot::from(&a)).unwrap();
        assert!(json.contains("\"occupantsByID\":[]"));
        assert!(json.contains("\"boundingBox\""));
    }

    #[test]
    fn location_round_trips_through_the_wire() {
        let loc = UserLocation {
            x: 1.5,
            y: -2.0,
            rotation: Direction::Left,
            moving: true,
            conversation_label: Some("porch".to_string()),
        };
        let dto = LocationDto::from(&loc);
        let parsed: LocationDto =
            serde_json::from_str(&serde_json::to_string(&dto).unwrap()).unwrap();
        assert_eq!(UserLocation::from(parsed), loc);
    }
}
