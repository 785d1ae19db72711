//! Socket messages exchanged with connected clients.

use serde::{Deserialize, Serialize};

use crate::snapshot::{AreaSnapshot, LocationDto, PlayerSnapshot};

/// Server → client. One message per core event, in fan-out order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    NewPlayer { player: PlayerSnapshot },
    PlayerMoved { player: PlayerSnapshot },
    PlayerDisconnect { player: PlayerSnapshot },
    /// The town is going away; the server closes the socket right after.
    TownClosing,
    ConversationUpdated { area: AreaSnapshot },
    ConversationDestroyed { area: AreaSnapshot },
}

/// Client → server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    PlayerMovement { location: LocationDto },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DirectionDto;

    #[test]
    fn server_events_carry_their_wire_names() {
        let json = serde_json::to_string(&ServerEvent::TownClosing).unwrap();
        assert_eq!(json, "{\"type\":\"townClosing\"}");

        let ev = ServerEvent::PlayerDisconnect {
            player: PlayerSnapshot {
                id: "p1".to_string(),
                user_name: "alice".to_string(),
                location: LocationDto {
                    x: 0.0,
                    y: 0.0,
                    rotation: DirectionDto::Front,
                    moving: false,
                    conversation_label: None,
                },
            },
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"playerDisconnect\""));
    }

    #[test]
    fn movement_messages_parse() {
        let json = r#"{"type":"playerMovement","location":{"x":3.0,"y":4.0,"rotation":"back","moving":true}}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        let ClientEvent::PlayerMovement { location } = ev;
        assert_eq!(location.x, 3.0);
        assert_eq!(location.rotation, DirectionDto::Back);
        assert!(location.conversation_label.is_none());
    }
}
