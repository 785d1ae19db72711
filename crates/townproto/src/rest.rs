//! REST bodies and the uniform response envelope.

use serde::{Deserialize, Serialize};

use crate::snapshot::{AreaSnapshot, BoundingBoxDto, PlayerSnapshot};

/// Every REST response is wrapped in this envelope; failures carry a
/// message and no payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "isOK")]
    pub is_ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(response: T) -> Self {
        Self {
            is_ok: true,
            message: None,
            response: Some(response),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            is_ok: false,
            message: Some(message.into()),
            response: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownCreateRequest {
    pub friendly_name: String,
    pub is_publicly_listed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownCreateResponse {
    #[serde(rename = "townID")]
    pub town_id: String,
    pub town_update_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownListingDto {
    #[serde(rename = "townID")]
    pub town_id: String,
    pub friendly_name: String,
    pub current_occupancy: usize,
    #[serde(rename = "maxOccupancy")]
    pub maximum_occupancy: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TownListResponse {
    pub towns: Vec<TownListingDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownUpdateRequest {
    pub town_update_password: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub is_publicly_listed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownDeleteRequest {
    pub town_update_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownJoinRequest {
    pub user_name: String,
    #[serde(rename = "townID")]
    pub town_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownJoinResponse {
    #[serde(rename = "playerID")]
    pub player_id: String,
    pub session_token: String,
    pub media_token: String,
    pub current_players: Vec<PlayerSnapshot>,
    pub conversation_areas: Vec<AreaSnapshot>,
}

/// Client-supplied shape of a new conversation area; occupants are never
/// taken from the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaDefinition {
    pub label: String,
    pub topic: String,
    pub bounding_box: BoundingBoxDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaCreateRequest {
    #[serde(rename = "townID")]
    pub town_id: String,
    pub session_token: String,
    pub conversation_area: AreaDefinition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_spells_is_ok_the_wire_way() {
        let ok = Envelope::ok(TownListResponse { towns: vec![] });
        let json = serde_json::to_string(&ok).unwrap();
        assert!(json.contains("\"isOK\":true"));
        assert!(!json.contains("message"));

        let fail: Envelope<TownListResponse> = Envelope::fail("nope");
        let json = serde_json::to_string(&fail).unwrap();
        assert!(json.contains("\"isOK\":false"));
        assert!(json.contains("\"message\":\"nope\""));
        assert!(!json.contains("response"));
    }

    #[test]
    fn update_request_fields_are_optional() {
        let req: TownUpdateRequest =
            serde_json::from_str(r#"{"townUpdatePassword":"secret"}"#).unwrap();
        assert_eq!(req.town_update_password, "secret");
        assert!(req.friendly_name.is_none());
        assert!(req.is_publicly_listed.is_none());
    }

    #[test]
    fn listing_keeps_wire_key_spellings() {
        let dto = TownListingDto {
            town_id: "t1".to_string(),
            friendly_name: "square".to_string(),
            current_occupancy: 3,
            maximum_occupancy: 50,
        };
        let json = serde_json::to_string(&dto).unwrap();
        assert!(json.contains("\"townID\":\"t1\""));
        assert!(json.contains("\"maxOccupancy\":50"));
        assert!(json.contains("\"currentOccupancy\":3"));
    }
}
