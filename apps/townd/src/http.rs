//! REST surface. Every response uses the shared envelope; validation and
//! lookup misses come back as `isOK=false` rather than error statuses.

use axum::extract::{Path, State};
use axum::Json;

use towncore::{ConversationArea, Player, SessionToken, TownId};
use townproto::rest::{
    AreaCreateRequest, Envelope, TownCreateRequest, TownCreateResponse, TownDeleteRequest,
    TownJoinRequest, TownJoinResponse, TownListResponse, TownListingDto, TownUpdateRequest,
};
use townproto::snapshot::{AreaSnapshot, PlayerSnapshot};
use tracing::warn;

use crate::AppState;

pub async fn create_town(
    State(state): State<AppState>,
    Json(req): Json<TownCreateRequest>,
) -> Json<Envelope<TownCreateResponse>> {
    if req.friendly_name.is_empty() {
        return Json(Envelope::fail("friendlyName must be specified"));
    }
    let controller = state
        .registry
        .create_town(&req.friendly_name, req.is_publicly_listed)
        .await;
    Json(Envelope::ok(TownCreateResponse {
        town_id: controller.town_id().to_string(),
        town_update_password: controller.update_password().to_string(),
    }))
}

pub async fn list_towns(State(state): State<AppState>) -> Json<Envelope<TownListResponse>> {
    let towns = state
        .registry
        .list_towns()
        .await
        .into_iter()
        .map(|t| TownListingDto {
            town_id: t.town_id.to_string(),
            friendly_name: t.friendly_name,
            current_occupancy: t.current_occupancy,
            maximum_occupancy: t.maximum_occupancy,
        })
        .collect();
    Json(Envelope::ok(TownListResponse { towns }))
}

pub async fn update_town(
    State(state): State<AppState>,
    Path(town_id): Path<String>,
    Json(req): Json<TownUpdateRequest>,
) -> Json<Envelope<()>> {
    if matches!(req.friendly_name.as_deref(), Some("")) {
        return Json(Envelope::fail("friendlyName must be specified"));
    }
    let ok = state
        .registry
        .update_town(
            &TownId::from(town_id.as_str()),
            &req.town_update_password,
            req.friendly_name.as_deref(),
            req.is_publicly_listed,
        )
        .await;
    if ok {
        Json(Envelope::ok(()))
    } else {
        Json(Envelope::fail(
            "invalid password or no town with that id exists",
        ))
    }
}

pub async fn delete_town(
    State(state): State<AppState>,
    Path(town_id): Path<String>,
    Json(req): Json<TownDeleteRequest>,
) -> Json<Envelope<()>> {
    let ok = state
        .registry
        .delete_town(&TownId::from(town_id.as_str()), &req.town_update_password)
        .await;
    if ok {
        Json(Envelope::ok(()))
    } else {
        Json(Envelope::fail(
            "invalid password or no town with that id exists",
        ))
    }
}

pub async fn join_town(
    State(state): State<AppState>,
    Json(req): Json<TownJoinRequest>,
) -> Json<Envelope<TownJoinResponse>> {
    if req.user_name.is_empty() {
        return Json(Envelope::fail("userName must be specified"));
    }
    let town_id = TownId::from(req.town_id.as_str());
    let Some(controller) = state.registry.controller_for_town(&town_id).await else {
        return Json(Envelope::fail("no town with that id exists"));
    };

    match controller.add_player(Player::new(req.user_name)).await {
        Ok(join) => Json(Envelope::ok(TownJoinResponse {
            player_id: join.session.player_id().to_string(),
            session_token: join.session.token().to_string(),
            media_token: join.session.media_token().to_string(),
            current_players: join.players.iter().map(PlayerSnapshot::from).collect(),
            conversation_areas: join.areas.iter().map(AreaSnapshot::from).collect(),
        })),
        Err(e) => {
            warn!(err = %e, town = %town_id, "join failed");
            Json(Envelope::fail(format!("unable to join town: {e}")))
        }
    }
}

pub async fn create_conversation_area(
    State(state): State<AppState>,
    Json(req): Json<AreaCreateRequest>,
) -> Json<Envelope<()>> {
    let refusal = format!(
        "Unable to create conversation area {} with topic {}",
        req.conversation_area.label, req.conversation_area.topic
    );

    let town_id = TownId::from(req.town_id.as_str());
    let Some(controller) = state.registry.controller_for_town(&town_id).await else {
        return Json(Envelope::fail(refusal));
    };
    let token = SessionToken::from(req.session_token.as_str());
    if controller.session_by_token(&token).await.is_none() {
        return Json(Envelope::fail(refusal));
    }

    let area = ConversationArea::new(
        req.conversation_area.label,
        req.conversation_area.topic,
        req.conversation_area.bounding_box.into(),
    );
    if controller.add_conversation_area(area).await {
        Json(Envelope::ok(()))
    } else {
        Json(Envelope::fail(refusal))
    }
}
