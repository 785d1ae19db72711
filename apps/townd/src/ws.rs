//! WebSocket transport adapter: one socket, one session, one listener.
//!
//! The forwarding listener runs under the controller lock, so it only
//! enqueues; serialization and socket writes happen on a separate task.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use towncore::{ConversationArea, Player, SessionToken, TownId, TownListener};
use townproto::events::{ClientEvent, ServerEvent};
use townproto::snapshot::{AreaSnapshot, PlayerSnapshot};
use tracing::debug;

use crate::AppState;

/// Events buffered per client before we consider the socket stuck.
const OUTBOUND_BUFFER: usize = 256;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: String,
    #[serde(rename = "townID")]
    town_id: String,
}

struct SocketListener {
    tx: mpsc::Sender<ServerEvent>,
}

impl SocketListener {
    fn push(&self, ev: ServerEvent) {
        // Slow or vanished clients lose events; the reader half tears the
        // session down shortly after.
        let _ = self.tx.try_send(ev);
    }
}

impl TownListener for SocketListener {
    fn player_joined(&self, player: &Player) {
        self.push(ServerEvent::NewPlayer {
            player: player.into(),
        });
    }

    fn player_moved(&self, player: &Player) {
        self.push(ServerEvent::PlayerMoved {
            player: player.into(),
        });
    }

    fn player_disconnected(&self, player: &Player) {
        self.push(ServerEvent::PlayerDisconnect {
            player: player.into(),
        });
    }

    fn conversation_area_updated(&self, area: &ConversationArea) {
        self.push(ServerEvent::ConversationUpdated { area: area.into() });
    }

    fn conversation_area_destroyed(&self, area: &ConversationArea) {
        self.push(ServerEvent::ConversationDestroyed { area: area.into() });
    }

    fn town_destroyed(&self) {
        self.push(ServerEvent::TownClosing);
    }
}

pub async fn town_socket(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

async fn handle_socket(mut socket: WebSocket, params: WsParams, state: AppState) {
    let town_id = TownId::from(params.town_id.as_str());
    let Some(controller) = state.registry.controller_for_town(&town_id).await else {
        debug!(town = %town_id, "socket for unknown town");
        let _ = socket.close().await;
        return;
    };
    let token = SessionToken::from(params.token.as_str());
    let Some(session) = controller.session_by_token(&token).await else {
        debug!(town = %town_id, "socket with unknown session token");
        let _ = socket.close().await;
        return;
    };

    let (tx, mut rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER);
    let listener: Arc<dyn TownListener> = Arc::new(SocketListener { tx });
    controller.add_listener(listener.clone()).await;

    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let closing = matches!(ev, ServerEvent::TownClosing);
            let Ok(text) = serde_json::to_string(&ev) else {
                continue;
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
            if closing {
                // townClosing forces the disconnect from our side.
                let _ = sink.close().await;
                break;
            }
        }
    });

    while let Some(msg) = stream.next().await {
        let Ok(msg) = msg else {
            break;
        };
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(ClientEvent::PlayerMovement { location }) => {
                    controller
                        .update_player_location(session.player_id(), location.into())
                        .await;
                }
                Err(e) => debug!(err = %e, "ignoring malformed client message"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    controller.remove_listener(&listener).await;
    controller.destroy_session(&session).await;
    writer.abort();
}
