//! The authoritative per-town state machine.
//!
//! One controller owns one town: its players, sessions, conversation areas,
//! and listeners. All mutations serialize behind a single lock, and each
//! mutation's listener fan-out completes before the lock is released. The
//! only external I/O is the media-broker call during a join, which happens
//! with no lock held; the commit re-checks that the town still exists.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::area::ConversationArea;
use crate::broker::{BrokerError, MediaBroker};
use crate::ids::{self, TownId};
use crate::listener::{ListenerSet, TownListener};
use crate::player::{Player, PlayerId, UserLocation};
use crate::session::{PlayerSession, SessionToken};

/// Default player capacity for a new town.
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub enum JoinError {
    /// The town was torn down between token issue and commit.
    TownClosed,
    TownFull,
    Broker(BrokerError),
}

impl std::fmt::Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinError::TownClosed => write!(f, "town no longer exists"),
            JoinError::TownFull => write!(f, "town is at capacity"),
            JoinError::Broker(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for JoinError {}

impl From<BrokerError> for JoinError {
    fn from(e: BrokerError) -> Self {
        JoinError::Broker(e)
    }
}

/// Everything a transport needs to seed a freshly joined client.
#[derive(Debug, Clone)]
pub struct TownJoin {
    pub session: PlayerSession,
    pub players: Vec<Player>,
    pub areas: Vec<ConversationArea>,
}

struct TownState {
    friendly_name: String,
    publicly_listed: bool,
    players: Vec<Player>,
    sessions: HashMap<SessionToken, PlayerSession>,
    areas: Vec<ConversationArea>,
    listeners: ListenerSet,
    closed: bool,
}

pub struct TownController {
    town_id: TownId,
    update_password: String,
    capacity: usize,
    broker: Arc<dyn MediaBroker>,
    state: Mutex<TownState>,
}

impl TownController {
    pub fn new(
        friendly_name: impl Into<String>,
        publicly_listed: bool,
        broker: Arc<dyn MediaBroker>,
    ) -> Self {
        Self::with_capacity(friendly_name, publicly_listed, DEFAULT_CAPACITY, broker)
    }

    pub fn with_capacity(
        friendly_name: impl Into<String>,
        publicly_listed: bool,
        capacity: usize,
        broker: Arc<dyn MediaBroker>,
    ) -> Self {
        Self {
            town_id: TownId::random(),
            update_password: ids::new_id(),
            capacity,
            broker,
            state: Mutex::new(TownState {
                friendly_name: friendly_name.into(),
                publicly_listed,
                players: Vec::new(),
                sessions: HashMap::new(),
                areas: Vec::new(),
                listeners: ListenerSet::new(),
                closed: false,
            }),
        }
    }

    pub fn town_id(&self) -> &TownId {
        &self.town_id
    }

    /// Shared secret required to update or delete this town. Returned to the
    /// creator once; compared by exact equality.
    pub fn update_password(&self) -> &str {
        &self.update_password
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn friendly_name(&self) -> String {
        self.state.lock().await.friendly_name.clone()
    }

    pub async fn is_publicly_listed(&self) -> bool {
        self.state.lock().await.publicly_listed
    }

    pub async fn occupancy(&self) -> usize {
        self.state.lock().await.players.len()
    }

    pub async fn players(&self) -> Vec<Player> {
        self.state.lock().await.players.clone()
    }

    pub async fn conversation_areas(&self) -> Vec<ConversationArea> {
        self.state.lock().await.areas.clone()
    }

    pub(crate) async fn set_friendly_name(&self, name: &str) {
        self.state.lock().await.friendly_name = name.to_string();
    }

    pub(crate) async fn set_publicly_listed(&self, listed: bool) {
        self.state.lock().await.publicly_listed = listed;
    }

    pub async fn add_listener(&self, listener: Arc<dyn TownListener>) {
        self.state.lock().await.listeners.add(listener);
    }

    pub async fn remove_listener(&self, listener: &Arc<dyn TownListener>) {
        self.state.lock().await.listeners.remove(listener);
    }

    /// Admit a player: fetch a media credential, commit the player and a new
    /// session, and announce the join.
    ///
    /// The broker is awaited with no lock held. If the broker fails, or the
    /// town was torn down or filled up while waiting, nothing is committed
    /// and no event fires.
    pub async fn add_player(&self, player: Player) -> Result<TownJoin, JoinError> {
        let media_token = self
            .broker
            .token_for_town(&self.town_id, player.id())
            .await?;

        let mut guard = self.state.lock().await;
        let st = &mut *guard;
        if st.closed {
            return Err(JoinError::TownClosed);
        }
        if st.players.len() >= self.capacity {
            return Err(JoinError::TownFull);
        }

        let session = PlayerSession::new(player.id().clone(), self.town_id.clone(), media_token);
        info!(town = %self.town_id, player = %player.id(), name = %player.user_name(), "player joined");
        st.players.push(player);
        st.sessions.insert(session.token().clone(), session.clone());

        let joined = &st.players[st.players.len() - 1];
        st.listeners.each(|l| l.player_joined(joined));

        Ok(TownJoin {
            session,
            players: st.players.clone(),
            areas: st.areas.clone(),
        })
    }

    pub async fn session_by_token(&self, token: &SessionToken) -> Option<PlayerSession> {
        self.state.lock().await.sessions.get(token).cloned()
    }

    /// Tear down one session: evict the player from any active area, drop the
    /// session and the player, and announce the disconnect. Unknown sessions
    /// are ignored.
    pub async fn destroy_session(&self, session: &PlayerSession) {
        let mut guard = self.state.lock().await;
        let st = &mut *guard;
        if st.sessions.remove(session.token()).is_none() {
            return;
        }

        let player_id = session.player_id().clone();
        Self::leave_active_area(st, &player_id);

        if let Some(idx) = st.players.iter().position(|p| p.id() == &player_id) {
            let player = st.players.remove(idx);
            info!(town = %self.town_id, player = %player_id, "player disconnected");
            st.listeners.each(|l| l.player_disconnected(&player));
        }
    }

    /// Commit a reported location and reconcile conversation-area membership.
    ///
    /// The client's asserted `conversation_label` decides membership whenever
    /// an area with that label exists; geometry does not second-guess it.
    /// Area events (at most two) fire before the single `player_moved`.
    pub async fn update_player_location(&self, player_id: &PlayerId, location: UserLocation) {
        let mut guard = self.state.lock().await;
        let st = &mut *guard;
        let Some(pidx) = st.players.iter().position(|p| p.id() == player_id) else {
            return;
        };

        let next = location
            .conversation_label
            .as_deref()
            .filter(|label| st.areas.iter().any(|a| a.label() == *label))
            .map(str::to_string);
        let prev = st.players[pidx]
            .active_conversation_label()
            .map(str::to_string);

        st.players[pidx].set_location(location);

        if prev != next {
            st.players[pidx].set_active_conversation_label(next.clone());
            if let Some(label) = &next {
                if let Some(area) = st.areas.iter_mut().find(|a| a.label() == label) {
                    area.add_occupant(player_id.clone());
                }
                if let Some(area) = st.areas.iter().find(|a| a.label() == label) {
                    st.listeners.each(|l| l.conversation_area_updated(area));
                }
            }
            if let Some(label) = &prev {
                Self::remove_occupant(st, label, player_id);
            }
        }

        let player = &st.players[pidx];
        st.listeners.each(|l| l.player_moved(player));
    }

    /// Create a conversation area and sweep up players already standing
    /// inside it who have no active area of their own.
    ///
    /// Rejects (returning `false`, with no state change and no event) an
    /// empty label or topic, a duplicate label, an overlapping box, or a
    /// town that is already closed.
    pub async fn add_conversation_area(&self, area: ConversationArea) -> bool {
        let mut guard = self.state.lock().await;
        let st = &mut *guard;
        if st.closed || area.label().is_empty() || area.topic().is_empty() {
            return false;
        }
        if st.areas.iter().any(|a| a.label() == area.label()) {
            return false;
        }
        let bounds = area.bounding_box();
        if st.areas.iter().any(|a| a.bounding_box().overlaps(&bounds)) {
            return false;
        }

        let mut area = area;
        for p in st.players.iter_mut() {
            if p.active_conversation_label().is_none() && p.is_within(&bounds) {
                area.add_occupant(p.id().clone());
                p.set_active_conversation_label(Some(area.label().to_string()));
            }
        }
        st.areas.push(area);
        if let Some(created) = st.areas.last() {
            st.listeners.each(|l| l.conversation_area_updated(created));
        }
        true
    }

    /// Tear the whole town down. `town_destroyed` fires exactly once per
    /// controller; afterwards no event is ever emitted again and joins fail.
    pub async fn disconnect_all_players(&self) {
        let mut guard = self.state.lock().await;
        let st = &mut *guard;
        if st.closed {
            return;
        }
        st.closed = true;
        info!(town = %self.town_id, "town closing");
        st.listeners.each(|l| l.town_destroyed());
        st.players.clear();
        st.sessions.clear();
        st.areas.clear();
    }

    /// Shared "player leaves their area" half of the location pipeline, used
    /// by both location updates and session teardown.
    fn leave_active_area(st: &mut TownState, player_id: &PlayerId) {
        let Some(label) = st
            .players
            .iter_mut()
            .find(|p| p.id() == player_id)
            .and_then(|p| p.take_active_conversation_label())
        else {
            return;
        };
        Self::remove_occupant(st, &label, player_id);
    }

    /// Drop `player_id` from the area named `label`, destroying the area if
    /// it just emptied and announcing whichever transition happened.
    fn remove_occupant(st: &mut TownState, label: &str, player_id: &PlayerId) {
        let Some(idx) = st.areas.iter().position(|a| a.label() == label) else {
            return;
        };
        st.areas[idx].remove_occupant(player_id);
        if st.areas[idx].is_empty() {
            let destroyed = st.areas.remove(idx);
            st.listeners.each(|l| l.conversation_area_destroyed(&destroyed));
        } else {
            let updated = &st.areas[idx];
            st.listeners.each(|l| l.conversation_area_updated(updated));
        }
    }
}
