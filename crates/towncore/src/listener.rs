//! Subscription registry and synchronous event fan-out.

use std::sync::Arc;

use crate::area::ConversationArea;
use crate::player::Player;

/// Subscriber to one town's lifecycle events.
///
/// Callbacks run synchronously on the mutating task while the controller
/// lock is held: keep them cheap, and never call back into the controller
/// from inside one (behavior is undefined if you do).
pub trait TownListener: Send + Sync {
    /// A player joined the town.
    fn player_joined(&self, _player: &Player) {}

    /// A player's location was committed. Fires once per location update,
    /// after any area events, including for no-op movements.
    fn player_moved(&self, _player: &Player) {}

    /// A player's session was destroyed and the player removed.
    fn player_disconnected(&self, _player: &Player) {}

    /// An area's occupant list changed and the area still exists.
    fn conversation_area_updated(&self, _area: &ConversationArea) {}

    /// An area went from occupied to empty and was removed.
    fn conversation_area_destroyed(&self, _area: &ConversationArea) {}

    /// The town is being torn down. Fired exactly once per controller.
    fn town_destroyed(&self) {}
}

/// Handles are compared by allocation identity, so the same `Arc` can be
/// added once and removed reliably.
fn same_handle(a: &Arc<dyn TownListener>, b: &Arc<dyn TownListener>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

#[derive(Default)]
pub struct ListenerSet {
    listeners: Vec<Arc<dyn TownListener>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: adding a handle already present is a no-op.
    pub fn add(&mut self, listener: Arc<dyn TownListener>) {
        if !self.listeners.iter().any(|l| same_handle(l, &listener)) {
            self.listeners.push(listener);
        }
    }

    /// Removal takes effect before the next mutation's fan-out begins.
    pub fn remove(&mut self, listener: &Arc<dyn TownListener>) {
        self.listeners.retain(|l| !same_handle(l, listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn each(&self, mut f: impl FnMut(&dyn TownListener)) {
        for l in &self.listeners {
            f(l.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl TownListener for Counter {
        fn town_destroyed(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn add_is_idempotent_and_remove_is_by_identity() {
        let mut set = ListenerSet::new();
        let a: Arc<Counter> = Arc::new(Counter::default());
        let b: Arc<Counter> = Arc::new(Counter::default());
        let a_dyn: Arc<dyn TownListener> = a.clone();
        let b_dyn: Arc<dyn TownListener> = b.clone();

        set.add(a_dyn.clone());
        set.add(a_dyn.clone());
        set.add(b_dyn.clone());
        assert_eq!(set.len(), 2);

        set.each(|l| l.town_destroyed());
        assert_eq!(a.0.load(Ordering::SeqCst), 1);
        assert_eq!(b.0.load(Ordering::SeqCst), 1);

        set.remove(&a_dyn);
        assert_eq!(set.len(), 1);
        set.each(|l| l.town_destroyed());
        assert_eq!(a.0.load(Ordering::SeqCst), 1);
        assert_eq!(b.0.load(Ordering::SeqCst), 2);

        // Removing a handle that was never added is fine.
        set.remove(&a_dyn);
        assert_eq!(set.len(), 1);
    }
}
