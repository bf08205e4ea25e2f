//! Observer registry for committed project states

use crate::project::ProjectState;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

type Listener = Arc<dyn Fn(&ProjectState) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Listeners called with the new state after every commit, undo, redo and
/// project replacement
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    listeners: Arc<Mutex<Listeners>>,
}

impl ObserverRegistry {
    pub(crate) fn subscribe(&self, listener: Listener) -> Subscription {
        let mut listeners = self.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, listener));
        Subscription {
            id,
            registry: Arc::downgrade(&self.listeners),
            active: true,
        }
    }

    /// Call every listener. The lock is released before any listener runs,
    /// so a listener may subscribe or drop subscriptions.
    pub(crate) fn notify(&self, state: &ProjectState) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(state);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.lock().entries.len()
    }
}

/// Handle returned by [`super::AppState::subscribe`]. Dropping it removes
/// the listener.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Listeners>>,
    active: bool,
}

impl Subscription {
    /// Keep the listener registered for as long as the app state lives
    pub fn detach(mut self) {
        self.active = false;
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Some(listeners) = self.registry.upgrade() {
            listeners.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}
