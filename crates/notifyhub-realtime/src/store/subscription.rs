//! Change listeners and their disposers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use notifyhub_core::types::id::NotificationId;
use notifyhub_entity::NotificationRecord;

/// What one store mutation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreChange {
    /// Records that were not present before.
    pub inserted: Vec<NotificationRecord>,
    /// Records whose content or read state changed.
    pub updated: Vec<NotificationId>,
    /// Records that left the store.
    pub removed: Vec<NotificationId>,
    /// Set when the records came from a backfill of history rather than
    /// arriving live.
    pub seeded: bool,
}

impl StoreChange {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Callback invoked after each store mutation.
pub(crate) type Listener = Arc<dyn Fn(&StoreChange) + Send + Sync>;

/// Registered listeners keyed by subscription id.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: DashMap<u64, Listener>,
}

impl ListenerRegistry {
    pub(crate) fn add(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, listener);
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Call every listener. The map is not locked while callbacks run, so a
    /// callback may subscribe, unsubscribe, or read the store.
    pub(crate) fn emit(&self, change: &StoreChange) {
        let listeners: Vec<Listener> = self
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for listener in listeners {
            listener(change);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Disposer returned by `subscribe`. Dropping it unsubscribes.
#[derive(Debug)]
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    /// Stop receiving changes.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.listeners.remove(&self.id);
        }
    }
}
