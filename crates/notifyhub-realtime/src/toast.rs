//! Transient toast feed with repeat suppression.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::trace;

use notifyhub_entity::NotificationRecord;

use crate::store::{NotificationStore, Subscription};

/// Entries kept before stale keys are swept.
const SWEEP_THRESHOLD: usize = 256;

/// Suppresses repeats of the same key within a time window.
#[derive(Debug)]
pub struct EventDeduplicator {
    /// Window duration
    window: Duration,
    /// Last seen time per key
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl EventDeduplicator {
    /// Create a new deduplicator with the given window
    pub fn new(window_ms: u64) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if an event with `key` should be shown, `false` if it
    /// repeats one seen within the window.
    pub fn should_dispatch(&self, key: &str) -> bool {
        let mut map = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        if map.get(key).is_some_and(|last| now.duration_since(*last) < self.window) {
            return false;
        }

        if map.len() >= SWEEP_THRESHOLD {
            let window = self.window;
            map.retain(|_, seen| now.duration_since(*seen) < window);
        }
        map.insert(key.to_string(), now);
        true
    }

    /// Dedup key for a notification: its kind plus the referenced entity,
    /// or the title when it references none.
    pub fn key_for(record: &NotificationRecord) -> String {
        match record.payload.entity_key() {
            Some(entity) => format!("{}:{entity}", record.kind.as_str()),
            None => format!("{}:{}", record.kind.as_str(), record.title),
        }
    }
}

/// Stream of newly arrived unread notifications for transient display.
///
/// Seeded history and already-expired records never toast. Dropping the
/// feed unsubscribes it from the store.
#[derive(Debug)]
pub struct ToastFeed {
    rx: mpsc::UnboundedReceiver<NotificationRecord>,
    _subscription: Subscription,
}

impl ToastFeed {
    /// Attach a toast feed to `store`.
    pub fn new(store: &NotificationStore, window_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let dedup = Arc::new(EventDeduplicator::new(window_ms));

        let subscription = store.subscribe(move |change| {
            if change.seeded {
                return;
            }
            let now = Utc::now();
            for record in change
                .inserted
                .iter()
                .filter(|r| r.is_unread() && !r.is_expired_at(now))
            {
                let key = EventDeduplicator::key_for(record);
                if dedup.should_dispatch(&key) {
                    let _ = tx.send(record.clone());
                } else {
                    trace!(notification_id = %record.id, key = %key, "Toast suppressed");
                }
            }
        });

        Self {
            rx,
            _subscription: subscription,
        }
    }

    /// Wait for the next toast.
    pub async fn next(&mut self) -> Option<NotificationRecord> {
        self.rx.recv().await
    }

    /// Take the next toast if one is already queued.
    pub fn try_next(&mut self) -> Option<NotificationRecord> {
        self.rx.try_recv().ok()
    }
}
