//! Real-time sync engine: subscribe, seed, then apply incremental events.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use notifyhub_core::config::RealtimeConfig;
use notifyhub_core::result::AppResult;
use notifyhub_core::types::id::UserId;
use notifyhub_database::{ChangeEvent, ChangeFeed, NotificationPersistence, NotificationQuerySpec};

use crate::store::NotificationStore;

use super::status::SyncStatus;

/// Why a live feed stopped.
enum FeedEnd {
    Dropped,
    Shutdown,
}

/// Keeps a [`NotificationStore`] current from the recipient's change feed.
///
/// Each connection subscribes first and seeds second, so an event that
/// arrives while the seed is in flight is queued on the feed rather than
/// lost. Everything is merged by id; the store is never replaced wholesale.
/// After a drop the engine backs off, resubscribes, and re-seeds. Events
/// that fall outside the re-seed window during an outage are not
/// recovered.
#[derive(Debug)]
pub struct RealtimeSyncEngine {
    recipient: UserId,
    store: Arc<NotificationStore>,
    persistence: Arc<dyn NotificationPersistence>,
    seed_limit: u32,
    reconnect_initial: Duration,
    reconnect_max: Duration,
    status: watch::Sender<SyncStatus>,
}

impl RealtimeSyncEngine {
    /// Spawn the sync loop for the store's owner.
    pub fn start(
        store: Arc<NotificationStore>,
        persistence: Arc<dyn NotificationPersistence>,
        config: &RealtimeConfig,
    ) -> SyncHandle {
        let (status_tx, status_rx) = watch::channel(SyncStatus::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let engine = Self {
            recipient: store.owner(),
            store,
            persistence,
            seed_limit: config.seed_limit,
            reconnect_initial: Duration::from_millis(config.reconnect_initial_ms.max(1)),
            reconnect_max: Duration::from_millis(
                config.reconnect_max_ms.max(config.reconnect_initial_ms),
            ),
            status: status_tx,
        };

        let task = tokio::spawn(engine.run(shutdown_rx));

        SyncHandle {
            status: status_rx,
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(recipient = %self.recipient, "Notification sync started");
        let mut backoff = self.reconnect_initial;

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.connect().await {
                Ok(feed) => {
                    self.status.send_replace(SyncStatus::Live);
                    backoff = self.reconnect_initial;
                    info!(recipient = %self.recipient, "Notification sync live");

                    if let FeedEnd::Shutdown = self.consume(feed, &mut shutdown).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!(recipient = %self.recipient, error = %e, "Notification sync connect failed");
                }
            }

            self.status.send_replace(SyncStatus::Stale);
            debug!(
                recipient = %self.recipient,
                delay_ms = backoff.as_millis() as u64,
                "Reconnecting change feed"
            );

            tokio::select! {
                _ = time::sleep(backoff) => {}
                _ = shutdown.changed() => break,
            }
            backoff = (backoff * 2).min(self.reconnect_max);
        }

        info!(recipient = %self.recipient, "Notification sync stopped");
    }

    /// Subscribe, then seed with the newest records.
    async fn connect(&self) -> AppResult<ChangeFeed> {
        let feed = self.persistence.subscribe(self.recipient).await?;
        let seed = self
            .persistence
            .query(self.recipient, NotificationQuerySpec::latest(self.seed_limit))
            .await?;

        let seeded = seed.len();
        let changed = self.store.upsert_seed(seed);
        debug!(recipient = %self.recipient, seeded, changed, "Store seeded");
        Ok(feed)
    }

    async fn consume(&self, mut feed: ChangeFeed, shutdown: &mut watch::Receiver<bool>) -> FeedEnd {
        loop {
            tokio::select! {
                item = feed.next() => match item {
                    Some(Ok(event)) => self.apply(event),
                    Some(Err(e)) => {
                        warn!(recipient = %self.recipient, error = %e, "Change feed failed");
                        return FeedEnd::Dropped;
                    }
                    None => {
                        warn!(recipient = %self.recipient, "Change feed ended");
                        return FeedEnd::Dropped;
                    }
                },
                _ = shutdown.changed() => return FeedEnd::Shutdown,
            }
        }
    }

    fn apply(&self, event: ChangeEvent) {
        match event {
            ChangeEvent::Inserted { record } | ChangeEvent::Updated { record } => {
                self.store.upsert(record);
            }
            ChangeEvent::Deleted { id } => {
                self.store.remove(id);
            }
        }
    }
}

/// Controls a running sync loop. Dropping the handle stops the loop.
#[derive(Debug)]
pub struct SyncHandle {
    status: watch::Receiver<SyncStatus>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Current connection state.
    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    /// Receiver that observes every status transition.
    pub fn status_changes(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    /// Stop the loop and wait for the subscription to be released.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
