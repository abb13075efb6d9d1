//! Per-login notification session.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info};

use notifyhub_core::config::RealtimeConfig;
use notifyhub_core::error::AppError;
use notifyhub_core::result::AppResult;
use notifyhub_core::traits::{IdentityProvider, Navigator};
use notifyhub_core::types::id::{NotificationId, UserId};
use notifyhub_database::NotificationPersistence;
use notifyhub_entity::{NotificationFilter, NotificationRecord};
use notifyhub_service::{BulkDispatchReport, NotificationDispatcher, NotificationDraft};

use crate::read_state::{ActionTarget, PendingSync, ReadStateSynchronizer};
use crate::store::{NotificationQuery, NotificationStore, StoreChange, Subscription};
use crate::sync::{RealtimeSyncEngine, SyncHandle, SyncStatus};
use crate::toast::ToastFeed;

/// Shared collaborators a session is built from.
#[derive(Debug, Clone)]
pub struct SessionDeps {
    /// Persistence backend and change feed.
    pub persistence: Arc<dyn NotificationPersistence>,
    /// Writer-side facade.
    pub dispatcher: NotificationDispatcher,
}

/// Everything the UI needs for one signed-in user.
///
/// Built at login and torn down with [`end`](Self::end) at logout. Each
/// session owns its own store; nothing is shared between users. Must be
/// started inside a Tokio runtime.
#[derive(Debug)]
pub struct NotificationSession {
    recipient: UserId,
    store: Arc<NotificationStore>,
    sync: SyncHandle,
    read_state: ReadStateSynchronizer,
    deps: SessionDeps,
    toast_window_ms: u64,
    pruner_shutdown: watch::Sender<bool>,
    pruner: JoinHandle<()>,
}

impl NotificationSession {
    /// Start a session for the current user.
    ///
    /// Returns `None` when nobody is signed in; no work is done in that case.
    pub fn start(
        identity: &dyn IdentityProvider,
        deps: SessionDeps,
        config: &RealtimeConfig,
    ) -> Option<Self> {
        let recipient = identity.current_user()?;

        let store = Arc::new(NotificationStore::new(recipient));
        let sync = RealtimeSyncEngine::start(Arc::clone(&store), Arc::clone(&deps.persistence), config);
        let read_state = ReadStateSynchronizer::new(Arc::clone(&store), Arc::clone(&deps.persistence));

        let (pruner_shutdown, shutdown_rx) = watch::channel(false);
        let pruner = tokio::spawn(run_pruner(
            Arc::clone(&store),
            Duration::from_secs(config.prune_interval_seconds.max(1)),
            shutdown_rx,
        ));

        info!(recipient = %recipient, "Notification session started");

        Some(Self {
            recipient,
            store,
            sync,
            read_state,
            deps,
            toast_window_ms: config.toast_dedup_window_ms,
            pruner_shutdown,
            pruner,
        })
    }

    /// The signed-in user.
    pub fn recipient(&self) -> UserId {
        self.recipient
    }

    /// Badge count.
    pub fn unread_count(&self) -> usize {
        self.store.unread_count()
    }

    /// Records for a dropdown or page, newest first.
    pub fn visible_notifications(&self, filter: NotificationFilter) -> NotificationQuery {
        self.store.query(filter)
    }

    /// State of the change feed.
    pub fn sync_status(&self) -> SyncStatus {
        self.sync.status()
    }

    /// Receiver observing change-feed state transitions.
    pub fn sync_status_changes(&self) -> watch::Receiver<SyncStatus> {
        self.sync.status_changes()
    }

    /// Create a notification. A draft without a recipient is addressed to
    /// the signed-in user. Records for this user appear in the store
    /// without waiting for the change feed.
    pub async fn notify(&self, mut draft: NotificationDraft) -> AppResult<NotificationRecord> {
        draft.recipient_id.get_or_insert(self.recipient);
        let record = self.deps.dispatcher.notify(draft).await?;
        if record.recipient_id == self.recipient {
            self.store.upsert(record.clone());
        }
        Ok(record)
    }

    /// Create one notification per recipient.
    pub async fn notify_many(
        &self,
        recipients: &[UserId],
        draft: NotificationDraft,
    ) -> AppResult<BulkDispatchReport> {
        let report = self.deps.dispatcher.notify_many(recipients, draft).await?;
        self.store.upsert_many(
            report
                .delivered
                .iter()
                .filter(|r| r.recipient_id == self.recipient)
                .cloned(),
        );
        Ok(report)
    }

    /// Mark one notification read.
    pub fn mark_read(&self, id: NotificationId) -> PendingSync {
        self.read_state.mark_read(id)
    }

    /// Mark everything read.
    pub fn mark_all_read(&self) -> PendingSync {
        self.read_state.mark_all_read()
    }

    /// Delete a notification for this user.
    ///
    /// The record leaves the store immediately. If the delete cannot be
    /// persisted the error is returned and the record comes back with the
    /// next re-seed.
    pub async fn delete(&self, id: NotificationId) -> AppResult<bool> {
        let local = self.store.remove(id).is_some();
        let persisted = self
            .deps
            .persistence
            .delete(self.recipient, id)
            .await
            .map_err(|e| {
                AppError::with_source(e.kind, format!("Failed to delete notification {id}"), e)
            })?;
        Ok(local || persisted)
    }

    /// Handle a click on a notification.
    pub fn open(&self, id: NotificationId, navigator: &dyn Navigator) -> Option<ActionTarget> {
        self.read_state.open(id, navigator)
    }

    /// Re-render hook. Dropping the returned handle unsubscribes.
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoreChange) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Toast feed for newly arriving notifications.
    pub fn toasts(&self) -> ToastFeed {
        ToastFeed::new(&self.store, self.toast_window_ms)
    }

    /// Tear the session down: stop the change feed and background pruning.
    pub async fn end(self) {
        let Self {
            recipient,
            sync,
            pruner_shutdown,
            pruner,
            ..
        } = self;

        sync.shutdown().await;
        let _ = pruner_shutdown.send(true);
        let _ = pruner.await;
        info!(recipient = %recipient, "Notification session ended");
    }
}

async fn run_pruner(store: Arc<NotificationStore>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = time::interval(period);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.prune_expired(Utc::now());
                if removed > 0 {
                    debug!(recipient = %store.owner(), removed, "Pruned expired notifications");
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}
