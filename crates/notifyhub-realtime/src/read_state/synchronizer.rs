//! Read-state synchronizer: optimistic local change, background persistence.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use notifyhub_core::traits::Navigator;
use notifyhub_core::types::id::NotificationId;
use notifyhub_database::NotificationPersistence;

use crate::store::NotificationStore;

use super::action::{ActionTarget, resolve_action};
use super::pending::{PendingSync, SyncOutcome};

/// Applies read-state changes to the store immediately, then persists
/// them on a background task.
///
/// A failed write is logged and the local state is kept: a notification
/// never flips back to unread because persistence was briefly unavailable.
/// Must be used inside a Tokio runtime.
#[derive(Debug, Clone)]
pub struct ReadStateSynchronizer {
    store: Arc<NotificationStore>,
    persistence: Arc<dyn NotificationPersistence>,
}

impl ReadStateSynchronizer {
    /// Create a synchronizer for the store's owner.
    pub fn new(store: Arc<NotificationStore>, persistence: Arc<dyn NotificationPersistence>) -> Self {
        Self { store, persistence }
    }

    /// Mark one notification read.
    pub fn mark_read(&self, id: NotificationId) -> PendingSync {
        let at = Utc::now();
        if !self.store.mark_read_at(id, at) {
            return PendingSync::ready(SyncOutcome::Unchanged);
        }

        let persistence = Arc::clone(&self.persistence);
        let recipient = self.store.owner();
        PendingSync::spawned(tokio::spawn(async move {
            match persistence.mark_read(recipient, id, at).await {
                Ok(()) => SyncOutcome::Acknowledged,
                Err(e) => {
                    warn!(notification_id = %id, error = %e, "Read state kept locally, persistence failed");
                    SyncOutcome::LocalOnly
                }
            }
        }))
    }

    /// Mark every unread, unexpired notification read.
    ///
    /// Only the ids changed locally are persisted, so records that reach
    /// the server after the click stay unread.
    pub fn mark_all_read(&self) -> PendingSync {
        let at = Utc::now();
        let changed = self.store.mark_all_read_at(at);
        if changed.is_empty() {
            return PendingSync::ready(SyncOutcome::Unchanged);
        }

        let persistence = Arc::clone(&self.persistence);
        let recipient = self.store.owner();
        PendingSync::spawned(tokio::spawn(async move {
            match persistence.mark_read_many(recipient, &changed, at).await {
                Ok(rows) => {
                    debug!(recipient = %recipient, local = changed.len(), rows, "Mark all read persisted");
                    SyncOutcome::Acknowledged
                }
                Err(e) => {
                    warn!(recipient = %recipient, error = %e, "Read state kept locally, persistence failed");
                    SyncOutcome::LocalOnly
                }
            }
        }))
    }

    /// Handle a click: mark the notification read, then resolve and
    /// perform its action.
    ///
    /// Returns `None` for unknown ids and for notifications without any
    /// action. The read-state write continues in the background.
    pub fn open(&self, id: NotificationId, navigator: &dyn Navigator) -> Option<ActionTarget> {
        let record = self.store.get(id)?;
        drop(self.mark_read(id));

        let target = resolve_action(record.action_url.as_deref(), &record.payload)?;
        target.perform(navigator);
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use notifyhub_core::error::AppError;
    use notifyhub_core::result::AppResult;
    use notifyhub_core::types::id::UserId;
    use notifyhub_database::{ChangeFeed, MemoryNotificationRepository, NotificationQuerySpec};
    use notifyhub_entity::notification::classifier::classify;
    use notifyhub_entity::{
        DigestWatermark, NotificationPayload, NotificationPreference, NotificationRecord, RawType,
        ReadState,
    };

    use super::*;

    /// Backend whose read-state writes always fail.
    #[derive(Debug, Default)]
    struct ReadOnlyBackend {
        inner: MemoryNotificationRepository,
    }

    #[async_trait]
    impl NotificationPersistence for ReadOnlyBackend {
        async fn insert(&self, record: &NotificationRecord) -> AppResult<NotificationId> {
            self.inner.insert(record).await
        }

        async fn insert_many(&self, records: &[NotificationRecord]) -> Vec<AppResult<NotificationId>> {
            self.inner.insert_many(records).await
        }

        async fn mark_read(&self, _recipient: UserId, _id: NotificationId, _at: DateTime<Utc>) -> AppResult<()> {
            Err(AppError::persistence("database is read-only"))
        }

        async fn mark_all_read(&self, _recipient: UserId, _at: DateTime<Utc>) -> AppResult<u64> {
            Err(AppError::persistence("database is read-only"))
        }

        async fn mark_read_many(
            &self,
            _recipient: UserId,
            _ids: &[NotificationId],
            _at: DateTime<Utc>,
        ) -> AppResult<u64> {
            Err(AppError::persistence("database is read-only"))
        }

        async fn delete(&self, recipient: UserId, id: NotificationId) -> AppResult<bool> {
            self.inner.delete(recipient, id).await
        }

        async fn query(&self, recipient: UserId, spec: NotificationQuerySpec) -> AppResult<Vec<NotificationRecord>> {
            self.inner.query(recipient, spec).await
        }

        async fn subscribe(&self, recipient: UserId) -> AppResult<ChangeFeed> {
            self.inner.subscribe(recipient).await
        }

        async fn preferences(&self, user: UserId) -> AppResult<Option<NotificationPreference>> {
            self.inner.preferences(user).await
        }

        async fn digest_watermark(&self, recipient: UserId) -> AppResult<Option<DigestWatermark>> {
            self.inner.digest_watermark(recipient).await
        }

        async fn save_digest_watermark(&self, mark: &DigestWatermark) -> AppResult<()> {
            self.inner.save_digest_watermark(mark).await
        }

        async fn delete_expired(&self, now: DateTime<Utc>, created_before: DateTime<Utc>) -> AppResult<u64> {
            self.inner.delete_expired(now, created_before).await
        }

        async fn trim_per_user(&self, limit: i64) -> AppResult<u64> {
            self.inner.trim_per_user(limit).await
        }
    }

    #[derive(Debug, Default)]
    struct RecordingNavigator {
        calls: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str, tab: Option<&str>) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("navigate {path} {}", tab.unwrap_or("-")));
        }

        fn redirect(&self, path: &str) {
            self.calls.lock().unwrap().push(format!("redirect {path}"));
        }

        fn open_external(&self, url: &str) {
            self.calls.lock().unwrap().push(format!("external {url}"));
        }
    }

    fn record(owner: UserId, action_url: Option<&str>) -> NotificationRecord {
        let c = classify(Some(RawType::Success), None);
        NotificationRecord {
            id: NotificationId::new(),
            recipient_id: owner,
            title: "t".to_string(),
            message: "m".to_string(),
            raw_type: RawType::Success,
            category: None,
            kind: c.kind,
            priority: c.priority,
            action_url: action_url.map(str::to_string),
            action_label: None,
            payload: NotificationPayload::None,
            created_at: Utc::now(),
            expires_at: None,
            read_state: ReadState::Unread,
            read_at: None,
        }
    }

    async fn setup() -> (ReadStateSynchronizer, Arc<NotificationStore>, Arc<MemoryNotificationRepository>, UserId) {
        let owner = UserId::new();
        let store = Arc::new(NotificationStore::new(owner));
        let repo = Arc::new(MemoryNotificationRepository::default());
        let sync = ReadStateSynchronizer::new(Arc::clone(&store), repo.clone());
        (sync, store, repo, owner)
    }

    #[tokio::test]
    async fn test_mark_read_is_optimistic_and_persisted() {
        let (sync, store, repo, owner) = setup().await;
        let r = record(owner, None);
        repo.insert(&r).await.unwrap();
        store.upsert(r.clone());

        let pending = sync.mark_read(r.id);
        assert_eq!(store.unread_count(), 0);
        assert_eq!(pending.await, SyncOutcome::Acknowledged);

        let persisted = repo.query(owner, NotificationQuerySpec::default()).await.unwrap();
        assert_eq!(persisted[0].read_state, ReadState::Read);

        assert_eq!(sync.mark_read(r.id).await, SyncOutcome::Unchanged);
        assert_eq!(sync.mark_all_read().await, SyncOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_mark_all_read_persists_only_local_ids() {
        let (sync, store, repo, owner) = setup().await;
        let seen = record(owner, None);
        repo.insert(&seen).await.unwrap();
        store.upsert(seen.clone());

        let pending = sync.mark_all_read();
        // Reaches the server after the click, before the write lands.
        let late = record(owner, None);
        repo.insert(&late).await.unwrap();
        assert_eq!(pending.await, SyncOutcome::Acknowledged);

        let persisted = repo.query(owner, NotificationQuerySpec::default()).await.unwrap();
        let state = |id: NotificationId| persisted.iter().find(|r| r.id == id).map(|r| r.read_state);
        assert_eq!(state(seen.id), Some(ReadState::Read));
        assert_eq!(state(late.id), Some(ReadState::Unread));

        store.upsert(late.clone());
        assert_eq!(store.unread_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_local_read_state() {
        let owner = UserId::new();
        let store = Arc::new(NotificationStore::new(owner));
        let backend = Arc::new(ReadOnlyBackend::default());
        let sync = ReadStateSynchronizer::new(Arc::clone(&store), backend.clone());

        let first = record(owner, None);
        let second = record(owner, None);
        backend.insert(&first).await.unwrap();
        backend.insert(&second).await.unwrap();
        store.upsert_many([first.clone(), second.clone()]);

        assert_eq!(sync.mark_read(first.id).await, SyncOutcome::LocalOnly);
        assert_eq!(store.get(first.id).map(|r| r.read_state), Some(ReadState::Read));
        assert_eq!(store.unread_count(), 1);

        assert_eq!(sync.mark_all_read().await, SyncOutcome::LocalOnly);
        assert_eq!(store.get(second.id).map(|r| r.read_state), Some(ReadState::Read));
        assert_eq!(store.unread_count(), 0);

        let persisted = backend.query(owner, NotificationQuerySpec::default()).await.unwrap();
        assert!(persisted.iter().all(|r| r.read_state == ReadState::Unread));
    }

    #[tokio::test]
    async fn test_open_marks_read_and_navigates() {
        let (sync, store, _repo, owner) = setup().await;
        let navigator = RecordingNavigator::default();
        let booking = record(owner, Some("/dashboard?tab=upcoming"));
        let meeting = record(owner, Some("https://meet.example.com/x"));
        store.upsert_many([booking.clone(), meeting.clone()]);

        assert_eq!(
            sync.open(booking.id, &navigator),
            Some(ActionTarget::InApp {
                path: "/dashboard".to_string(),
                tab: "upcoming".to_string()
            })
        );
        sync.open(meeting.id, &navigator);

        assert_eq!(store.unread_count(), 0);
        assert_eq!(
            *navigator.calls.lock().unwrap(),
            vec![
                "navigate /dashboard upcoming".to_string(),
                "external https://meet.example.com/x".to_string()
            ]
        );
        assert_eq!(sync.open(NotificationId::new(), &navigator), None);
    }
}
