//! The notification store: one user's records plus the unread counter.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{trace, warn};

use notifyhub_core::types::id::{NotificationId, UserId};
use notifyhub_entity::{NotificationFilter, NotificationRecord};

use super::query::NotificationQuery;
use super::subscription::{ListenerRegistry, StoreChange, Subscription};

/// A stored record and whether it currently contributes to the unread count.
#[derive(Debug)]
struct Entry {
    record: NotificationRecord,
    counted: bool,
}

/// Outcome of merging one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
    Inserted,
    Updated,
    Unchanged,
}

#[derive(Debug, Default)]
struct StoreState {
    entries: HashMap<NotificationId, Entry>,
    /// Entries with `counted == true`.
    unread: usize,
    /// Earliest expiry among counted entries. May be earlier than the true
    /// minimum after removals; a prune recomputes it.
    next_expiry: Option<DateTime<Utc>>,
    /// Display-ordered copy, rebuilt on the first query after a mutation.
    snapshot: Option<Arc<[NotificationRecord]>>,
}

impl StoreState {
    fn prune_due(&self, now: DateTime<Utc>) -> bool {
        self.next_expiry.is_some_and(|exp| exp <= now)
    }

    fn merge(&mut self, incoming: NotificationRecord, now: DateTime<Utc>) -> Merge {
        let (record, outcome, was_counted) = match self.entries.get(&incoming.id) {
            Some(entry) => {
                let merged = entry.record.merged_with(incoming);
                if merged == entry.record {
                    return Merge::Unchanged;
                }
                (merged, Merge::Updated, entry.counted)
            }
            None => (incoming, Merge::Inserted, false),
        };

        let counted = record.counts_as_unread(now);
        match (was_counted, counted) {
            (false, true) => self.unread += 1,
            (true, false) => self.unread -= 1,
            _ => {}
        }
        if counted {
            if let Some(exp) = record.expires_at {
                self.next_expiry = Some(self.next_expiry.map_or(exp, |cur| cur.min(exp)));
            }
        }

        self.entries.insert(record.id, Entry { record, counted });
        self.snapshot = None;
        outcome
    }

    fn mark_read(&mut self, id: NotificationId, at: DateTime<Utc>) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        if !entry.record.mark_read(at) {
            return false;
        }
        if entry.counted {
            entry.counted = false;
            self.unread -= 1;
        }
        self.snapshot = None;
        true
    }

    fn remove(&mut self, id: NotificationId) -> Option<NotificationRecord> {
        let entry = self.entries.remove(&id)?;
        if entry.counted {
            self.unread -= 1;
        }
        self.snapshot = None;
        Some(entry.record)
    }

    fn prune(&mut self, now: DateTime<Utc>) -> Vec<NotificationId> {
        let expired: Vec<NotificationId> = self
            .entries
            .values()
            .filter(|e| e.record.is_expired_at(now))
            .map(|e| e.record.id)
            .collect();
        for id in &expired {
            self.remove(*id);
        }

        self.next_expiry = self
            .entries
            .values()
            .filter(|e| e.counted)
            .filter_map(|e| e.record.expires_at)
            .min();
        expired
    }

    fn snapshot(&mut self) -> Arc<[NotificationRecord]> {
        if let Some(snapshot) = &self.snapshot {
            return Arc::clone(snapshot);
        }
        let mut records: Vec<NotificationRecord> =
            self.entries.values().map(|e| e.record.clone()).collect();
        records.sort_by(|a, b| a.display_order(b));
        let snapshot: Arc<[NotificationRecord]> = records.into();
        self.snapshot = Some(Arc::clone(&snapshot));
        snapshot
    }
}

/// In-memory notification set for one recipient.
///
/// Every surface (badge, dropdown, full page, toasts) reads from the same
/// store. Mutations are synchronous and cannot fail. Listeners run after
/// the internal lock is released.
///
/// Invariants:
/// - at most one record per id; merging an existing id never duplicates it
/// - read state never moves from read back to unread
/// - the unread count equals the number of unread, unexpired records
/// - only records addressed to the owner are accepted
#[derive(Debug)]
pub struct NotificationStore {
    owner: UserId,
    state: RwLock<StoreState>,
    listeners: Arc<ListenerRegistry>,
}

impl NotificationStore {
    /// Create an empty store for `owner`.
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            state: RwLock::new(StoreState::default()),
            listeners: Arc::new(ListenerRegistry::default()),
        }
    }

    /// The recipient this store belongs to.
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Insert or merge one record by id. Returns `true` if anything changed.
    pub fn upsert(&self, record: NotificationRecord) -> bool {
        self.upsert_many([record]) > 0
    }

    /// Insert or merge a batch. Listeners see a single change. Returns the
    /// number of records that changed.
    pub fn upsert_many(&self, records: impl IntoIterator<Item = NotificationRecord>) -> usize {
        self.merge_batch(records, false)
    }

    /// Merge a backfill of existing records, such as the seed loaded on
    /// (re)connect. The emitted change is flagged `seeded`.
    pub fn upsert_seed(&self, records: impl IntoIterator<Item = NotificationRecord>) -> usize {
        self.merge_batch(records, true)
    }

    fn merge_batch(&self, records: impl IntoIterator<Item = NotificationRecord>, seeded: bool) -> usize {
        let now = Utc::now();
        let mut change = StoreChange {
            seeded,
            ..StoreChange::default()
        };
        {
            let mut state = self.write();
            change.removed = Self::prune_if_due(&mut state, now);

            for record in records {
                if record.recipient_id != self.owner {
                    warn!(
                        notification_id = %record.id,
                        "Ignoring notification addressed to another recipient"
                    );
                    continue;
                }
                let id = record.id;
                match state.merge(record.clone(), now) {
                    Merge::Inserted => change.inserted.push(record),
                    Merge::Updated => change.updated.push(id),
                    Merge::Unchanged => trace!(notification_id = %id, "Merge was a no-op"),
                }
            }
        }

        let changed = change.inserted.len() + change.updated.len();
        self.emit(change);
        changed
    }

    /// Mark one record read. No-op for unknown or already-read ids.
    pub fn mark_read(&self, id: NotificationId) -> bool {
        self.mark_read_at(id, Utc::now())
    }

    /// Mark one record read with an explicit timestamp.
    pub fn mark_read_at(&self, id: NotificationId, at: DateTime<Utc>) -> bool {
        let mut change = StoreChange::default();
        let changed = {
            let mut state = self.write();
            change.removed = Self::prune_if_due(&mut state, at);
            state.mark_read(id, at)
        };
        if changed {
            change.updated.push(id);
        }
        self.emit(change);
        changed
    }

    /// Mark every unread, unexpired record read in one update. Returns the
    /// ids that changed.
    pub fn mark_all_read(&self) -> Vec<NotificationId> {
        self.mark_all_read_at(Utc::now())
    }

    /// Mark every unread, unexpired record read with an explicit timestamp.
    pub fn mark_all_read_at(&self, at: DateTime<Utc>) -> Vec<NotificationId> {
        let mut change = StoreChange::default();
        {
            let mut state = self.write();
            change.removed = Self::prune_if_due(&mut state, at);
            let targets: Vec<NotificationId> = state
                .entries
                .values()
                .filter(|e| e.record.counts_as_unread(at))
                .map(|e| e.record.id)
                .collect();
            for id in targets {
                if state.mark_read(id, at) {
                    change.updated.push(id);
                }
            }
        }
        let updated = change.updated.clone();
        self.emit(change);
        updated
    }

    /// Remove a record.
    pub fn remove(&self, id: NotificationId) -> Option<NotificationRecord> {
        let removed = self.write().remove(id);
        if removed.is_some() {
            self.emit(StoreChange {
                removed: vec![id],
                ..StoreChange::default()
            });
        }
        removed
    }

    /// Drop every record whose expiry is at or before `now`. Returns how
    /// many were removed.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let removed = self.write().prune(now);
        let count = removed.len();
        self.emit(StoreChange {
            removed,
            ..StoreChange::default()
        });
        count
    }

    /// Look up one record.
    pub fn get(&self, id: NotificationId) -> Option<NotificationRecord> {
        self.read().entries.get(&id).map(|e| e.record.clone())
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Records matching `filter`, newest first.
    pub fn query(&self, filter: NotificationFilter) -> NotificationQuery {
        let snapshot = self.write().snapshot();
        NotificationQuery::new(snapshot, filter, Utc::now())
    }

    /// Unread, unexpired records.
    pub fn unread_count(&self) -> usize {
        let now = Utc::now();
        {
            let state = self.read();
            if !state.prune_due(now) {
                return state.unread;
            }
        }
        self.prune_expired(now);
        self.read().unread
    }

    /// Register a change listener. Dropping the returned handle unsubscribes.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoreChange) + Send + Sync + 'static,
    {
        self.listeners.add(Arc::new(listener))
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn prune_if_due(state: &mut StoreState, now: DateTime<Utc>) -> Vec<NotificationId> {
        if state.prune_due(now) {
            state.prune(now)
        } else {
            Vec::new()
        }
    }

    fn emit(&self, change: StoreChange) {
        if !change.is_empty() {
            self.listeners.emit(&change);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Duration;

    use notifyhub_entity::notification::classifier::classify;
    use notifyhub_entity::{NotificationCategory, NotificationPayload, RawType, ReadState};

    use super::*;

    fn record(owner: UserId, created_at: DateTime<Utc>) -> NotificationRecord {
        let c = classify(Some(RawType::Info), Some(NotificationCategory::Message));
        NotificationRecord {
            id: NotificationId::new(),
            recipient_id: owner,
            title: "t".to_string(),
            message: "m".to_string(),
            raw_type: RawType::Info,
            category: Some(NotificationCategory::Message),
            kind: c.kind,
            priority: c.priority,
            action_url: None,
            action_label: None,
            payload: NotificationPayload::None,
            created_at,
            expires_at: None,
            read_state: ReadState::Unread,
            read_at: None,
        }
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let owner = UserId::new();
        let store = NotificationStore::new(owner);
        let r = record(owner, Utc::now());

        assert!(store.upsert(r.clone()));
        let before: Vec<_> = store.query(NotificationFilter::default()).to_vec();
        assert!(!store.upsert(r));

        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.query(NotificationFilter::default()).to_vec(), before);
    }

    #[test]
    fn test_query_orders_late_arrivals_chronologically() {
        let owner = UserId::new();
        let store = NotificationStore::new(owner);
        let now = Utc::now();
        let t1 = record(owner, now - Duration::minutes(3));
        let t2 = record(owner, now - Duration::minutes(2));
        let t3 = record(owner, now - Duration::minutes(1));

        store.upsert(t2.clone());
        store.upsert(t3.clone());
        store.upsert(t1.clone());

        let ids: Vec<_> = store
            .query(NotificationFilter::default())
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![t3.id, t2.id, t1.id]);
    }

    #[test]
    fn test_equal_timestamps_break_ties_by_id() {
        let owner = UserId::new();
        let store = NotificationStore::new(owner);
        let now = Utc::now();
        let a = record(owner, now);
        let b = record(owner, now);
        store.upsert_many([a.clone(), b.clone()]);

        let ids: Vec<_> = store
            .query(NotificationFilter::default())
            .iter()
            .map(|r| r.id)
            .collect();
        let mut expected = vec![a.id, b.id];
        expected.sort_by(|x, y| y.cmp(x));
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_read_state_never_regresses() {
        let owner = UserId::new();
        let store = NotificationStore::new(owner);
        let r = record(owner, Utc::now());
        store.upsert(r.clone());

        assert!(store.mark_read(r.id));
        assert!(!store.mark_read(r.id));
        assert!(store.mark_all_read().is_empty());

        // A stale unread copy from the feed must not flip it back.
        store.upsert(r.clone());
        assert_eq!(store.get(r.id).unwrap().read_state, ReadState::Read);
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_mark_read_unknown_id_is_noop() {
        let store = NotificationStore::new(UserId::new());
        assert!(!store.mark_read(NotificationId::new()));
    }

    #[test]
    fn test_mark_all_read_skips_expired() {
        let owner = UserId::new();
        let store = NotificationStore::new(owner);
        let now = Utc::now();
        let live = record(owner, now - Duration::hours(1));
        let mut stale = record(owner, now - Duration::hours(2));
        stale.expires_at = Some(now - Duration::minutes(30));
        store.upsert_many([live.clone(), stale.clone()]);

        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.mark_all_read(), vec![live.id]);
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_unread_count_drops_when_record_expires() {
        let owner = UserId::new();
        let store = NotificationStore::new(owner);
        let now = Utc::now();
        let mut soon = record(owner, now);
        soon.expires_at = Some(now + Duration::milliseconds(20));
        store.upsert(soon);
        assert_eq!(store.unread_count(), 1);

        std::thread::sleep(std::time::Duration::from_millis(40));
        assert_eq!(store.unread_count(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_foreign_records_rejected() {
        let store = NotificationStore::new(UserId::new());
        assert!(!store.upsert(record(UserId::new(), Utc::now())));
        assert!(store.is_empty());
    }

    #[test]
    fn test_query_is_restartable_and_limited() {
        let owner = UserId::new();
        let store = NotificationStore::new(owner);
        let now = Utc::now();
        for i in 0..5 {
            store.upsert(record(owner, now - Duration::minutes(i)));
        }

        let query = store.query(NotificationFilter::default().with_limit(3));
        assert_eq!(query.count(), 3);
        assert_eq!(query.iter().count(), 3);
        assert_eq!(query.to_vec(), query.iter().cloned().collect::<Vec<_>>());
    }

    #[test]
    fn test_listeners_see_one_change_per_batch_and_unsubscribe() {
        let owner = UserId::new();
        let store = NotificationStore::new(owner);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let subscription = store.subscribe(move |change| {
            sink.lock().unwrap().push(change.inserted.len());
        });

        let now = Utc::now();
        store.upsert_many([record(owner, now), record(owner, now)]);
        assert_eq!(*seen.lock().unwrap(), vec![2]);

        subscription.unsubscribe();
        assert_eq!(store.listener_count(), 0);
        store.upsert(record(owner, now));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_listener_can_read_store() {
        let owner = UserId::new();
        let store = Arc::new(NotificationStore::new(owner));
        let counts = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&store);
        let sink = Arc::clone(&counts);
        let _subscription = store.subscribe(move |_| {
            if let Some(store) = weak.upgrade() {
                sink.lock().unwrap().push(store.unread_count());
            }
        });

        store.upsert(record(owner, Utc::now()));
        assert_eq!(*counts.lock().unwrap(), vec![1]);
    }
}
