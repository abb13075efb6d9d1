//! In-memory notification repository with a broadcast change feed.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use notifyhub_core::error::AppError;
use notifyhub_core::result::AppResult;
use notifyhub_core::types::id::{NotificationId, UserId};
use notifyhub_entity::{DigestWatermark, NotificationPreference, NotificationRecord, Opportunity};

use crate::traits::{
    ChangeEvent, ChangeFeed, DigestDirectory, DigestSubscriber, NotificationPersistence,
    NotificationQuerySpec, RecipientDirectory,
};

/// Process-local implementation of the persistence API.
#[derive(Debug)]
pub struct MemoryNotificationRepository {
    /// Notification id → record
    records: RwLock<HashMap<NotificationId, NotificationRecord>>,
    /// Recipient → change feed sender
    feeds: RwLock<HashMap<UserId, broadcast::Sender<ChangeEvent>>>,
    preferences: RwLock<HashMap<UserId, NotificationPreference>>,
    watermarks: RwLock<HashMap<UserId, DigestWatermark>>,
    /// Ordered so digest runs visit subscribers deterministically.
    recipients: RwLock<BTreeMap<UserId, DigestSubscriber>>,
    opportunities: RwLock<Vec<Opportunity>>,
    /// Buffer size for change feeds
    buffer_size: usize,
}

impl MemoryNotificationRepository {
    /// Create a new repository whose feeds buffer `buffer_size` events.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            feeds: RwLock::new(HashMap::new()),
            preferences: RwLock::new(HashMap::new()),
            watermarks: RwLock::new(HashMap::new()),
            recipients: RwLock::new(BTreeMap::new()),
            opportunities: RwLock::new(Vec::new()),
            buffer_size,
        }
    }

    /// Register a user in the recipient directory.
    pub async fn register_recipient(&self, user_id: UserId, email: &str, skills: &[&str]) {
        self.recipients.write().await.insert(
            user_id,
            DigestSubscriber {
                user_id,
                email: email.to_string(),
                skills: skills.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    /// Publish an open opportunity.
    pub async fn add_opportunity(&self, opportunity: Opportunity) {
        self.opportunities.write().await.push(opportunity);
    }

    /// Save a user's channel preferences.
    pub async fn set_preferences(&self, prefs: NotificationPreference) {
        self.preferences.write().await.insert(prefs.user_id, prefs);
    }

    /// Number of stored records across all recipients.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Drop every open change feed. Subscribers see their stream end.
    pub async fn close_feeds(&self) {
        self.feeds.write().await.clear();
    }

    async fn publish(&self, recipient: UserId, event: ChangeEvent) {
        let feeds = self.feeds.read().await;
        if let Some(tx) = feeds.get(&recipient) {
            let _ = tx.send(event);
        }
    }
}

impl Default for MemoryNotificationRepository {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl NotificationPersistence for MemoryNotificationRepository {
    async fn insert(&self, record: &NotificationRecord) -> AppResult<NotificationId> {
        {
            let mut records = self.records.write().await;
            if records.contains_key(&record.id) {
                return Ok(record.id);
            }
            records.insert(record.id, record.clone());
        }

        self.publish(
            record.recipient_id,
            ChangeEvent::Inserted {
                record: record.clone(),
            },
        )
        .await;
        Ok(record.id)
    }

    async fn insert_many(&self, records: &[NotificationRecord]) -> Vec<AppResult<NotificationId>> {
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            results.push(self.insert(record).await);
        }
        results
    }

    async fn mark_read(
        &self,
        recipient: UserId,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let updated = {
            let mut records = self.records.write().await;
            match records.get_mut(&id) {
                Some(record) if record.recipient_id == recipient => {
                    record.mark_read(at).then(|| record.clone())
                }
                _ => None,
            }
        };

        if let Some(record) = updated {
            self.publish(recipient, ChangeEvent::Updated { record }).await;
        }
        Ok(())
    }

    async fn mark_all_read(&self, recipient: UserId, at: DateTime<Utc>) -> AppResult<u64> {
        let updated: Vec<NotificationRecord> = {
            let mut records = self.records.write().await;
            records
                .values_mut()
                .filter(|r| r.recipient_id == recipient)
                .filter_map(|r| r.mark_read(at).then(|| r.clone()))
                .collect()
        };

        let count = updated.len() as u64;
        for record in updated {
            self.publish(recipient, ChangeEvent::Updated { record }).await;
        }
        Ok(count)
    }

    async fn mark_read_many(
        &self,
        recipient: UserId,
        ids: &[NotificationId],
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let updated: Vec<NotificationRecord> = {
            let mut records = self.records.write().await;
            let mut updated = Vec::new();
            for id in ids {
                if let Some(record) = records.get_mut(id) {
                    if record.recipient_id == recipient && record.mark_read(at) {
                        updated.push(record.clone());
                    }
                }
            }
            updated
        };

        let count = updated.len() as u64;
        for record in updated {
            self.publish(recipient, ChangeEvent::Updated { record }).await;
        }
        Ok(count)
    }

    async fn delete(&self, recipient: UserId, id: NotificationId) -> AppResult<bool> {
        let removed = {
            let mut records = self.records.write().await;
            match records.get(&id) {
                Some(record) if record.recipient_id == recipient => records.remove(&id).is_some(),
                _ => false,
            }
        };

        if removed {
            self.publish(recipient, ChangeEvent::Deleted { id }).await;
        }
        Ok(removed)
    }

    async fn query(
        &self,
        recipient: UserId,
        spec: NotificationQuerySpec,
    ) -> AppResult<Vec<NotificationRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<NotificationRecord> = records
            .values()
            .filter(|r| r.recipient_id == recipient && spec.contains(r.created_at))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.display_order(b));
        if let Some(limit) = spec.limit {
            matching.truncate(limit as usize);
        }
        Ok(matching)
    }

    async fn subscribe(&self, recipient: UserId) -> AppResult<ChangeFeed> {
        let rx = {
            let mut feeds = self.feeds.write().await;
            feeds
                .entry(recipient)
                .or_insert_with(|| broadcast::channel(self.buffer_size).0)
                .subscribe()
        };

        let feed = futures::stream::unfold(Some(rx), |state| async move {
            let mut rx = state?;
            match rx.recv().await {
                Ok(event) => Some((Ok(event), Some(rx))),
                Err(RecvError::Lagged(skipped)) => Some((
                    Err(AppError::transport(format!(
                        "Change feed lagged, {skipped} events dropped"
                    ))),
                    None,
                )),
                Err(RecvError::Closed) => None,
            }
        });

        Ok(feed.boxed())
    }

    async fn preferences(&self, user: UserId) -> AppResult<Option<NotificationPreference>> {
        Ok(self.preferences.read().await.get(&user).cloned())
    }

    async fn digest_watermark(&self, recipient: UserId) -> AppResult<Option<DigestWatermark>> {
        Ok(self.watermarks.read().await.get(&recipient).cloned())
    }

    async fn save_digest_watermark(&self, mark: &DigestWatermark) -> AppResult<()> {
        let mut watermarks = self.watermarks.write().await;
        match watermarks.get(&mark.recipient_id) {
            Some(existing) if existing.digested_through > mark.digested_through => {}
            _ => {
                watermarks.insert(mark.recipient_id, mark.clone());
            }
        }
        Ok(())
    }

    async fn delete_expired(
        &self,
        now: DateTime<Utc>,
        created_before: DateTime<Utc>,
    ) -> AppResult<u64> {
        let removed: Vec<(UserId, NotificationId)> = {
            let mut records = self.records.write().await;
            let doomed: Vec<(UserId, NotificationId)> = records
                .values()
                .filter(|r| r.is_expired_at(now) || r.created_at < created_before)
                .map(|r| (r.recipient_id, r.id))
                .collect();
            for (_, id) in &doomed {
                records.remove(id);
            }
            doomed
        };

        let count = removed.len() as u64;
        for (recipient, id) in removed {
            self.publish(recipient, ChangeEvent::Deleted { id }).await;
        }
        Ok(count)
    }

    async fn trim_per_user(&self, limit: i64) -> AppResult<u64> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let removed: Vec<(UserId, NotificationId)> = {
            let mut records = self.records.write().await;
            let mut by_user: HashMap<UserId, Vec<&NotificationRecord>> = HashMap::new();
            for record in records.values() {
                by_user.entry(record.recipient_id).or_default().push(record);
            }

            let doomed: Vec<(UserId, NotificationId)> = by_user
                .into_values()
                .flat_map(|mut list| {
                    list.sort_by(|a, b| a.display_order(b));
                    list.into_iter()
                        .skip(limit)
                        .map(|r| (r.recipient_id, r.id))
                        .collect::<Vec<_>>()
                })
                .collect();
            for (_, id) in &doomed {
                records.remove(id);
            }
            doomed
        };

        let count = removed.len() as u64;
        for (recipient, id) in removed {
            self.publish(recipient, ChangeEvent::Deleted { id }).await;
        }
        Ok(count)
    }
}

#[async_trait]
impl DigestDirectory for MemoryNotificationRepository {
    async fn digest_subscribers(&self) -> AppResult<Vec<DigestSubscriber>> {
        Ok(self.recipients.read().await.values().cloned().collect())
    }

    async fn open_opportunities(&self, since: DateTime<Utc>) -> AppResult<Vec<Opportunity>> {
        Ok(self
            .opportunities
            .read()
            .await
            .iter()
            .filter(|o| o.posted_at >= since)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RecipientDirectory for MemoryNotificationRepository {
    async fn email_for(&self, user: UserId) -> AppResult<Option<String>> {
        Ok(self
            .recipients
            .read()
            .await
            .get(&user)
            .map(|r| r.email.clone()))
    }
}
