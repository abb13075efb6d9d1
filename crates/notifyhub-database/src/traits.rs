//! Persistence API traits implemented by the repository backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use notifyhub_core::result::AppResult;
use notifyhub_core::types::id::{NotificationId, UserId};
use notifyhub_entity::{DigestWatermark, NotificationPreference, NotificationRecord, Opportunity};

/// A row-level change delivered by the change feed.
///
/// Delivery is at-least-once: consumers must tolerate duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A record was created.
    Inserted {
        /// The new record.
        record: NotificationRecord,
    },
    /// A record changed (read state).
    Updated {
        /// The record after the change.
        record: NotificationRecord,
    },
    /// A record was deleted.
    Deleted {
        /// The deleted record's id.
        id: NotificationId,
    },
}

/// Stream of change events for one recipient.
///
/// An `Err` item or the end of the stream means the subscription dropped;
/// events after that point are not delivered on this stream.
pub type ChangeFeed = BoxStream<'static, AppResult<ChangeEvent>>;

/// Window and bound for historical queries. Results are ordered by
/// `created_at` descending, ties broken by id descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationQuerySpec {
    /// Created at or after.
    pub since: Option<DateTime<Utc>>,
    /// Created strictly before.
    pub until: Option<DateTime<Utc>>,
    /// Maximum number of records.
    pub limit: Option<u32>,
}

impl NotificationQuerySpec {
    /// The `limit` most recent records.
    pub fn latest(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Every record created in `[since, until)`.
    pub fn window(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
            limit: None,
        }
    }

    /// Whether `created_at` falls inside the window.
    pub fn contains(&self, created_at: DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| created_at >= since)
            && self.until.is_none_or(|until| created_at < until)
    }
}

/// Durable storage for notification records and their change feed.
#[async_trait]
pub trait NotificationPersistence: Send + Sync + std::fmt::Debug + 'static {
    /// Insert one record.
    async fn insert(&self, record: &NotificationRecord) -> AppResult<NotificationId>;

    /// Insert many records independently. One result per input, in order;
    /// a failed record does not affect the others.
    async fn insert_many(&self, records: &[NotificationRecord]) -> Vec<AppResult<NotificationId>>;

    /// Mark one of the recipient's records read.
    async fn mark_read(
        &self,
        recipient: UserId,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Mark every unread record of the recipient read. Returns rows changed.
    async fn mark_all_read(&self, recipient: UserId, at: DateTime<Utc>) -> AppResult<u64>;

    /// Mark exactly `ids` read. Ids that are unknown, already read, or
    /// addressed to another recipient are skipped. Returns rows changed.
    async fn mark_read_many(
        &self,
        recipient: UserId,
        ids: &[NotificationId],
        at: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Delete one of the recipient's records. Returns `true` if it existed.
    async fn delete(&self, recipient: UserId, id: NotificationId) -> AppResult<bool>;

    /// Historical query for one recipient.
    async fn query(
        &self,
        recipient: UserId,
        spec: NotificationQuerySpec,
    ) -> AppResult<Vec<NotificationRecord>>;

    /// Open a change feed scoped to one recipient.
    async fn subscribe(&self, recipient: UserId) -> AppResult<ChangeFeed>;

    /// Channel preferences for a user, if any were saved.
    async fn preferences(&self, user: UserId) -> AppResult<Option<NotificationPreference>>;

    /// Last digest watermark for a recipient.
    async fn digest_watermark(&self, recipient: UserId) -> AppResult<Option<DigestWatermark>>;

    /// Persist a digest watermark.
    async fn save_digest_watermark(&self, mark: &DigestWatermark) -> AppResult<()>;

    /// Delete records that expired before `now` or were created before
    /// `created_before`. Returns rows removed.
    async fn delete_expired(
        &self,
        now: DateTime<Utc>,
        created_before: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Keep only the newest `limit` records per recipient. Returns rows removed.
    async fn trim_per_user(&self, limit: i64) -> AppResult<u64>;
}

/// A user who receives weekly digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestSubscriber {
    /// The user.
    pub user_id: UserId,
    /// Delivery address.
    pub email: String,
    /// Skills/keywords used for opportunity matching.
    pub skills: Vec<String>,
}

/// Source of digest recipients and candidate opportunities.
#[async_trait]
pub trait DigestDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Users opted in to the weekly digest.
    async fn digest_subscribers(&self) -> AppResult<Vec<DigestSubscriber>>;

    /// Open opportunities posted at or after `since`, in posting order.
    async fn open_opportunities(&self, since: DateTime<Utc>) -> AppResult<Vec<Opportunity>>;
}

/// Looks up delivery addresses for the email channel.
#[async_trait]
pub trait RecipientDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// The user's email address, if known.
    async fn email_for(&self, user: UserId) -> AppResult<Option<String>>;
}
