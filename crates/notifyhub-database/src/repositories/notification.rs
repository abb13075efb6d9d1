//! PostgreSQL notification repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use sqlx::postgres::PgListener;
use sqlx::{FromRow, PgPool};
use tracing::{debug, warn};
use uuid::Uuid;

use notifyhub_core::error::{AppError, ErrorKind};
use notifyhub_core::result::AppResult;
use notifyhub_core::types::id::{NotificationId, UserId};
use notifyhub_entity::notification::category::{NotificationCategory, RawType};
use notifyhub_entity::notification::classifier::classify;
use notifyhub_entity::notification::kind::{NotificationKind, Priority};
use notifyhub_entity::notification::model::{NotificationRecord, ReadState};
use notifyhub_entity::notification::payload::NotificationPayload;
use notifyhub_entity::notification::preference::NotificationPreference;
use notifyhub_entity::DigestWatermark;

use crate::connection::change_channel;
use crate::traits::{ChangeEvent, ChangeFeed, NotificationPersistence, NotificationQuerySpec};

/// Repository for notification records backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

/// Raw `notifications` row.
#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    title: String,
    message: String,
    raw_type: String,
    category: Option<String>,
    kind: String,
    priority: String,
    action_url: Option<String>,
    action_label: Option<String>,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
}

impl From<NotificationRow> for NotificationRecord {
    fn from(row: NotificationRow) -> Self {
        let raw_type = RawType::parse(&row.raw_type).unwrap_or_default();
        let category = row.category.as_deref().and_then(NotificationCategory::parse);

        // Rows written by older producers may carry a kind this build does
        // not know; fall back to the classifier.
        let (kind, priority) = match NotificationKind::parse(&row.kind) {
            Some(kind) => (kind, Priority::from_str_value(&row.priority)),
            None => {
                let c = classify(Some(raw_type), category);
                (c.kind, c.priority)
            }
        };

        let payload = serde_json::from_value(row.payload).unwrap_or_else(|e| {
            warn!(notification_id = %row.id, "Unreadable notification payload: {e}");
            NotificationPayload::None
        });

        NotificationRecord {
            id: NotificationId::from_uuid(row.id),
            recipient_id: UserId::from_uuid(row.recipient_id),
            title: row.title,
            message: row.message,
            raw_type,
            category,
            kind,
            priority,
            action_url: row.action_url,
            action_label: row.action_label,
            payload,
            created_at: row.created_at,
            expires_at: row.expires_at,
            read_state: if row.is_read {
                ReadState::Read
            } else {
                ReadState::Unread
            },
            read_at: row.read_at,
        }
    }
}

/// Payload of a `pg_notify` change message.
#[derive(Debug, serde::Deserialize)]
struct ChangeMessage {
    op: String,
    id: Uuid,
}

impl PgNotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one of the recipient's records.
    pub async fn find_by_id(
        &self,
        recipient: UserId,
        id: NotificationId,
    ) -> AppResult<Option<NotificationRecord>> {
        fetch_one(&self.pool, recipient, id).await
    }

    /// Save a user's channel preferences.
    pub async fn upsert_preferences(&self, prefs: &NotificationPreference) -> AppResult<()> {
        let categories = serde_json::to_value(&prefs.categories)?;
        sqlx::query(
            "INSERT INTO notification_preferences (user_id, categories, updated_at) \
             VALUES ($1, $2, NOW()) \
             ON CONFLICT (user_id) DO UPDATE SET categories = $2, updated_at = NOW()",
        )
        .bind(prefs.user_id.into_uuid())
        .bind(categories)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to upsert preferences", e)
        })?;
        Ok(())
    }
}

async fn fetch_one(
    pool: &PgPool,
    recipient: UserId,
    id: NotificationId,
) -> AppResult<Option<NotificationRecord>> {
    sqlx::query_as::<_, NotificationRow>(
        "SELECT * FROM notifications WHERE id = $1 AND recipient_id = $2",
    )
    .bind(id.into_uuid())
    .bind(recipient.into_uuid())
    .fetch_optional(pool)
    .await
    .map(|row| row.map(NotificationRecord::from))
    .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to fetch notification", e))
}

/// Turn a raw change message into a change event, fetching the row.
async fn decode_change(
    pool: &PgPool,
    recipient: UserId,
    payload: &str,
) -> AppResult<Option<ChangeEvent>> {
    let msg: ChangeMessage = serde_json::from_str(payload)?;
    let id = NotificationId::from_uuid(msg.id);

    if msg.op == "delete" {
        return Ok(Some(ChangeEvent::Deleted { id }));
    }

    let Some(record) = fetch_one(pool, recipient, id).await? else {
        // Deleted again before we could read it; the delete event follows.
        return Ok(None);
    };

    Ok(Some(match msg.op.as_str() {
        "insert" => ChangeEvent::Inserted { record },
        _ => ChangeEvent::Updated { record },
    }))
}

#[async_trait]
impl NotificationPersistence for PgNotificationRepository {
    async fn insert(&self, record: &NotificationRecord) -> AppResult<NotificationId> {
        let payload = serde_json::to_value(&record.payload)?;
        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, title, message, raw_type, category, kind, \
             priority, action_url, action_label, payload, created_at, expires_at, is_read, read_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(record.id.into_uuid())
        .bind(record.recipient_id.into_uuid())
        .bind(&record.title)
        .bind(&record.message)
        .bind(record.raw_type.as_str())
        .bind(record.category.map(|c| c.as_str()))
        .bind(record.kind.as_str())
        .bind(record.priority.as_str())
        .bind(&record.action_url)
        .bind(&record.action_label)
        .bind(payload)
        .bind(record.created_at)
        .bind(record.expires_at)
        .bind(record.read_state == ReadState::Read)
        .bind(record.read_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to insert notification", e)
        })?;

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
        sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $3 \
             WHERE id = $1 AND recipient_id = $2 AND is_read = FALSE",
        )
        .bind(id.into_uuid())
        .bind(recipient.into_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to mark read", e))?;
        Ok(())
    }

    async fn mark_all_read(&self, recipient: UserId, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $2 \
             WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(recipient.into_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }

    async fn mark_read_many(
        &self,
        recipient: UserId,
        ids: &[NotificationId],
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $3 \
             WHERE recipient_id = $1 AND id = ANY($2) AND is_read = FALSE",
        )
        .bind(recipient.into_uuid())
        .bind(&ids)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to mark read", e))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, recipient: UserId, id: NotificationId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(id.into_uuid())
            .bind(recipient.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to delete notification", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(
        &self,
        recipient: UserId,
        spec: NotificationQuerySpec,
    ) -> AppResult<Vec<NotificationRecord>> {
        sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE recipient_id = $1 \
             AND ($2::timestamptz IS NULL OR created_at >= $2) \
             AND ($3::timestamptz IS NULL OR created_at < $3) \
             ORDER BY created_at DESC, id DESC LIMIT $4",
        )
        .bind(recipient.into_uuid())
        .bind(spec.since)
        .bind(spec.until)
        .bind(spec.limit.map(i64::from))
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(NotificationRecord::from).collect())
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to query notifications", e))
    }

    async fn subscribe(&self, recipient: UserId) -> AppResult<ChangeFeed> {
        let channel = change_channel(recipient);
        let mut listener = PgListener::connect_with(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Transport, "Failed to open change feed", e)
        })?;
        listener.listen(&channel).await.map_err(|e| {
            AppError::with_source(ErrorKind::Transport, "Failed to listen on change feed", e)
        })?;
        debug!(%recipient, %channel, "Change feed subscribed");

        let pool = self.pool.clone();
        let feed = futures::stream::unfold(Some(listener), move |state| {
            let pool = pool.clone();
            async move {
                let mut listener = state?;
                loop {
                    // try_recv reports a lost connection as Ok(None); recv would
                    // reconnect silently and hide the gap.
                    match listener.try_recv().await {
                        Ok(Some(notification)) => {
                            match decode_change(&pool, recipient, notification.payload()).await {
                                Ok(Some(event)) => return Some((Ok(event), Some(listener))),
                                Ok(None) => continue,
                                Err(e) => return Some((Err(e), None)),
                            }
                        }
                        Ok(None) => {
                            return Some((
                                Err(AppError::transport("Change feed connection lost")),
                                None,
                            ));
                        }
                        Err(e) => {
                            return Some((
                                Err(AppError::with_source(
                                    ErrorKind::Transport,
                                    "Change feed receive failed",
                                    e,
                                )),
                                None,
                            ));
                        }
                    }
                }
            }
        });

        Ok(feed.boxed())
    }

    async fn preferences(&self, user: UserId) -> AppResult<Option<NotificationPreference>> {
        let row: Option<(serde_json::Value, Option<DateTime<Utc>>)> = sqlx::query_as(
            "SELECT categories, updated_at FROM notification_preferences WHERE user_id = $1",
        )
        .bind(user.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to get preferences", e))?;

        match row {
            Some((categories, updated_at)) => Ok(Some(NotificationPreference {
                user_id: user,
                categories: serde_json::from_value(categories)?,
                updated_at,
            })),
            None => Ok(None),
        }
    }

    async fn digest_watermark(&self, recipient: UserId) -> AppResult<Option<DigestWatermark>> {
        let row: Option<(DateTime<Utc>, Vec<Uuid>)> = sqlx::query_as(
            "SELECT digested_through, boundary_ids FROM digest_watermarks WHERE recipient_id = $1",
        )
        .bind(recipient.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to get digest watermark", e)
        })?;

        Ok(row.map(|(digested_through, boundary_ids)| DigestWatermark {
            recipient_id: recipient,
            digested_through,
            boundary_ids: boundary_ids
                .into_iter()
                .map(NotificationId::from_uuid)
                .collect(),
        }))
    }

    async fn save_digest_watermark(&self, mark: &DigestWatermark) -> AppResult<()> {
        let boundary: Vec<Uuid> = mark.boundary_ids.iter().map(|id| id.into_uuid()).collect();
        sqlx::query(
            "INSERT INTO digest_watermarks (recipient_id, digested_through, boundary_ids) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (recipient_id) DO UPDATE \
             SET digested_through = $2, boundary_ids = $3 \
             WHERE digest_watermarks.digested_through <= $2",
        )
        .bind(mark.recipient_id.into_uuid())
        .bind(mark.digested_through)
        .bind(boundary)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to save digest watermark", e)
        })?;
        Ok(())
    }

    async fn delete_expired(
        &self,
        now: DateTime<Utc>,
        created_before: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications \
             WHERE (expires_at IS NOT NULL AND expires_at <= $1) OR created_at < $2",
        )
        .bind(now)
        .bind(created_before)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to cleanup notifications", e)
        })?;
        Ok(result.rows_affected())
    }

    async fn trim_per_user(&self, limit: i64) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE id IN (\
                SELECT id FROM (\
                    SELECT id, ROW_NUMBER() OVER (\
                        PARTITION BY recipient_id ORDER BY created_at DESC, id DESC\
                    ) AS r_num \
                    FROM notifications\
                ) t WHERE t.r_num > $1\
             )",
        )
        .bind(limit)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to trim notifications", e)
        })?;

        Ok(result.rows_affected())
    }
}
