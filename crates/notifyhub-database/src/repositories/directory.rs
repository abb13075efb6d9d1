//! Recipient directory and open opportunities.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use notifyhub_core::error::{AppError, ErrorKind};
use notifyhub_core::result::AppResult;
use notifyhub_core::types::id::{OpportunityId, UserId};
use notifyhub_entity::Opportunity;

use crate::traits::{DigestDirectory, DigestSubscriber, RecipientDirectory};

/// Reads `notification_recipients` and `opportunities`.
#[derive(Debug, Clone)]
pub struct PgDirectoryRepository {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct SubscriberRow {
    user_id: Uuid,
    email: String,
    skills: Vec<String>,
}

#[derive(Debug, FromRow)]
struct OpportunityRow {
    id: Uuid,
    title: String,
    description: String,
    posted_at: DateTime<Utc>,
}

impl PgDirectoryRepository {
    /// Create a new directory repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DigestDirectory for PgDirectoryRepository {
    async fn digest_subscribers(&self) -> AppResult<Vec<DigestSubscriber>> {
        let rows = sqlx::query_as::<_, SubscriberRow>(
            "SELECT user_id, email, skills FROM notification_recipients \
             WHERE digest_opt_in ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to list digest subscribers", e)
        })?;

        Ok(rows
            .into_iter()
            .map(|row| DigestSubscriber {
                user_id: UserId::from_uuid(row.user_id),
                email: row.email,
                skills: row.skills,
            })
            .collect())
    }

    async fn open_opportunities(&self, since: DateTime<Utc>) -> AppResult<Vec<Opportunity>> {
        let rows = sqlx::query_as::<_, OpportunityRow>(
            "SELECT id, title, description, posted_at FROM opportunities \
             WHERE is_open AND posted_at >= $1 ORDER BY posted_at, id",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to list opportunities", e)
        })?;

        Ok(rows
            .into_iter()
            .map(|row| Opportunity {
                id: OpportunityId::from_uuid(row.id),
                title: row.title,
                description: row.description,
                posted_at: row.posted_at,
            })
            .collect())
    }
}

#[async_trait]
impl RecipientDirectory for PgDirectoryRepository {
    async fn email_for(&self, user: UserId) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT email FROM notification_recipients WHERE user_id = $1",
        )
        .bind(user.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to look up email", e))
    }
}
