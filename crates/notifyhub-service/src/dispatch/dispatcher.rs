//! Notification dispatcher: persist first, then best-effort email.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, warn};

use notifyhub_core::error::AppError;
use notifyhub_core::result::AppResult;
use notifyhub_core::types::id::UserId;
use notifyhub_database::NotificationPersistence;
use notifyhub_entity::NotificationRecord;

use crate::email::EmailChannel;

use super::draft::NotificationDraft;
use super::report::BulkDispatchReport;

/// Creates notifications on behalf of producers.
///
/// The in-app record is the primary outcome. Email runs only after the
/// record is durable and its failures never reach the caller.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    /// Persistence backend.
    persistence: Arc<dyn NotificationPersistence>,
    /// Optional secondary channel.
    email: Option<Arc<EmailChannel>>,
}

impl NotificationDispatcher {
    /// Create a dispatcher without a secondary channel.
    pub fn new(persistence: Arc<dyn NotificationPersistence>) -> Self {
        Self {
            persistence,
            email: None,
        }
    }

    /// Attach the email channel.
    pub fn with_email(mut self, email: Arc<EmailChannel>) -> Self {
        self.email = Some(email);
        self
    }

    /// Validate, classify, and persist one notification.
    ///
    /// Validation failures write nothing. A persistence failure is returned
    /// as an error and the producer decides whether to retry.
    pub async fn notify(&self, draft: NotificationDraft) -> AppResult<NotificationRecord> {
        let now = Utc::now();
        let recipient = draft
            .recipient_id
            .ok_or_else(|| AppError::validation("Notification recipient is required"))?;
        draft.validate(now)?;

        let record = draft.build(recipient, now);
        self.persistence.insert(&record).await?;

        info!(
            notification_id = %record.id,
            recipient = %recipient,
            kind = record.kind.as_str(),
            priority = record.priority.as_str(),
            "Notification created"
        );

        self.email_best_effort(&record).await;
        Ok(record)
    }

    /// Persist one copy of `draft` per recipient.
    ///
    /// Duplicate recipients receive a single record. Each insert stands
    /// alone: failures are collected in the report and the records already
    /// written stay in place.
    pub async fn notify_many(
        &self,
        recipients: &[UserId],
        draft: NotificationDraft,
    ) -> AppResult<BulkDispatchReport> {
        let now = Utc::now();
        if recipients.is_empty() {
            return Err(AppError::validation("At least one recipient is required"));
        }
        draft.validate(now)?;

        let mut seen = HashSet::with_capacity(recipients.len());
        let records: Vec<NotificationRecord> = recipients
            .iter()
            .filter(|user| seen.insert(**user))
            .map(|user| draft.build(*user, now))
            .collect();

        let results = self.persistence.insert_many(&records).await;

        let mut report = BulkDispatchReport::default();
        for (record, result) in records.into_iter().zip(results) {
            match result {
                Ok(_) => report.delivered.push(record),
                Err(e) => {
                    warn!(
                        recipient = %record.recipient_id,
                        error = %e,
                        "Bulk notification insert failed"
                    );
                    report.failed.push((record.recipient_id, e));
                }
            }
        }

        info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Bulk notification dispatch finished"
        );

        join_all(report.delivered.iter().map(|r| self.email_best_effort(r))).await;
        Ok(report)
    }

    async fn email_best_effort(&self, record: &NotificationRecord) {
        let Some(email) = &self.email else {
            return;
        };
        if let Err(e) = email.deliver(record).await {
            warn!(
                notification_id = %record.id,
                error = %e,
                "Secondary channel delivery failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use notifyhub_database::{MemoryNotificationRepository, NotificationQuerySpec};

    use super::*;

    #[tokio::test]
    async fn test_missing_recipient_writes_nothing() {
        let repo = Arc::new(MemoryNotificationRepository::default());
        let dispatcher = NotificationDispatcher::new(repo.clone());

        let err = dispatcher
            .notify(NotificationDraft::new("Hello", "World"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_notify_many_dedupes_recipients() {
        let repo = Arc::new(MemoryNotificationRepository::default());
        let dispatcher = NotificationDispatcher::new(repo.clone());
        let a = UserId::new();
        let b = UserId::new();

        let report = dispatcher
            .notify_many(&[a, b, a], NotificationDraft::new("Hello", "World"))
            .await
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(report.attempted(), 2);

        let stored = repo.query(a, NotificationQuerySpec::default()).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_notify_many_requires_recipients() {
        let repo = Arc::new(MemoryNotificationRepository::default());
        let dispatcher = NotificationDispatcher::new(repo);
        let err = dispatcher
            .notify_many(&[], NotificationDraft::new("Hello", "World"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
