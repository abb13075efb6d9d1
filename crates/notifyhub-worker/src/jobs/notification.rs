//! Notification retention cleanup.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;
use tracing;

use notifyhub_core::config::WorkerConfig;
use notifyhub_database::NotificationPersistence;

use crate::executor::{Job, JobExecutionError, JobHandler};

/// Job type key.
pub const NOTIFICATION_CLEANUP: &str = "notification_cleanup";

/// Removes expired and aged-out notifications, then trims each user's
/// history to the configured cap.
#[derive(Debug)]
pub struct NotificationJobHandler {
    /// Persistence backend
    persistence: Arc<dyn NotificationPersistence>,
    /// Max age in days before cleanup
    cleanup_after_days: i64,
    /// Max stored per user
    max_stored_per_user: i64,
}

impl NotificationJobHandler {
    /// Create a new notification job handler
    pub fn new(persistence: Arc<dyn NotificationPersistence>, config: &WorkerConfig) -> Self {
        Self {
            persistence,
            cleanup_after_days: config.cleanup_after_days,
            max_stored_per_user: config.max_stored_per_user,
        }
    }

    async fn cleanup_notifications(&self, job: &Job) -> Result<Value, JobExecutionError> {
        let now = job.triggered_at;
        let cutoff = now - Duration::days(self.cleanup_after_days);

        let expired_count = self
            .persistence
            .delete_expired(now, cutoff)
            .await
            .map_err(|e| {
                JobExecutionError::Transient(format!("Notification cleanup failed: {}", e))
            })?;

        let overflow_count = self
            .persistence
            .trim_per_user(self.max_stored_per_user)
            .await
            .map_err(|e| {
                JobExecutionError::Transient(format!("Notification per-user trim failed: {}", e))
            })?;

        tracing::info!(
            expired_removed = expired_count,
            overflow_removed = overflow_count,
            "Notification cleanup complete"
        );

        Ok(serde_json::json!({
            "task": NOTIFICATION_CLEANUP,
            "expired_removed": expired_count,
            "overflow_removed": overflow_count,
            "cutoff_days": self.cleanup_after_days,
            "max_per_user": self.max_stored_per_user,
        }))
    }
}

#[async_trait]
impl JobHandler for NotificationJobHandler {
    fn job_type(&self) -> &str {
        NOTIFICATION_CLEANUP
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        Ok(Some(self.cleanup_notifications(job).await?))
    }
}
