//! Weekly digest job.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;
use tracing;

use notifyhub_database::{DigestDirectory, DigestSubscriber};
use notifyhub_entity::Opportunity;
use notifyhub_service::{DigestGenerator, EmailChannel};

use crate::executor::{Job, JobExecutionError, JobHandler};

/// Job type key.
pub const WEEKLY_DIGEST: &str = "weekly_digest";

/// What happened for one subscriber.
enum DigestOutcome {
    Sent,
    Empty,
}

/// Generates and emails the weekly digest for every subscriber.
///
/// A failure for one subscriber is logged and counted; the run continues
/// with the next one.
#[derive(Debug)]
pub struct DigestJobHandler {
    /// Subscriber and opportunity source
    directory: Arc<dyn DigestDirectory>,
    /// Digest builder
    generator: DigestGenerator,
    /// Outbound channel
    email: Arc<EmailChannel>,
    /// Trailing window for opportunity matching
    window_days: i64,
}

impl DigestJobHandler {
    /// Create a new digest job handler
    pub fn new(
        directory: Arc<dyn DigestDirectory>,
        generator: DigestGenerator,
        email: Arc<EmailChannel>,
        window_days: i64,
    ) -> Self {
        Self {
            directory,
            generator,
            email,
            window_days,
        }
    }

    async fn send_one(
        &self,
        subscriber: &DigestSubscriber,
        opportunities: &[Opportunity],
        job: &Job,
    ) -> Result<DigestOutcome, String> {
        let digest = self
            .generator
            .generate(subscriber.user_id, &subscriber.skills, opportunities, job.triggered_at)
            .await
            .map_err(|e| e.to_string())?;

        if digest.is_empty() {
            return Ok(DigestOutcome::Empty);
        }

        self.email
            .send(&subscriber.email, &digest.subject(), &digest.render_text())
            .await
            .map_err(|e| e.to_string())?;

        tracing::debug!(
            recipient = %subscriber.user_id,
            total = digest.total,
            matches = digest.matches.len(),
            "Weekly digest sent"
        );
        Ok(DigestOutcome::Sent)
    }
}

#[async_trait]
impl JobHandler for DigestJobHandler {
    fn job_type(&self) -> &str {
        WEEKLY_DIGEST
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let subscribers = self.directory.digest_subscribers().await.map_err(|e| {
            JobExecutionError::Transient(format!("Failed to load digest subscribers: {}", e))
        })?;

        let since = job.triggered_at - Duration::days(self.window_days);
        let opportunities = self.directory.open_opportunities(since).await.map_err(|e| {
            JobExecutionError::Transient(format!("Failed to load open opportunities: {}", e))
        })?;

        let (mut sent, mut empty, mut failed) = (0u32, 0u32, 0u32);
        for subscriber in &subscribers {
            match self.send_one(subscriber, &opportunities, job).await {
                Ok(DigestOutcome::Sent) => sent += 1,
                Ok(DigestOutcome::Empty) => empty += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(recipient = %subscriber.user_id, error = %e, "Weekly digest failed");
                }
            }
        }

        tracing::info!(
            subscribers = subscribers.len(),
            sent,
            empty,
            failed,
            "Weekly digest run complete"
        );

        Ok(Some(serde_json::json!({
            "task": WEEKLY_DIGEST,
            "subscribers": subscribers.len(),
            "sent": sent,
            "empty": empty,
            "failed": failed,
        })))
    }
}
