//! Weekly digest generator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use notifyhub_core::config::DigestConfig;
use notifyhub_core::result::AppResult;
use notifyhub_core::types::id::UserId;
use notifyhub_database::{NotificationPersistence, NotificationQuerySpec};
use notifyhub_entity::{DigestWatermark, NotificationRecord, Opportunity};

use super::matcher::match_opportunities;
use super::model::WeeklyDigest;

/// Builds weekly digests from persisted notification history.
///
/// Each record is counted at most once across runs: records covered by the
/// recipient's watermark are skipped, and the watermark is advanced past
/// everything counted. Re-running over an unchanged window yields zero
/// counts. Sending the result is the caller's job.
#[derive(Debug, Clone)]
pub struct DigestGenerator {
    persistence: Arc<dyn NotificationPersistence>,
    config: DigestConfig,
}

impl DigestGenerator {
    /// Create a new digest generator.
    pub fn new(persistence: Arc<dyn NotificationPersistence>, config: DigestConfig) -> Self {
        Self {
            persistence,
            config,
        }
    }

    /// Generate the digest for `recipient` covering the trailing window that
    /// ends at `now`.
    pub async fn generate(
        &self,
        recipient: UserId,
        skills: &[String],
        opportunities: &[Opportunity],
        now: DateTime<Utc>,
    ) -> AppResult<WeeklyDigest> {
        let period_start = now - Duration::days(self.config.window_days);

        let watermark = self.persistence.digest_watermark(recipient).await?;
        let records = self
            .persistence
            .query(recipient, NotificationQuerySpec::window(period_start, now))
            .await?;

        let fresh: Vec<&NotificationRecord> = records
            .iter()
            .filter(|r| watermark.as_ref().is_none_or(|mark| !mark.covers(r)))
            .collect();

        let mut counts = HashMap::new();
        for record in &fresh {
            *counts.entry(record.kind).or_insert(0u32) += 1;
        }
        let total = fresh.len() as u32;

        let mut matches = match_opportunities(skills, opportunities);
        matches.truncate(self.config.max_matches);

        if let Some(next) = DigestWatermark::advance(watermark.as_ref(), recipient, fresh) {
            if watermark.as_ref() != Some(&next) {
                self.persistence.save_digest_watermark(&next).await?;
            }
        }

        debug!(
            recipient = %recipient,
            total,
            matches = matches.len(),
            skipped = records.len() as u32 - total,
            "Digest generated"
        );

        Ok(WeeklyDigest {
            recipient_id: recipient,
            period_start,
            period_end: now,
            counts,
            total,
            matches,
        })
    }
}
