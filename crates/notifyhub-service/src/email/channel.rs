//! Preference-aware email delivery for notification records.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use notifyhub_core::config::EmailConfig;
use notifyhub_core::error::{AppError, ErrorKind};
use notifyhub_core::result::AppResult;
use notifyhub_core::traits::EmailTransport;
use notifyhub_database::{NotificationPersistence, RecipientDirectory};
use notifyhub_entity::{NotificationPreference, NotificationRecord};

/// Decides whether a record is emailed and sends it with a bounded wait.
///
/// Every failure is reported as [`ErrorKind::SecondaryChannel`]; callers
/// log it and carry on.
#[derive(Debug, Clone)]
pub struct EmailChannel {
    transport: Arc<dyn EmailTransport>,
    recipients: Arc<dyn RecipientDirectory>,
    persistence: Arc<dyn NotificationPersistence>,
    timeout: Duration,
}

impl EmailChannel {
    /// Create a new email channel.
    pub fn new(
        transport: Arc<dyn EmailTransport>,
        recipients: Arc<dyn RecipientDirectory>,
        persistence: Arc<dyn NotificationPersistence>,
        config: &EmailConfig,
    ) -> Self {
        Self {
            transport,
            recipients,
            persistence,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    /// Email `record` to its recipient if their preferences ask for it.
    ///
    /// Returns `Ok(true)` when a message was sent, `Ok(false)` when the
    /// preferences or a missing address skipped it.
    pub async fn deliver(&self, record: &NotificationRecord) -> AppResult<bool> {
        let prefs = self
            .persistence
            .preferences(record.recipient_id)
            .await
            .map_err(|e| secondary("Failed to load notification preferences", e))?
            .unwrap_or_else(|| NotificationPreference::default_for_user(record.recipient_id));

        if !prefs.wants_email(record.category, record.priority) {
            debug!(
                notification_id = %record.id,
                kind = record.kind.as_str(),
                "Email skipped by preferences"
            );
            return Ok(false);
        }

        let Some(address) = self
            .recipients
            .email_for(record.recipient_id)
            .await
            .map_err(|e| secondary("Failed to look up recipient address", e))?
        else {
            debug!(recipient = %record.recipient_id, "No email address on file");
            return Ok(false);
        };

        let (subject, body) = compose(record);
        self.send(&address, &subject, &body).await?;
        Ok(true)
    }

    /// Send one message through the transport, bounded by the configured timeout.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        match tokio::time::timeout(self.timeout, self.transport.send(to, subject, body)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(secondary(
                &format!("Email via '{}' failed", self.transport.name()),
                e,
            )),
            Err(_) => Err(AppError::secondary_channel(format!(
                "Email via '{}' timed out after {}s",
                self.transport.name(),
                self.timeout.as_secs()
            ))),
        }
    }
}

fn secondary(message: &str, source: AppError) -> AppError {
    AppError::with_source(ErrorKind::SecondaryChannel, message, source)
}

/// Subject and plain-text body for a notification email.
pub fn compose(record: &NotificationRecord) -> (String, String) {
    let mut body = record.message.clone();
    let action = record
        .action_url
        .clone()
        .or_else(|| record.payload.default_action_url());
    if let Some(url) = action {
        let label = record.action_label.as_deref().unwrap_or("View");
        body.push_str(&format!("\n\n{label}: {url}"));
    }
    (record.title.clone(), body)
}
