//! Email transport that only logs outbound messages.

use async_trait::async_trait;
use tracing::info;

use notifyhub_core::result::AppResult;
use notifyhub_core::traits::EmailTransport;

/// Writes each message to the log instead of sending it.
#[derive(Debug, Clone)]
pub struct LogEmailTransport {
    from_address: String,
}

impl LogEmailTransport {
    /// Create a log transport that reports `from_address` as the sender.
    pub fn new(from_address: &str) -> Self {
        Self {
            from_address: from_address.to_string(),
        }
    }
}

#[async_trait]
impl EmailTransport for LogEmailTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        info!(
            from = %self.from_address,
            to = %to,
            subject = %subject,
            body_len = body.len(),
            "Email (log transport)"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
