//! Email transport backed by an HTTP mail API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use notifyhub_core::error::{AppError, ErrorKind};
use notifyhub_core::result::AppResult;
use notifyhub_core::traits::EmailTransport;

/// Request body accepted by the mail API.
#[derive(Debug, Serialize)]
struct OutboundEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// POSTs each message as JSON to a configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmailTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from_address: String,
}

impl HttpEmailTransport {
    /// Create a transport posting to `endpoint`.
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        from_address: &str,
        timeout_seconds: u64,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
            from_address: from_address.to_string(),
        })
    }
}

#[async_trait]
impl EmailTransport for HttpEmailTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let payload = OutboundEmail {
            from: &self.from_address,
            to,
            subject,
            text: body,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            AppError::with_source(ErrorKind::SecondaryChannel, "Email request failed", e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::secondary_channel(format!(
                "Mail API returned {status}: {body}"
            )));
        }

        debug!(to = %to, "Email accepted by mail API");
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}
