//! Outbound email transport trait.

use async_trait::async_trait;

use crate::result::AppResult;

/// Sends a single plain-text email.
///
/// Callers treat this channel as best-effort: a failed send is logged and
/// never changes the outcome of the operation that triggered it.
#[async_trait]
pub trait EmailTransport: Send + Sync + std::fmt::Debug + 'static {
    /// Send `body` with `subject` to the address `to`.
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;

    /// Short name of the transport, used in log fields.
    fn name(&self) -> &str;
}
