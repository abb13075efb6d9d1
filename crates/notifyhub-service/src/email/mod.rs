//! Secondary (email) delivery channel.

pub mod channel;
pub mod http;
pub mod log;

use std::sync::Arc;

use notifyhub_core::config::{EmailConfig, EmailProvider};
use notifyhub_core::error::AppError;
use notifyhub_core::result::AppResult;
use notifyhub_core::traits::EmailTransport;

pub use channel::EmailChannel;
pub use http::HttpEmailTransport;
pub use log::LogEmailTransport;

/// Build the transport selected by `config.provider`.
pub fn build_transport(config: &EmailConfig) -> AppResult<Arc<dyn EmailTransport>> {
    match config.provider {
        EmailProvider::Log => Ok(Arc::new(LogEmailTransport::new(&config.from_address))),
        EmailProvider::Http => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                AppError::configuration("email.endpoint is required for the http provider")
            })?;
            let transport = HttpEmailTransport::new(
                endpoint,
                config.api_key.clone(),
                &config.from_address,
                config.timeout_seconds,
            )?;
            Ok(Arc::new(transport))
        }
    }
}
