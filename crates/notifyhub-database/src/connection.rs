//! PostgreSQL connection pool management.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use notifyhub_core::config::DatabaseConfig;
use notifyhub_core::error::{AppError, ErrorKind};
use notifyhub_core::types::id::UserId;

/// Prefix of the per-recipient `LISTEN` channels fed by the
/// `notifications_change_feed` trigger.
pub const CHANGE_CHANNEL_PREFIX: &str = "notif_";

/// `LISTEN` channel for a recipient: the prefix plus the undashed uuid, so
/// the name stays under Postgres' 63-byte identifier limit.
pub fn change_channel(recipient: UserId) -> String {
    format!("{CHANGE_CHANNEL_PREFIX}{}", recipient.as_uuid().simple())
}

/// Wrapper around the sqlx PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    /// The underlying sqlx connection pool.
    pool: PgPool,
}

impl DatabasePool {
    /// Create a new database pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            url = %mask_password(&config.url),
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            change_channel_prefix = CHANGE_CHANNEL_PREFIX,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Persistence,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Mask the password portion of a database URL for safe logging.
fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_channel_fits_identifier_limit() {
        let name = change_channel(UserId::new());
        assert!(name.starts_with(CHANGE_CHANNEL_PREFIX));
        assert_eq!(name.len(), CHANGE_CHANNEL_PREFIX.len() + 32);
        assert!(!name.contains('-'));
        assert!(name.len() <= 63);
    }

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("postgres://notify:secret@db:5432/notifyhub"),
            "postgres://notify:****@db:5432/notifyhub"
        );
        assert_eq!(
            mask_password("postgres://db:5432/notifyhub"),
            "postgres://db:5432/notifyhub"
        );
    }
}
