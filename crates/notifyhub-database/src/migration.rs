//! Database migration runner.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::{debug, info};

use notifyhub_core::error::{AppError, ErrorKind};

/// Schema migrations embedded at build time.
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Trigger that publishes row changes on the per-recipient channels.
const CHANGE_FEED_TRIGGER: &str = "notifications_change_feed";

/// Run all pending database migrations, then confirm the change-feed
/// trigger is in place. Realtime sync has nothing to listen to without it.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!(count = MIGRATOR.iter().count(), "Running database migrations...");
    for (version, description) in migration_set() {
        debug!(version, description = %description, "Known migration");
    }

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Persistence,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    let installed: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_trigger WHERE tgname = $1)")
            .bind(CHANGE_FEED_TRIGGER)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to inspect triggers", e)
            })?;
    if !installed {
        return Err(AppError::persistence(format!(
            "Change feed trigger '{CHANGE_FEED_TRIGGER}' is missing after migrations"
        )));
    }

    info!(trigger = CHANGE_FEED_TRIGGER, "Database migrations completed");
    Ok(())
}

/// Version and description of every embedded migration, oldest first.
pub fn migration_set() -> Vec<(i64, String)> {
    MIGRATOR
        .iter()
        .map(|m| (m.version, m.description.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_schema_is_embedded() {
        let set = migration_set();
        assert!(!set.is_empty());
        assert!(set.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(set.iter().any(|(_, d)| d.contains("notifications")));
    }
}
