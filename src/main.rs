//! NotifyHub worker: weekly digests and notification retention.
//!
//! Wires configuration, logging, persistence, and the email channel
//! together, then runs the cron scheduler until a shutdown signal arrives.

use std::sync::Arc;

use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use notifyhub_core::config::AppConfig;
use notifyhub_core::error::AppError;
use notifyhub_database::{DatabasePool, PgDirectoryRepository, PgNotificationRepository};
use notifyhub_service::email::build_transport;
use notifyhub_service::{DigestGenerator, EmailChannel};
use notifyhub_worker::jobs::{DigestJobHandler, NotificationJobHandler};
use notifyhub_worker::{CronScheduler, JobExecutor};

#[tokio::main]
async fn main() {
    let env = std::env::var("NOTIFYHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Worker error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting NotifyHub worker v{}", env!("CARGO_PKG_VERSION"));

    if !config.worker.enabled {
        tracing::info!("Background worker disabled, nothing to do");
        return Ok(());
    }

    let db = DatabasePool::connect(&config.database).await?;
    notifyhub_database::migration::run_migrations(db.pool()).await?;

    let notifications = Arc::new(PgNotificationRepository::new(db.pool().clone()));
    let directory = Arc::new(PgDirectoryRepository::new(db.pool().clone()));

    let mut executor = JobExecutor::new();
    executor.register(Arc::new(NotificationJobHandler::new(
        notifications.clone(),
        &config.worker,
    )));

    let mut digest = config.digest.clone();
    if config.email.enabled {
        let transport = build_transport(&config.email)?;
        tracing::info!(transport = transport.name(), "Email channel ready");
        let email = Arc::new(EmailChannel::new(
            transport,
            directory.clone(),
            notifications.clone(),
            &config.email,
        ));
        executor.register(Arc::new(DigestJobHandler::new(
            directory.clone(),
            DigestGenerator::new(notifications.clone(), config.digest.clone()),
            email,
            config.digest.window_days,
        )));
    } else if digest.enabled {
        tracing::warn!("Email channel disabled, weekly digest will not be scheduled");
        digest.enabled = false;
    }

    let scheduler = CronScheduler::new(Arc::new(executor)).await?;
    scheduler.register_default_tasks(&digest, &config.worker).await?;
    scheduler.start().await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    scheduler.shutdown().await?;
    db.close().await;

    tracing::info!("NotifyHub worker shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
