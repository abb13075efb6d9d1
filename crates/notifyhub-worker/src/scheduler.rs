//! Cron scheduler for the digest and maintenance jobs.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use notifyhub_core::config::{DigestConfig, WorkerConfig};
use notifyhub_core::error::AppError;

use crate::executor::{Job, JobExecutor};
use crate::jobs::{NOTIFICATION_CLEANUP, WEEKLY_DIGEST};

/// Cron-based scheduler that runs jobs through a [`JobExecutor`].
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Executor the scheduled runs are dispatched to
    executor: Arc<JobExecutor>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("executor", &self.executor)
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(executor: Arc<JobExecutor>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            executor,
        })
    }

    /// Register the weekly digest (when enabled) and notification cleanup.
    pub async fn register_default_tasks(
        &self,
        digest: &DigestConfig,
        worker: &WorkerConfig,
    ) -> Result<(), AppError> {
        if digest.enabled {
            self.register(WEEKLY_DIGEST, &digest.cron).await?;
        } else {
            tracing::info!("Weekly digest disabled");
        }
        self.register(NOTIFICATION_CLEANUP, &worker.cleanup_cron).await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Schedule `job_type` on the cron expression `schedule` (with seconds).
    pub async fn register(&self, job_type: &str, schedule: &str) -> Result<(), AppError> {
        if !self.executor.has_handler(job_type) {
            return Err(AppError::configuration(format!(
                "No handler registered for scheduled job '{}'",
                job_type
            )));
        }

        let executor = Arc::clone(&self.executor);
        let name = job_type.to_string();
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let name = name.clone();
            Box::pin(async move {
                run_job(&executor, Job::new(name, serde_json::json!({}))).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid schedule '{}' for {}: {}",
                schedule, job_type, e
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add {} schedule: {}", job_type, e))
        })?;

        tracing::info!(job_type, schedule, "Registered scheduled job");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}

/// Execute one run and log its outcome.
pub async fn run_job(executor: &JobExecutor, job: Job) {
    match executor.execute(&job).await {
        Ok(result) => {
            tracing::info!(job_id = %job.id, job_type = %job.job_type, result = ?result, "Job completed");
        }
        Err(e) => {
            tracing::error!(job_id = %job.id, job_type = %job.job_type, error = %e, "Job failed");
        }
    }
}
