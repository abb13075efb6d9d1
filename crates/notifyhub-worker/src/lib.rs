//! Scheduled background work for NotifyHub.
//!
//! This crate provides:
//! - A job executor that dispatches runs to the correct handler
//! - A cron scheduler that triggers the weekly digest and retention cleanup
//! - The built-in job implementations

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{Job, JobExecutionError, JobExecutor, JobHandler};
pub use scheduler::CronScheduler;
