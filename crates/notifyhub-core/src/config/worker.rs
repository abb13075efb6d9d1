//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background maintenance job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for notification cleanup.
    #[serde(default = "default_cleanup_cron")]
    pub cleanup_cron: String,
    /// Number of days after which stored notifications are removed.
    #[serde(default = "default_cleanup_days")]
    pub cleanup_after_days: i64,
    /// Maximum stored notifications per user.
    #[serde(default = "default_max_stored")]
    pub max_stored_per_user: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cleanup_cron: default_cleanup_cron(),
            cleanup_after_days: default_cleanup_days(),
            max_stored_per_user: default_max_stored(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cleanup_cron() -> String {
    "0 0 * * * *".to_string()
}

fn default_cleanup_days() -> i64 {
    30
}

fn default_max_stored() -> i64 {
    1000
}
