//! Weekly digest configuration.

use serde::{Deserialize, Serialize};

/// Weekly digest generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Whether the digest job is scheduled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Trailing window, in days, covered by one digest.
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    /// Cron expression (with seconds) for the digest run.
    #[serde(default = "default_cron")]
    pub cron: String,
    /// Maximum number of matched opportunities included in a digest.
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_days: default_window_days(),
            cron: default_cron(),
            max_matches: default_max_matches(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_window_days() -> i64 {
    7
}

fn default_cron() -> String {
    "0 0 8 * * 1".to_string()
}

fn default_max_matches() -> usize {
    10
}
