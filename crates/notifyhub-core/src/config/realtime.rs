//! Real-time sync engine and per-session store configuration.

use serde::{Deserialize, Serialize};

/// Settings for the change-feed sync engine and the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Number of most recent records fetched when (re)seeding a store.
    #[serde(default = "default_seed_limit")]
    pub seed_limit: u32,
    /// Initial reconnect delay after the change feed drops, in milliseconds.
    #[serde(default = "default_reconnect_initial")]
    pub reconnect_initial_ms: u64,
    /// Upper bound for the exponential reconnect delay, in milliseconds.
    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_ms: u64,
    /// Window within which repeated toasts for the same entity are suppressed.
    #[serde(default = "default_toast_window")]
    pub toast_dedup_window_ms: u64,
    /// Interval between local expiry pruning passes, in seconds.
    #[serde(default = "default_prune_interval")]
    pub prune_interval_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            seed_limit: default_seed_limit(),
            reconnect_initial_ms: default_reconnect_initial(),
            reconnect_max_ms: default_reconnect_max(),
            toast_dedup_window_ms: default_toast_window(),
            prune_interval_seconds: default_prune_interval(),
        }
    }
}

fn default_seed_limit() -> u32 {
    50
}

fn default_reconnect_initial() -> u64 {
    500
}

fn default_reconnect_max() -> u64 {
    30_000
}

fn default_toast_window() -> u64 {
    3_000
}

fn default_prune_interval() -> u64 {
    60
}
