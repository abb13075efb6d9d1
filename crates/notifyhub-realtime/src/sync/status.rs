//! Connection state of the sync engine.

use serde::{Deserialize, Serialize};

/// How current the store is with respect to persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// First subscription and seed in progress.
    Connecting,
    /// Subscribed and seeded; incremental events are flowing.
    Live,
    /// The feed dropped. The store may be slightly stale until the next
    /// reconnect re-seeds it.
    Stale,
}

impl SyncStatus {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Live => "live",
            Self::Stale => "stale",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
