//! Secondary channel (email) configuration.

use serde::{Deserialize, Serialize};

/// Which email transport implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    /// Log outbound messages instead of sending them.
    Log,
    /// POST messages as JSON to an HTTP mail API.
    Http,
}

/// Email delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Whether the email channel is enabled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Transport implementation.
    #[serde(default = "default_provider")]
    pub provider: EmailProvider,
    /// HTTP mail API endpoint (required for the `http` provider).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bearer token for the HTTP mail API.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sender address.
    #[serde(default = "default_from")]
    pub from_address: String,
    /// Per-message send timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_provider(),
            endpoint: None,
            api_key: None,
            from_address: default_from(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_provider() -> EmailProvider {
    EmailProvider::Log
}

fn default_from() -> String {
    "notifications@localhost".to_string()
}

fn default_timeout() -> u64 {
    10
}
