//! Producer-supplied notification signals: domain category and severity.

use serde::{Deserialize, Serialize};

/// Domain area a notification belongs to, set by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Booked consultations and meetings.
    Consultation,
    /// Payments and payouts.
    Payment,
    /// Platform-level announcements and alerts.
    System,
    /// Research collaboration invites.
    Collaboration,
    /// Job postings and invitations.
    Job,
    /// Applications submitted to a job.
    Application,
    /// Direct messages.
    Message,
}

impl NotificationCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Consultation,
        Self::Payment,
        Self::System,
        Self::Collaboration,
        Self::Job,
        Self::Application,
        Self::Message,
    ];

    /// Return the category as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consultation => "consultation",
            Self::Payment => "payment",
            Self::System => "system",
            Self::Collaboration => "collaboration",
            Self::Job => "job",
            Self::Application => "application",
            Self::Message => "message",
        }
    }

    /// Parse a stored category. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity signal from the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawType {
    /// Neutral information.
    #[default]
    Info,
    /// Something completed successfully.
    Success,
    /// Something needs attention soon.
    Warning,
    /// Something failed.
    Error,
}

impl RawType {
    /// Every raw type, in declaration order.
    pub const ALL: [Self; 4] = [Self::Info, Self::Success, Self::Warning, Self::Error];

    /// Return the raw type as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Parse a stored raw type. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Whether the producer flagged a problem.
    pub fn is_problem(&self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }
}

impl std::fmt::Display for RawType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            NotificationCategory::parse("Payment"),
            Some(NotificationCategory::Payment)
        );
        assert_eq!(RawType::parse(" ERROR "), Some(RawType::Error));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(NotificationCategory::parse("billing"), None);
        assert_eq!(RawType::parse(""), None);
    }
}
