//! Derived, UI-facing notification kind and priority tier.

use serde::{Deserialize, Serialize};

/// Semantic notification type used to select an icon and a default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A new job the user was invited to or matched with.
    JobInvitation,
    /// Progress on a job application.
    ApplicationUpdate,
    /// A payment was received.
    PaymentReceived,
    /// A payment failed.
    PaymentFailed,
    /// An upcoming or confirmed consultation.
    AppointmentReminder,
    /// An invitation to a research collaboration.
    CollaborationInvite,
    /// A direct message.
    MessageReceived,
    /// A delivery or response deadline is close.
    DeadlineReminder,
    /// A platform problem that needs attention.
    SystemAlert,
    /// A neutral platform announcement.
    SystemNotice,
}

impl NotificationKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::JobInvitation,
        Self::ApplicationUpdate,
        Self::PaymentReceived,
        Self::PaymentFailed,
        Self::AppointmentReminder,
        Self::CollaborationInvite,
        Self::MessageReceived,
        Self::DeadlineReminder,
        Self::SystemAlert,
        Self::SystemNotice,
    ];

    /// Return the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JobInvitation => "job_invitation",
            Self::ApplicationUpdate => "application_update",
            Self::PaymentReceived => "payment_received",
            Self::PaymentFailed => "payment_failed",
            Self::AppointmentReminder => "appointment_reminder",
            Self::CollaborationInvite => "collaboration_invite",
            Self::MessageReceived => "message_received",
            Self::DeadlineReminder => "deadline_reminder",
            Self::SystemAlert => "system_alert",
            Self::SystemNotice => "system_notice",
        }
    }

    /// Parse a stored kind. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s.trim())
    }

    /// Icon identifier rendered by the presentation surfaces.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::JobInvitation => "briefcase",
            Self::ApplicationUpdate => "file-text",
            Self::PaymentReceived => "credit-card",
            Self::PaymentFailed => "alert-circle",
            Self::AppointmentReminder => "calendar",
            Self::CollaborationInvite => "users",
            Self::MessageReceived => "message-square",
            Self::DeadlineReminder => "clock",
            Self::SystemAlert => "alert-triangle",
            Self::SystemNotice => "info",
        }
    }

    /// Human-readable label used in digests.
    pub fn label(&self) -> &'static str {
        match self {
            Self::JobInvitation => "Job invitations",
            Self::ApplicationUpdate => "Application updates",
            Self::PaymentReceived => "Payments received",
            Self::PaymentFailed => "Failed payments",
            Self::AppointmentReminder => "Consultations",
            Self::CollaborationInvite => "Collaboration invites",
            Self::MessageReceived => "Messages",
            Self::DeadlineReminder => "Deadlines",
            Self::SystemAlert => "System alerts",
            Self::SystemNotice => "Announcements",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Urgency tier used for sorting and visual emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Routine, no emphasis.
    Low,
    /// Worth a look.
    Medium,
    /// Needs attention now.
    High,
}

impl Priority {
    /// Parse from string, defaulting to `Low`.
    pub fn from_str_value(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Whether this priority warrants an email when the user has no
    /// explicit channel preference.
    pub fn emails_by_default(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_string_roundtrip() {
        for kind in NotificationKind::ALL {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::from_str_value("HIGH"), Priority::High);
        assert_eq!(Priority::from_str_value("urgent"), Priority::Low);
    }
}
