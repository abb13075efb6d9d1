//! Producer-side notification input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use notifyhub_core::error::AppError;
use notifyhub_core::result::AppResult;
use notifyhub_core::types::id::{NotificationId, UserId};
use notifyhub_entity::notification::classifier::classify_with_payload;
use notifyhub_entity::{
    NotificationCategory, NotificationPayload, NotificationRecord, RawType, ReadState,
};

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Everything a producer supplies for a new notification.
///
/// Kind and priority are not part of the draft: they are derived by the
/// classifier when the record is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDraft {
    /// Recipient. Ignored by bulk dispatch, which supplies its own list.
    pub recipient_id: Option<UserId>,
    /// Title shown in every surface.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Producer severity. `None` classifies as `info`.
    pub raw_type: Option<RawType>,
    /// Producer domain category.
    pub category: Option<NotificationCategory>,
    /// Navigation target.
    pub action_url: Option<String>,
    /// Label for the navigation target.
    pub action_label: Option<String>,
    /// Entity references.
    #[serde(default)]
    pub payload: NotificationPayload,
    /// Expiry time; must not precede creation.
    pub expires_at: Option<DateTime<Utc>>,
}

impl NotificationDraft {
    /// Start a draft with the given title and message.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Address the draft to `recipient`.
    pub fn to(mut self, recipient: UserId) -> Self {
        self.recipient_id = Some(recipient);
        self
    }

    /// Set the producer severity.
    pub fn with_raw_type(mut self, raw_type: RawType) -> Self {
        self.raw_type = Some(raw_type);
        self
    }

    /// Set the severity from its wire name. Unrecognized names are dropped
    /// and fall back to the classifier defaults.
    pub fn with_type_name(mut self, name: &str) -> Self {
        self.raw_type = RawType::parse(name);
        self
    }

    /// Set the domain category.
    pub fn with_category(mut self, category: NotificationCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the category from its wire name. Unrecognized names are dropped.
    pub fn with_category_name(mut self, name: &str) -> Self {
        self.category = NotificationCategory::parse(name);
        self
    }

    /// Set the navigation target.
    pub fn with_action(mut self, url: impl Into<String>, label: Option<&str>) -> Self {
        self.action_url = Some(url.into());
        self.action_label = label.map(str::to_string);
        self
    }

    /// Attach entity references.
    pub fn with_payload(mut self, payload: NotificationPayload) -> Self {
        self.payload = payload;
        self
    }

    /// Set the expiry.
    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Check the content fields. The recipient is checked by the caller.
    pub fn validate(&self, now: DateTime<Utc>) -> AppResult<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Notification title is required"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::validation(format!(
                "Notification title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        if self.message.trim().is_empty() {
            return Err(AppError::validation("Notification message is required"));
        }
        if self
            .action_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            return Err(AppError::validation("Action URL must not be blank"));
        }
        if self.expires_at.is_some_and(|exp| exp < now) {
            return Err(AppError::validation(
                "Notification expiry must not precede its creation time",
            ));
        }
        Ok(())
    }

    /// Build the classified, unread record for `recipient`.
    pub fn build(&self, recipient: UserId, now: DateTime<Utc>) -> NotificationRecord {
        let classification = classify_with_payload(self.raw_type, self.category, &self.payload, now);

        NotificationRecord {
            id: NotificationId::new(),
            recipient_id: recipient,
            title: self.title.trim().to_string(),
            message: self.message.clone(),
            raw_type: self.raw_type.unwrap_or_default(),
            category: self.category,
            kind: classification.kind,
            priority: classification.priority,
            action_url: self.action_url.clone(),
            action_label: self.action_label.clone(),
            payload: self.payload.clone(),
            created_at: now,
            expires_at: self.expires_at,
            read_state: ReadState::Unread,
            read_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use notifyhub_entity::{NotificationKind, Priority};

    use super::*;

    #[test]
    fn test_blank_title_rejected() {
        let draft = NotificationDraft::new("   ", "body");
        assert!(draft.validate(Utc::now()).unwrap_err().is_validation());
    }

    #[test]
    fn test_expiry_before_creation_rejected() {
        let now = Utc::now();
        let draft = NotificationDraft::new("t", "m").expires_at(now - Duration::seconds(1));
        assert!(draft.validate(now).unwrap_err().is_validation());
        let draft = NotificationDraft::new("t", "m").expires_at(now);
        assert!(draft.validate(now).is_ok());
    }

    #[test]
    fn test_unknown_names_fall_back() {
        let draft = NotificationDraft::new("t", "m")
            .with_type_name("catastrophic")
            .with_category_name("gardening");
        assert_eq!(draft.raw_type, None);
        assert_eq!(draft.category, None);

        let record = draft.build(UserId::new(), Utc::now());
        assert_eq!(record.kind, NotificationKind::MessageReceived);
        assert_eq!(record.raw_type, RawType::Info);
    }

    #[test]
    fn test_build_classifies_payment_failure() {
        let record = NotificationDraft::new("Payment failed", "Card declined")
            .with_type_name("error")
            .with_category_name("payment")
            .build(UserId::new(), Utc::now());
        assert_eq!(record.kind, NotificationKind::PaymentFailed);
        assert_eq!(record.priority, Priority::Medium);
        assert!(record.is_unread());
    }
}
