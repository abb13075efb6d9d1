//! Notification preference entity.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use notifyhub_core::types::id::UserId;

use super::category::NotificationCategory;
use super::kind::Priority;

/// Per-user notification delivery preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreference {
    /// The user these preferences belong to.
    pub user_id: UserId,
    /// Channel switches per category. Missing categories use defaults.
    #[serde(default)]
    pub categories: HashMap<NotificationCategory, CategoryPreference>,
    /// When preferences were last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Preference settings for a single notification category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPreference {
    /// Whether this category is enabled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether to deliver to live sessions.
    #[serde(default = "default_true")]
    pub realtime: bool,
    /// Whether to deliver via email.
    #[serde(default)]
    pub email: bool,
}

impl NotificationPreference {
    /// Create default preferences for a user.
    pub fn default_for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            categories: HashMap::new(),
            updated_at: Some(Utc::now()),
        }
    }

    /// Whether a notification of `category` at `priority` should also be
    /// emailed.
    ///
    /// An explicit category preference wins; otherwise only high priority
    /// notifications are emailed.
    pub fn wants_email(&self, category: Option<NotificationCategory>, priority: Priority) -> bool {
        match category.and_then(|c| self.categories.get(&c)) {
            Some(pref) => pref.enabled && pref.email,
            None => priority.emails_by_default(),
        }
    }
}

impl Default for CategoryPreference {
    fn default() -> Self {
        Self {
            enabled: true,
            realtime: true,
            email: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_preference_wins() {
        let mut prefs = NotificationPreference::default_for_user(UserId::new());
        prefs.categories.insert(
            NotificationCategory::Payment,
            CategoryPreference {
                email: true,
                ..CategoryPreference::default()
            },
        );
        prefs
            .categories
            .insert(NotificationCategory::Job, CategoryPreference::default());

        assert!(prefs.wants_email(Some(NotificationCategory::Payment), Priority::Low));
        assert!(!prefs.wants_email(Some(NotificationCategory::Job), Priority::High));
    }

    #[test]
    fn test_falls_back_to_priority() {
        let prefs = NotificationPreference::default_for_user(UserId::new());
        assert!(prefs.wants_email(Some(NotificationCategory::Message), Priority::High));
        assert!(!prefs.wants_email(None, Priority::Medium));
    }
}
