//! Notification view filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::NotificationCategory;
use super::kind::{NotificationKind, Priority};
use super::model::{NotificationRecord, ReadState};

/// Criteria selecting which notifications a surface shows.
///
/// The default filter matches every non-expired record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFilter {
    /// Only this category.
    pub category: Option<NotificationCategory>,
    /// Only this kind.
    pub kind: Option<NotificationKind>,
    /// Only this read state.
    pub read_state: Option<ReadState>,
    /// Only this priority or above.
    pub min_priority: Option<Priority>,
    /// Created at or after.
    pub since: Option<DateTime<Utc>>,
    /// Created strictly before.
    pub until: Option<DateTime<Utc>>,
    /// Include records whose expiry has passed.
    #[serde(default)]
    pub include_expired: bool,
    /// Maximum number of records returned.
    pub limit: Option<usize>,
}

impl NotificationFilter {
    /// Filter matching only unread records.
    pub fn unread() -> Self {
        Self {
            read_state: Some(ReadState::Unread),
            ..Self::default()
        }
    }

    /// Restrict to a category.
    pub fn with_category(mut self, category: NotificationCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Restrict to a kind.
    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restrict to a minimum priority.
    pub fn with_min_priority(mut self, priority: Priority) -> Self {
        self.min_priority = Some(priority);
        self
    }

    /// Restrict to the window `[since, until)`.
    pub fn within(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    /// Cap the number of records.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check a record against every criterion except `limit`.
    pub fn matches(&self, record: &NotificationRecord, now: DateTime<Utc>) -> bool {
        if !self.include_expired && record.is_expired_at(now) {
            return false;
        }
        if self.category.is_some_and(|c| record.category != Some(c)) {
            return false;
        }
        if self.kind.is_some_and(|k| record.kind != k) {
            return false;
        }
        if self.read_state.is_some_and(|s| record.read_state != s) {
            return false;
        }
        if self.min_priority.is_some_and(|p| record.priority < p) {
            return false;
        }
        if self.since.is_some_and(|since| record.created_at < since) {
            return false;
        }
        if self.until.is_some_and(|until| record.created_at >= until) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use notifyhub_core::types::id::UserId;

    use super::*;
    use crate::notification::model::fixtures::record;

    #[test]
    fn test_default_hides_expired() {
        let now = Utc::now();
        let mut r = record(UserId::new(), None, now - Duration::hours(1));
        r.expires_at = Some(now - Duration::minutes(1));
        assert!(!NotificationFilter::default().matches(&r, now));

        let all = NotificationFilter {
            include_expired: true,
            ..NotificationFilter::default()
        };
        assert!(all.matches(&r, now));
    }

    #[test]
    fn test_category_and_priority() {
        let now = Utc::now();
        let job = record(UserId::new(), Some(NotificationCategory::Job), now);
        let collab = record(UserId::new(), Some(NotificationCategory::Collaboration), now);

        let jobs = NotificationFilter::default().with_category(NotificationCategory::Job);
        assert!(jobs.matches(&job, now));
        assert!(!jobs.matches(&collab, now));

        let important = NotificationFilter::default().with_min_priority(Priority::Medium);
        assert!(important.matches(&job, now));
        assert!(!important.matches(&collab, now));
    }

    #[test]
    fn test_time_window_is_half_open() {
        let now = Utc::now();
        let r = record(UserId::new(), None, now);
        assert!(
            NotificationFilter::default()
                .within(now, now + Duration::seconds(1))
                .matches(&r, now)
        );
        assert!(
            !NotificationFilter::default()
                .within(now - Duration::seconds(1), now)
                .matches(&r, now)
        );
    }
}
