//! Notification entity model.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use notifyhub_core::types::id::{NotificationId, UserId};

use super::category::{NotificationCategory, RawType};
use super::kind::{NotificationKind, Priority};
use super::payload::NotificationPayload;

/// Read state of a notification. Only ever moves from `Unread` to `Read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadState {
    /// Not yet seen.
    #[default]
    Unread,
    /// Seen by the recipient.
    Read,
}

/// A notification delivered to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub recipient_id: UserId,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Producer severity.
    pub raw_type: RawType,
    /// Producer domain category, if one was given.
    pub category: Option<NotificationCategory>,
    /// Derived semantic kind.
    pub kind: NotificationKind,
    /// Derived priority.
    pub priority: Priority,
    /// Navigation target.
    pub action_url: Option<String>,
    /// Label for the navigation target.
    pub action_label: Option<String>,
    /// Entity references for the action handler.
    #[serde(default)]
    pub payload: NotificationPayload,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Read state.
    pub read_state: ReadState,
    /// When the notification was read.
    pub read_at: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// Check if the notification is unread.
    pub fn is_unread(&self) -> bool {
        self.read_state == ReadState::Unread
    }

    /// Check if the notification has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Whether this record contributes to the unread badge at `now`.
    pub fn counts_as_unread(&self, now: DateTime<Utc>) -> bool {
        self.is_unread() && !self.is_expired_at(now)
    }

    /// Transition to `Read`. Returns `false` if it was already read.
    pub fn mark_read(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_unread() {
            self.read_state = ReadState::Read;
            self.read_at = Some(at);
            true
        } else {
            false
        }
    }

    /// Fold a newer copy of the same record into a replacement value.
    ///
    /// Fields come from `incoming`, except the read state, which never moves
    /// backwards: a record already read locally stays read.
    pub fn merged_with(&self, mut incoming: NotificationRecord) -> NotificationRecord {
        if self.read_state > incoming.read_state {
            incoming.read_state = self.read_state;
            incoming.read_at = self.read_at;
        }
        incoming
    }

    /// Presentation order: newest first, ties broken by id (descending).
    pub fn display_order(&self, other: &Self) -> Ordering {
        other
            .created_at
            .cmp(&self.created_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}


#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::fixtures::record;
    use super::*;

    #[test]
    fn test_mark_read_is_monotonic() {
        let now = Utc::now();
        let mut r = record(UserId::new(), None, now);
        assert!(r.mark_read(now));
        assert!(!r.mark_read(now + Duration::seconds(5)));
        assert_eq!(r.read_state, ReadState::Read);
        assert_eq!(r.read_at, Some(now));
    }

    #[test]
    fn test_merge_never_regresses_read_state() {
        let now = Utc::now();
        let mut local = record(UserId::new(), None, now);
        local.mark_read(now);

        let mut incoming = local.clone();
        incoming.read_state = ReadState::Unread;
        incoming.read_at = None;
        incoming.title = "edited".to_string();

        let merged = local.merged_with(incoming);
        assert_eq!(merged.read_state, ReadState::Read);
        assert_eq!(merged.title, "edited");
    }

    #[test]
    fn test_expired_records_do_not_count() {
        let now = Utc::now();
        let mut r = record(UserId::new(), None, now - Duration::hours(2));
        r.expires_at = Some(now - Duration::hours(1));
        assert!(r.is_expired_at(now));
        assert!(!r.counts_as_unread(now));
    }

    #[test]
    fn test_display_order_newest_first() {
        let now = Utc::now();
        let user = UserId::new();
        let older = record(user, None, now - Duration::minutes(1));
        let newer = record(user, None, now);
        assert_eq!(newer.display_order(&older), Ordering::Less);
        assert_eq!(older.display_order(&newer), Ordering::Greater);
    }
}
