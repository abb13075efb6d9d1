//! Outcome of a bulk dispatch.

use notifyhub_core::error::AppError;
use notifyhub_core::types::id::UserId;
use notifyhub_entity::NotificationRecord;

/// Per-recipient result of [`notify_many`](super::NotificationDispatcher::notify_many).
///
/// Successful writes are never rolled back when other recipients fail.
#[derive(Debug, Clone, Default)]
pub struct BulkDispatchReport {
    /// Records that were persisted.
    pub delivered: Vec<NotificationRecord>,
    /// Recipients whose record could not be persisted.
    pub failed: Vec<(UserId, AppError)>,
}

impl BulkDispatchReport {
    /// Whether every recipient's record was persisted.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of recipients attempted.
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    /// Recipients whose record could not be persisted.
    pub fn failed_recipients(&self) -> impl Iterator<Item = UserId> + '_ {
        self.failed.iter().map(|(user, _)| *user)
    }
}
