//! Digest watermark: how far a recipient's notifications have been digested.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use notifyhub_core::types::id::{NotificationId, UserId};

use crate::notification::model::NotificationRecord;

/// Marks the point up to which a recipient's notifications were counted.
///
/// Records created before `digested_through` are covered. Records created at
/// exactly `digested_through` are covered only if listed in `boundary_ids`,
/// so two records sharing a timestamp are never both skipped or both
/// double-counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestWatermark {
    /// The recipient.
    pub recipient_id: UserId,
    /// Creation time of the newest record already digested.
    pub digested_through: DateTime<Utc>,
    /// Ids already digested whose `created_at == digested_through`.
    #[serde(default)]
    pub boundary_ids: Vec<NotificationId>,
}

impl DigestWatermark {
    /// Whether `record` was already counted by a previous run.
    pub fn covers(&self, record: &NotificationRecord) -> bool {
        record.created_at < self.digested_through
            || (record.created_at == self.digested_through
                && self.boundary_ids.contains(&record.id))
    }

    /// Advance past the records just counted. Never moves backwards.
    pub fn advance<'a>(
        previous: Option<&DigestWatermark>,
        recipient_id: UserId,
        counted: impl IntoIterator<Item = &'a NotificationRecord>,
    ) -> Option<DigestWatermark> {
        let mut next = previous.cloned();

        for record in counted {
            match next.as_mut() {
                Some(mark) if record.created_at < mark.digested_through => {}
                Some(mark) if record.created_at == mark.digested_through => {
                    if !mark.boundary_ids.contains(&record.id) {
                        mark.boundary_ids.push(record.id);
                    }
                }
                _ => {
                    next = Some(DigestWatermark {
                        recipient_id,
                        digested_through: record.created_at,
                        boundary_ids: vec![record.id],
                    });
                }
            }
        }

        next
    }
}
