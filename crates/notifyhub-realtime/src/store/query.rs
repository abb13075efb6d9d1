//! Lazily filtered views over a store snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use notifyhub_entity::{NotificationFilter, NotificationRecord};

/// Result of [`NotificationStore::query`](super::NotificationStore::query).
///
/// Holds an immutable snapshot in display order (newest first, ties broken
/// by id descending). Filtering happens while iterating, and every call to
/// [`iter`](Self::iter) starts over from the beginning.
#[derive(Debug, Clone)]
pub struct NotificationQuery {
    snapshot: Arc<[NotificationRecord]>,
    filter: NotificationFilter,
    now: DateTime<Utc>,
}

impl NotificationQuery {
    pub(crate) fn new(
        snapshot: Arc<[NotificationRecord]>,
        filter: NotificationFilter,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            snapshot,
            filter,
            now,
        }
    }

    /// Iterate the matching records.
    pub fn iter(&self) -> QueryIter<'_> {
        QueryIter {
            records: self.snapshot.iter(),
            filter: &self.filter,
            now: self.now,
            remaining: self.filter.limit.unwrap_or(usize::MAX),
        }
    }

    /// Collect the matching records.
    pub fn to_vec(&self) -> Vec<NotificationRecord> {
        self.iter().cloned().collect()
    }

    /// Number of matching records.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Whether nothing matches.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<'a> IntoIterator for &'a NotificationQuery {
    type Item = &'a NotificationRecord;
    type IntoIter = QueryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the records of a [`NotificationQuery`].
#[derive(Debug)]
pub struct QueryIter<'a> {
    records: std::slice::Iter<'a, NotificationRecord>,
    filter: &'a NotificationFilter,
    now: DateTime<Utc>,
    remaining: usize,
}

impl<'a> Iterator for QueryIter<'a> {
    type Item = &'a NotificationRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (filter, now) = (self.filter, self.now);
        let next = self
            .records
            .by_ref()
            .find(|record| filter.matches(record, now))?;
        self.remaining -= 1;
        Some(next)
    }
}
