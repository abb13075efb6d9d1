//! Handle for a read-state change still being persisted.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

/// How a read-state change ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncOutcome {
    /// Nothing changed locally, so nothing was persisted.
    Unchanged,
    /// Persistence accepted the change.
    Acknowledged,
    /// Persistence failed. The local read state is kept.
    LocalOnly,
}

/// Resolves once persistence has acknowledged or rejected a read-state
/// change. The store was already updated when this was returned.
///
/// Dropping it does not cancel the write.
#[derive(Debug)]
#[must_use = "await the PendingSync or drop it to let the write finish in the background"]
pub struct PendingSync {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Ready(Option<SyncOutcome>),
    Spawned(JoinHandle<SyncOutcome>),
}

impl PendingSync {
    pub(crate) fn ready(outcome: SyncOutcome) -> Self {
        Self {
            inner: Inner::Ready(Some(outcome)),
        }
    }

    pub(crate) fn spawned(handle: JoinHandle<SyncOutcome>) -> Self {
        Self {
            inner: Inner::Spawned(handle),
        }
    }
}

impl Future for PendingSync {
    type Output = SyncOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.inner {
            Inner::Ready(outcome) => Poll::Ready(outcome.take().unwrap_or(SyncOutcome::Unchanged)),
            Inner::Spawned(handle) => Pin::new(handle)
                .poll(cx)
                .map(|joined| joined.unwrap_or(SyncOutcome::LocalOnly)),
        }
    }
}
