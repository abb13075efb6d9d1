//! Optimistic read-state changes and notification action handling.

pub mod action;
pub mod pending;
pub mod synchronizer;

pub use action::{ActionTarget, resolve_action};
pub use pending::{PendingSync, SyncOutcome};
pub use synchronizer::ReadStateSynchronizer;
