//! Change-feed synchronization into the store.

pub mod engine;
pub mod status;

pub use engine::{RealtimeSyncEngine, SyncHandle};
pub use status::SyncStatus;
