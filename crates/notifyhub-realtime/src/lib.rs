//! # notifyhub-realtime
//!
//! The reader side of the notification center, scoped to one signed-in
//! user:
//!
//! - [`NotificationStore`]: the in-memory record set every surface renders
//!   from, with a maintained unread count
//! - [`RealtimeSyncEngine`]: keeps the store current from the persistence
//!   change feed, re-seeding after every reconnect
//! - [`ReadStateSynchronizer`]: optimistic read-state changes with
//!   background persistence, plus centralized action resolution
//! - [`ToastFeed`]: transient toasts with repeat suppression
//! - [`NotificationSession`]: owns all of the above for one login

pub mod read_state;
pub mod session;
pub mod store;
pub mod sync;
pub mod toast;

pub use read_state::{ActionTarget, PendingSync, ReadStateSynchronizer, SyncOutcome};
pub use session::{NotificationSession, SessionDeps};
pub use store::{NotificationQuery, NotificationStore, StoreChange, Subscription};
pub use sync::{RealtimeSyncEngine, SyncHandle, SyncStatus};
pub use toast::ToastFeed;
