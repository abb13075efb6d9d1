//! Per-session notification store.

pub mod query;
pub mod state;
pub mod subscription;

pub use query::{NotificationQuery, QueryIter};
pub use state::NotificationStore;
pub use subscription::{StoreChange, Subscription};
