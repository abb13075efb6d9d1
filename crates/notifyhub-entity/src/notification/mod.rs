//! Notification domain entities.

pub mod category;
pub mod classifier;
pub mod filter;
pub mod kind;
pub mod model;
pub mod payload;
pub mod preference;

pub use category::{NotificationCategory, RawType};
pub use classifier::Classification;
pub use filter::NotificationFilter;
pub use kind::{NotificationKind, Priority};
pub use model::{NotificationRecord, ReadState};
pub use payload::NotificationPayload;
pub use preference::NotificationPreference;
