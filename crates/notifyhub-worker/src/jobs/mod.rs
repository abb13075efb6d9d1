//! Built-in job handler implementations.

pub mod digest;
pub mod notification;

pub use digest::{DigestJobHandler, WEEKLY_DIGEST};
pub use notification::{NOTIFICATION_CLEANUP, NotificationJobHandler};
