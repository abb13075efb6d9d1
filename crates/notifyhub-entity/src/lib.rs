//! # notifyhub-entity
//!
//! Domain models for the notification center: the notification record and
//! its enums, the typed payload union, store filters, per-user channel
//! preferences, digest watermarks, and open opportunities. The
//! [`notification::classifier`] module is the single source of truth for
//! deriving a notification's kind and priority.

pub mod digest;
pub mod notification;
pub mod opportunity;

pub use digest::DigestWatermark;
pub use notification::{
    Classification, NotificationCategory, NotificationFilter, NotificationKind,
    NotificationPayload, NotificationPreference, NotificationRecord, Priority, RawType, ReadState,
};
pub use opportunity::Opportunity;
