//! # notifyhub-service
//!
//! Writer-side services for the notification center. The
//! [`NotificationDispatcher`] is the single entry point producers use to
//! create notifications; it persists first and treats the email channel as
//! best-effort. The [`DigestGenerator`] builds weekly summaries from
//! persisted history.
//!
//! Services follow constructor injection: all collaborators are provided
//! at construction time via `Arc` references.

pub mod digest;
pub mod dispatch;
pub mod email;
pub mod templates;

pub use digest::{DigestGenerator, OpportunityMatch, WeeklyDigest};
pub use dispatch::{BulkDispatchReport, NotificationDispatcher, NotificationDraft};
pub use email::{EmailChannel, HttpEmailTransport, LogEmailTransport};
pub use templates::NotificationTemplates;
