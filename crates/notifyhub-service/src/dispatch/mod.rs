//! Dispatch facade: the single writer-side entry point.

pub mod dispatcher;
pub mod draft;
pub mod report;

pub use dispatcher::NotificationDispatcher;
pub use draft::NotificationDraft;
pub use report::BulkDispatchReport;
