//! # notifyhub-database
//!
//! The persistence API consumed by the notification center
//! ([`traits::NotificationPersistence`]) together with two backends:
//!
//! - [`repositories::PgNotificationRepository`]: PostgreSQL via sqlx, with a
//!   per-recipient `LISTEN/NOTIFY` change feed
//! - [`memory::MemoryNotificationRepository`]: in-process, for single-node
//!   deployments and tests

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod traits;

pub use connection::DatabasePool;
pub use memory::MemoryNotificationRepository;
pub use repositories::{PgDirectoryRepository, PgNotificationRepository};
pub use traits::{
    ChangeEvent, ChangeFeed, DigestDirectory, DigestSubscriber, NotificationPersistence,
    NotificationQuerySpec, RecipientDirectory,
};
