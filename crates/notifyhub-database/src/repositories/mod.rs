//! PostgreSQL repository implementations.

pub mod directory;
pub mod notification;

pub use directory::PgDirectoryRepository;
pub use notification::PgNotificationRepository;
