//! In-memory persistence for single-node deployments and tests.

pub mod repository;

pub use repository::MemoryNotificationRepository;
