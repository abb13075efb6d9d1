//! Collaborator traits defined in `notifyhub-core` and implemented by
//! other crates or by the embedding application.

pub mod email;
pub mod identity;
pub mod navigation;

pub use email::EmailTransport;
pub use identity::IdentityProvider;
pub use navigation::Navigator;
