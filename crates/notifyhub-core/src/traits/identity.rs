//! Current-user identity trait.

use crate::types::id::UserId;

/// Supplies the identity of the user owning the current session.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` when nobody is signed in.
    fn current_user(&self) -> Option<UserId>;
}

impl IdentityProvider for Option<UserId> {
    fn current_user(&self) -> Option<UserId> {
        *self
    }
}
