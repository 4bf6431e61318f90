use crate::accounts::{Identity, UserId};

use super::domain::Listing;

/// Reasons a mutation is refused before it touches a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("log in first")]
    Unauthenticated,
    #[error("you do not have access to this listing")]
    Forbidden,
}

/// Ownership check, re-derived from the listing on every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipGuard;

impl OwnershipGuard {
    pub fn require_user(&self, identity: &Identity) -> Result<UserId, AccessDenied> {
        identity.user_id().ok_or(AccessDenied::Unauthenticated)
    }

    pub fn authorize(&self, identity: &Identity, listing: &Listing) -> Result<UserId, AccessDenied> {
        let user = self.require_user(identity)?;
        if listing.owner == user {
            Ok(user)
        } else {
            Err(AccessDenied::Forbidden)
        }
    }
}
