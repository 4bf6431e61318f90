use crate::listings::RepositoryError;

use super::domain::{NewUser, User, UserId};

/// Account storage.
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    /// Fails with `Conflict` while the user still owns listings.
    fn remove_user(&self, id: UserId) -> Result<(), RepositoryError>;
}
