use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::listings::{
    AccessDenied, ImageStore, ListingRepository, ListingService, ListingServiceError,
    RepositoryError,
};

use super::domain::{NewUser, UserId, UserProfile};
use super::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use super::repository::UserRepository;
use super::session::{AccountDirectory, Identity};

/// Registration form as posted by the sign-up page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default, rename = "naam")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "password_confirm")]
    pub confirmation: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Account registration, authentication and removal.
pub struct AccountService<U> {
    users: Arc<U>,
}

impl<U> AccountService<U>
where
    U: UserRepository + 'static,
{
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    /// The caller binds the returned account to its session.
    pub fn register(&self, registration: &Registration) -> Result<UserProfile, AccountError> {
        let name = registration.name.trim();
        let email = registration.email.trim();
        if name.is_empty()
            || email.is_empty()
            || registration.password.is_empty()
            || registration.confirmation.is_empty()
        {
            return Err(AccountError::MissingFields);
        }
        if registration.password != registration.confirmation {
            return Err(AccountError::PasswordMismatch);
        }
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::PasswordTooShort);
        }
        if self.users.find_by_email(email)?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let password_hash =
            hash_password(&registration.password).map_err(AccountError::Hashing)?;
        let user = self
            .users
            .insert_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => AccountError::EmailTaken,
                other => AccountError::Repository(other),
            })?;

        info!(user = %user.id, "account registered");
        Ok(user.profile())
    }

    pub fn login(&self, credentials: &Credentials) -> Result<UserProfile, AccountError> {
        let email = credentials.email.trim();
        if email.is_empty() || credentials.password.is_empty() {
            return Err(AccountError::MissingFields);
        }

        let user = match self.users.find_by_email(email)? {
            Some(user) if verify_password(&credentials.password, &user.password_hash) => user,
            _ => {
                warn!("failed login attempt");
                return Err(AccountError::InvalidCredentials);
            }
        };

        info!(user = %user.id, "logged in");
        Ok(user.profile())
    }

    pub fn profile(&self, identity: &Identity) -> Result<UserProfile, AccountError> {
        let id = identity.user_id().ok_or(AccessDenied::Unauthenticated)?;
        self.users
            .fetch_user(id)?
            .map(|user| user.profile())
            .ok_or(AccountError::Access(AccessDenied::Unauthenticated))
    }

    /// Listings go first, through the regular deletion procedure, then the account. Sessions
    /// still naming the account stop resolving once the record is gone. Returns how many
    /// listings were removed.
    pub fn delete_account<R, S>(
        &self,
        identity: &Identity,
        listings: &ListingService<R, S>,
    ) -> Result<usize, AccountError>
    where
        R: ListingRepository + 'static,
        S: ImageStore + 'static,
    {
        let id = identity.user_id().ok_or(AccessDenied::Unauthenticated)?;
        if self.users.fetch_user(id)?.is_none() {
            return Err(AccountError::Access(AccessDenied::Unauthenticated));
        }

        let removed = listings.delete_all_for(id)?;
        self.users.remove_user(id)?;

        info!(user = %id, listings = removed, "account deleted");
        Ok(removed)
    }
}

impl<U> AccountDirectory for AccountService<U>
where
    U: UserRepository + 'static,
{
    fn is_registered(&self, id: UserId) -> bool {
        match self.users.fetch_user(id) {
            Ok(user) => user.is_some(),
            Err(err) => {
                warn!(user = %id, error = %err, "account lookup failed");
                false
            }
        }
    }
}

/// Error raised by account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("all fields are required")]
    MissingFields,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("email address is already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Access(#[from] AccessDenied),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Listings(#[from] ListingServiceError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("session store failed: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::{FsImageStore, ListingForm, UploadCandidate};
    use crate::store::MarketStore;

    fn accounts() -> (AccountService<MarketStore>, Arc<MarketStore>) {
        let store = Arc::new(MarketStore::in_memory());
        let service = AccountService::new(store.clone());
        (service, store)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: " Anita ".to_string(),
            email: format!(" {email} "),
            password: "geheim1".to_string(),
            confirmation: "geheim1".to_string(),
        }
    }

    #[test]
    fn register_trims_and_hashes() {
        let (service, store) = accounts();
        let profile = service.register(&registration("anita@example.sr")).expect("registered");

        assert_eq!(profile.name, "Anita");
        assert_eq!(profile.email, "anita@example.sr");
        assert!(service.is_registered(profile.id));

        let stored = store
            .find_by_email("anita@example.sr")
            .expect("query")
            .expect("stored");
        assert_ne!(stored.password_hash, "geheim1");
    }

    #[test]
    fn register_rejects_each_invalid_form() {
        let (service, _) = accounts();

        let mut missing = registration("a@example.sr");
        missing.name = "   ".to_string();
        assert!(matches!(service.register(&missing), Err(AccountError::MissingFields)));

        let mut mismatch = registration("a@example.sr");
        mismatch.confirmation = "geheim2".to_string();
        assert!(matches!(service.register(&mismatch), Err(AccountError::PasswordMismatch)));

        let mut short = registration("a@example.sr");
        short.password = "kort".to_string();
        short.confirmation = "kort".to_string();
        assert!(matches!(service.register(&short), Err(AccountError::PasswordTooShort)));

        service.register(&registration("a@example.sr")).expect("first registration");
        assert!(matches!(
            service.register(&registration("a@example.sr")),
            Err(AccountError::EmailTaken)
        ));
    }

    #[test]
    fn login_does_not_reveal_which_part_was_wrong() {
        let (service, _) = accounts();
        service.register(&registration("a@example.sr")).expect("registered");

        let wrong_password = Credentials {
            email: "a@example.sr".to_string(),
            password: "verkeerd".to_string(),
        };
        let unknown_email = Credentials {
            email: "b@example.sr".to_string(),
            password: "geheim1".to_string(),
        };
        let first = service.login(&wrong_password).expect_err("wrong password");
        let second = service.login(&unknown_email).expect_err("unknown email");
        assert_eq!(first.to_string(), second.to_string());

        let good = Credentials {
            email: "a@example.sr".to_string(),
            password: "geheim1".to_string(),
        };
        let profile = service.login(&good).expect("logged in");
        assert_eq!(profile.email, "a@example.sr");
    }

    #[test]
    fn delete_account_cascades_listings_then_user() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(MarketStore::in_memory());
        let images = Arc::new(FsImageStore::open(dir.path()).expect("upload dir"));
        let accounts = AccountService::new(store.clone());
        let listings = ListingService::new(store.clone(), images.clone());

        let profile = accounts.register(&registration("a@example.sr")).expect("registered");
        let identity = Identity::user(profile.id);
        let form = ListingForm {
            title: Some("Woning".to_string()),
            category: Some("huis".to_string()),
            status: Some("te huur".to_string()),
            price: Some("750".to_string()),
            district: Some("Wanica".to_string()),
            ..ListingForm::default()
        };
        listings
            .create(&identity, &form, vec![UploadCandidate::new("a.jpg", b"jpg".to_vec())])
            .expect("listing published");
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 1);

        let removed = accounts.delete_account(&identity, &listings).expect("deleted");
        assert_eq!(removed, 1);
        assert!(store.fetch_user(profile.id).expect("query").is_none());
        assert!(store.listings_by_owner(profile.id).expect("query").is_empty());
        assert!(!accounts.is_registered(profile.id));
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);

        assert!(matches!(
            accounts.delete_account(&Identity::anonymous(), &listings),
            Err(AccountError::Access(AccessDenied::Unauthenticated))
        ));
    }
}
