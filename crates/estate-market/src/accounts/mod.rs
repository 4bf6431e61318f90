//! Accounts, password hashing and cookie sessions.

pub mod domain;
pub mod password;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;

pub use domain::{NewUser, User, UserId, UserProfile};
pub use repository::UserRepository;
pub use router::account_routes;
pub use service::{AccountError, AccountService, Credentials, Registration};
pub use session::{session_layer, AccountDirectory, Identity, SESSION_COOKIE};
