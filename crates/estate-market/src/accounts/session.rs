use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{request::Parts, StatusCode};
use tower_sessions::cookie::{time::Duration, SameSite};
use tower_sessions::{session, Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing::warn;

use super::domain::UserId;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session";

/// Session key holding the signed-in account.
pub const SESSION_USER_KEY: &str = "user_id";

/// Sessions idle for longer than this are dropped.
pub const SESSION_IDLE_DAYS: i64 = 7;

/// HTTP-only session layer backed by an in-process store.
pub fn session_layer(secure: bool) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_path("/")
        .with_http_only(true)
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_IDLE_DAYS)))
}

/// Bind `user` to the request's session.
pub async fn sign_in(session: &Session, user: UserId) -> Result<(), session::Error> {
    session.insert(SESSION_USER_KEY, user).await
}

/// Drop the session and its stored data. Idempotent.
pub async fn sign_out(session: &Session) -> Result<(), session::Error> {
    session.flush().await
}

/// Answers whether the account behind a session still exists.
pub trait AccountDirectory: Send + Sync {
    fn is_registered(&self, id: UserId) -> bool;
}

/// Who is making the request, resolved from the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity {
    user: Option<UserId>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn user(id: UserId) -> Self {
        Self { user: Some(id) }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Sessions of removed accounts resolve to an anonymous visitor.
    pub async fn resolve(session: &Session, accounts: &dyn AccountDirectory) -> Self {
        match session.get::<UserId>(SESSION_USER_KEY).await {
            Ok(Some(id)) if accounts.is_registered(id) => Self::user(id),
            Ok(_) => Self::anonymous(),
            Err(err) => {
                warn!(error = %err, "unreadable session treated as anonymous");
                Self::anonymous()
            }
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    Arc<dyn AccountDirectory>: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let accounts = Arc::<dyn AccountDirectory>::from_ref(state);
        Ok(Self::resolve(&session, accounts.as_ref()).await)
    }
}
