use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use tower_sessions::Session;

use crate::listings::{AccessDenied, ImageStore, ListingRepository, ListingService};

use super::repository::UserRepository;
use super::service::{AccountError, AccountService, Credentials, Registration};
use super::session::{sign_in, sign_out, AccountDirectory, Identity};

/// Registration, login, logout and account removal.
pub fn account_routes<U, R, S, St>() -> Router<St>
where
    U: UserRepository + 'static,
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    St: Clone + Send + Sync + 'static,
    Arc<AccountService<U>>: FromRef<St>,
    Arc<ListingService<R, S>>: FromRef<St>,
    Arc<dyn AccountDirectory>: FromRef<St>,
{
    Router::new()
        .route("/register", post(register_handler::<U>))
        .route("/login", post(login_handler::<U>))
        .route("/logout", get(logout_handler).post(logout_handler))
        .route("/session", get(session_handler::<U>))
        .route("/account/delete", post(delete_account_handler::<U, R, S>))
}

pub(crate) async fn register_handler<U>(
    State(service): State<Arc<AccountService<U>>>,
    session: Session,
    Form(registration): Form<Registration>,
) -> Response
where
    U: UserRepository + 'static,
{
    let signed_in = match service.register(&registration) {
        Ok(profile) => sign_in(&session, profile.id).await.map(|()| profile),
        Err(err) => return error_response(err),
    };
    match signed_in {
        Ok(profile) => (StatusCode::CREATED, Json(profile)).into_response(),
        Err(err) => error_response(err.into()),
    }
}

pub(crate) async fn login_handler<U>(
    State(service): State<Arc<AccountService<U>>>,
    session: Session,
    Form(credentials): Form<Credentials>,
) -> Response
where
    U: UserRepository + 'static,
{
    let signed_in = match service.login(&credentials) {
        Ok(profile) => sign_in(&session, profile.id).await.map(|()| profile),
        Err(err) => return error_response(err),
    };
    match signed_in {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => error_response(err.into()),
    }
}

pub(crate) async fn logout_handler(session: Session) -> Response {
    match sign_out(&session).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => error_response(err.into()),
    }
}

pub(crate) async fn session_handler<U>(
    State(service): State<Arc<AccountService<U>>>,
    identity: Identity,
) -> Response
where
    U: UserRepository + 'static,
{
    match service.profile(&identity) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_account_handler<U, R, S>(
    State(accounts): State<Arc<AccountService<U>>>,
    State(listings): State<Arc<ListingService<R, S>>>,
    identity: Identity,
    session: Session,
) -> Response
where
    U: UserRepository + 'static,
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    let removed = match accounts.delete_account(&identity, &listings) {
        Ok(removed) => removed,
        Err(err) => return error_response(err),
    };
    match sign_out(&session).await {
        Ok(()) => {
            let payload = json!({ "success": true, "listings_removed": removed });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err.into()),
    }
}

fn error_response(err: AccountError) -> Response {
    match err {
        AccountError::MissingFields
        | AccountError::PasswordMismatch
        | AccountError::PasswordTooShort => {
            let payload = json!({ "success": false, "error": err.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        AccountError::EmailTaken => {
            let payload = json!({ "success": false, "error": err.to_string() });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        AccountError::InvalidCredentials => {
            let payload = json!({ "success": false, "error": err.to_string() });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
        AccountError::Access(AccessDenied::Unauthenticated) => {
            let payload = json!({
                "success": false,
                "error": err.to_string(),
                "redirect": "/login",
            });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "success": false, "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
