use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::accounts::{account_routes, AccountDirectory, AccountService, UserRepository};
use crate::config::MAX_REQUEST_BYTES;
use crate::listings::{listing_routes, ImageStore, ListingRepository, ListingService};

/// Message shown when a request exceeds the payload limit.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Files are too large. A maximum of 16MB is allowed.";

/// Shared state behind every marketplace route.
pub struct MarketState<R, U, S> {
    pub listings: Arc<ListingService<R, S>>,
    pub accounts: Arc<AccountService<U>>,
}

impl<R, U, S> MarketState<R, U, S>
where
    R: ListingRepository + 'static,
    U: UserRepository + 'static,
    S: ImageStore + 'static,
{
    pub fn new(listings: Arc<R>, users: Arc<U>, images: Arc<S>) -> Self {
        Self {
            listings: Arc::new(ListingService::new(listings, images)),
            accounts: Arc::new(AccountService::new(users)),
        }
    }
}

impl<R, U, S> Clone for MarketState<R, U, S> {
    fn clone(&self) -> Self {
        Self {
            listings: self.listings.clone(),
            accounts: self.accounts.clone(),
        }
    }
}

impl<R, U, S> FromRef<MarketState<R, U, S>> for Arc<ListingService<R, S>> {
    fn from_ref(state: &MarketState<R, U, S>) -> Self {
        state.listings.clone()
    }
}

impl<R, U, S> FromRef<MarketState<R, U, S>> for Arc<AccountService<U>> {
    fn from_ref(state: &MarketState<R, U, S>) -> Self {
        state.accounts.clone()
    }
}

impl<R, U, S> FromRef<MarketState<R, U, S>> for Arc<dyn AccountDirectory>
where
    U: UserRepository + 'static,
{
    fn from_ref(state: &MarketState<R, U, S>) -> Self {
        state.accounts.clone()
    }
}

/// Full marketplace router with sessions and the request size limit applied.
pub fn market_router<R, U, S>(
    state: MarketState<R, U, S>,
    sessions: SessionManagerLayer<MemoryStore>,
) -> Router
where
    R: ListingRepository + 'static,
    U: UserRepository + 'static,
    S: ImageStore + 'static,
{
    Router::new()
        .merge(listing_routes::<R, S, MarketState<R, U, S>>())
        .merge(account_routes::<U, R, S, MarketState<R, U, S>>())
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(middleware::map_response(payload_too_large))
        .layer(sessions)
        .with_state(state)
}

async fn payload_too_large(response: Response) -> Response {
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }
    let payload = json!({ "success": false, "error": PAYLOAD_TOO_LARGE_MESSAGE });
    (StatusCode::PAYLOAD_TOO_LARGE, Json(payload)).into_response()
}
