use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRef, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::accounts::{AccountDirectory, Identity};

use super::domain::{Category, ImageId, ListingId};
use super::filter::SearchParams;
use super::form::ListingForm;
use super::gallery::GalleryError;
use super::guard::AccessDenied;
use super::locations;
use super::repository::{ListingRepository, RepositoryError};
use super::service::{ListingService, ListingServiceError, ReorderEntry};
use super::storage::{ImageStore, UploadCandidate};

/// Multipart field carrying listing photos.
pub const PHOTO_FIELD: &str = "fotos";

/// Routes for browsing and managing listings. The state must expose the listing service and
/// the account directory used to resolve sessions.
pub fn listing_routes<R, S, St>() -> Router<St>
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
    St: Clone + Send + Sync + 'static,
    Arc<ListingService<R, S>>: FromRef<St>,
    Arc<dyn AccountDirectory>: FromRef<St>,
{
    Router::new()
        .route("/", get(search_handler::<R, S>))
        .route("/huizen", get(houses_handler::<R, S>))
        .route("/percelen", get(plots_handler::<R, S>))
        .route("/api/wijken/:district", get(sub_districts_handler))
        .route("/dashboard", get(dashboard_handler::<R, S>))
        .route("/add_property", post(create_handler::<R, S>))
        .route("/property/:listing_id", get(detail_handler::<R, S>))
        .route("/property/:listing_id/edit", post(update_handler::<R, S>))
        .route("/property/:listing_id/delete", post(delete_handler::<R, S>))
        .route(
            "/property/:listing_id/toggle_status",
            post(toggle_status_handler::<R, S>),
        )
        .route(
            "/property/image/:image_id/delete",
            post(delete_image_handler::<R, S>),
        )
        .route(
            "/property/image/:image_id/set-primary",
            post(set_primary_handler::<R, S>),
        )
        .route("/property/image/reorder", post(reorder_handler::<R, S>))
}

pub(crate) async fn search_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    Query(params): Query<SearchParams>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    search_response(&service, &params, None)
}

pub(crate) async fn houses_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    Query(params): Query<SearchParams>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    search_response(&service, &params, Some(Category::House))
}

pub(crate) async fn plots_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    Query(params): Query<SearchParams>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    search_response(&service, &params, Some(Category::Plot))
}

fn search_response<R, S>(
    service: &ListingService<R, S>,
    params: &SearchParams,
    scope: Option<Category>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    match service.search(params, scope) {
        Ok(results) => (StatusCode::OK, Json(results)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn sub_districts_handler(Path(district): Path<String>) -> Response {
    Json(locations::sub_districts(&district)).into_response()
}

pub(crate) async fn dashboard_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    identity: Identity,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    match service.dashboard(&identity) {
        Ok(cards) => (StatusCode::OK, Json(json!({ "listings": cards }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detail_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    identity: Identity,
    Path(listing_id): Path<u64>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    match service.detail(&identity, ListingId(listing_id)) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    identity: Identity,
    multipart: Multipart,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    if !identity.is_authenticated() {
        return error_response(AccessDenied::Unauthenticated.into());
    }
    let (form, uploads) = match read_listing_upload(multipart).await {
        Ok(parts) => parts,
        Err(rejection) => return rejection,
    };

    match service.create(&identity, &form, uploads) {
        Ok(detail) => (StatusCode::CREATED, Json(detail)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    identity: Identity,
    Path(listing_id): Path<u64>,
    multipart: Multipart,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    let (form, uploads) = match read_listing_upload(multipart).await {
        Ok(parts) => parts,
        Err(rejection) => return rejection,
    };

    match service.update(&identity, ListingId(listing_id), &form, uploads) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    identity: Identity,
    Path(listing_id): Path<u64>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    match service.delete(&identity, ListingId(listing_id)) {
        Ok(()) => {
            let payload = json!({ "success": true, "deleted": listing_id });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn toggle_status_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    identity: Identity,
    Path(listing_id): Path<u64>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    match service.toggle_status(&identity, ListingId(listing_id)) {
        Ok(status) => {
            let payload = json!({ "success": true, "status": status });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_image_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    identity: Identity,
    Path(image_id): Path<u64>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    match service.delete_image(&identity, ImageId(image_id)) {
        Ok(removal) => {
            let payload = json!({
                "success": true,
                "removed": removal.removed,
                "new_primary_id": removal.new_primary_id,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn set_primary_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    identity: Identity,
    Path(image_id): Path<u64>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    match service.set_primary(&identity, ImageId(image_id)) {
        Ok(image_id) => {
            let payload = json!({ "success": true, "image_id": image_id });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReorderRequest {
    order: Vec<ReorderEntry>,
}

pub(crate) async fn reorder_handler<R, S>(
    State(service): State<Arc<ListingService<R, S>>>,
    identity: Identity,
    body: Result<Json<ReorderRequest>, JsonRejection>,
) -> Response
where
    R: ListingRepository + 'static,
    S: ImageStore + 'static,
{
    let Ok(Json(request)) = body else {
        let payload = json!({ "success": false, "error": "invalid data" });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    };

    match service.reorder(&identity, &request.order) {
        Ok(applied) => {
            let payload = json!({ "success": true, "applied": applied });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Split a listing form post into its text fields and its photo parts.
async fn read_listing_upload(
    mut multipart: Multipart,
) -> Result<(ListingForm, Vec<UploadCandidate>), Response> {
    let mut form = ListingForm::default();
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(IntoResponse::into_response)?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == PHOTO_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(IntoResponse::into_response)?;
            // An empty file input still posts a nameless part.
            if !file_name.is_empty() {
                uploads.push(UploadCandidate::new(file_name, bytes.to_vec()));
            }
        } else {
            let value = field.text().await.map_err(IntoResponse::into_response)?;
            form.set(&name, value);
        }
    }

    Ok((form, uploads))
}

fn error_response(err: ListingServiceError) -> Response {
    match err {
        ListingServiceError::Validation(fields) => {
            let payload = json!({
                "success": false,
                "error": "fill in all required fields",
                "fields": fields,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        ListingServiceError::Access(AccessDenied::Unauthenticated) => {
            let payload = json!({
                "success": false,
                "error": AccessDenied::Unauthenticated.to_string(),
                "redirect": "/login",
            });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
        ListingServiceError::Access(AccessDenied::Forbidden) => {
            let payload = json!({
                "success": false,
                "error": AccessDenied::Forbidden.to_string(),
            });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        ListingServiceError::ListingNotFound(_)
        | ListingServiceError::ImageNotFound(_)
        | ListingServiceError::Gallery(GalleryError::UnknownImage(_))
        | ListingServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "success": false, "error": err.to_string() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        ListingServiceError::Gallery(GalleryError::CapacityExceeded { max, .. }) => {
            let payload = json!({
                "success": false,
                "error": err.to_string(),
                "max_photos": max,
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "success": false, "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
