use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use estate_market::listings::ImageExtension;
use serde_json::json;
use std::io::ErrorKind;
use std::sync::atomic::Ordering;
use tracing::warn;

pub(crate) fn with_service_routes(router: Router) -> Router {
    router
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/uploads/:file_name", get(upload_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Serve a stored listing photo.
pub(crate) async fn upload_endpoint(
    Extension(state): Extension<AppState>,
    Path(file_name): Path<String>,
) -> Response {
    let (Some(location), Some(extension)) = (
        state.uploads.resolve(&file_name),
        ImageExtension::from_file_name(&file_name),
    ) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&location).await {
        Ok(bytes) => {
            let mime = extension.mime();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.essence_str().to_string())],
                bytes,
            )
                .into_response()
        }
        Err(err) if err.kind() == ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            warn!(file = %file_name, %err, "failed to read stored photo");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use estate_market::listings::{FsImageStore, ImageStore};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(uploads: FsImageStore, ready: bool) -> Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            uploads: Arc::new(uploads),
        };
        with_service_routes(Router::new()).layer(Extension(state))
    }

    async fn get_status(router: Router, uri: &str) -> StatusCode {
        router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("route executes")
            .status()
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsImageStore::open(dir.path()).expect("upload dir");

        assert_eq!(
            get_status(app(store.clone(), false), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(get_status(app(store.clone(), true), "/ready").await, StatusCode::OK);
        assert_eq!(get_status(app(store, true), "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn stored_photos_are_served_with_their_content_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsImageStore::open(dir.path()).expect("upload dir");
        let path = store.save(b"\x89PNG", ImageExtension::Png).expect("saved");

        let response = app(store, true)
            .oneshot(Request::get(format!("/{path}")).body(Body::empty()).expect("request"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).map(|value| value.as_bytes()),
            Some(&b"image/png"[..])
        );
    }

    #[tokio::test]
    async fn unknown_or_unsafe_upload_names_are_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsImageStore::open(dir.path()).expect("upload dir");

        assert_eq!(
            get_status(app(store.clone(), true), "/uploads/missing.png").await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(app(store, true), "/uploads/..%2Fsecret.png").await,
            StatusCode::NOT_FOUND
        );
    }
}
