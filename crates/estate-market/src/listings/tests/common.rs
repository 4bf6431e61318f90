use std::collections::BTreeSet;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use tower::ServiceExt;

use crate::accounts::password::hash_password;
use crate::accounts::{session_layer, Identity, NewUser, UserId, UserRepository};
use crate::listings::{
    ImageExtension, ImageStore, ListingDetail, ListingForm, ListingService, StorageError,
    UploadCandidate,
};
use crate::router::{market_router, MarketState};
use crate::store::MarketStore;

pub(super) type TestService = ListingService<MarketStore, MemoryImageStore>;

#[derive(Default)]
pub(super) struct MemoryImageStore {
    files: Mutex<BTreeSet<String>>,
    saved: AtomicU64,
    read_only: AtomicBool,
}

impl MemoryImageStore {
    pub(super) fn files(&self) -> BTreeSet<String> {
        self.files.lock().expect("file set mutex poisoned").clone()
    }

    /// Make every removal fail from now on.
    pub(super) fn freeze(&self) {
        self.read_only.store(true, Ordering::SeqCst);
    }
}

impl ImageStore for MemoryImageStore {
    fn save(&self, _bytes: &[u8], extension: ImageExtension) -> Result<String, StorageError> {
        let sequence = self.saved.fetch_add(1, Ordering::SeqCst) + 1;
        let path = format!("uploads/photo{sequence}.{}", extension.as_str());
        self.files
            .lock()
            .expect("file set mutex poisoned")
            .insert(path.clone());
        Ok(path)
    }

    fn remove(&self, path: &str) -> Result<(), StorageError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read only").into());
        }
        self.files
            .lock()
            .expect("file set mutex poisoned")
            .remove(path);
        Ok(())
    }
}

pub(super) struct Fixture {
    pub(super) service: TestService,
    pub(super) store: Arc<MarketStore>,
    pub(super) images: Arc<MemoryImageStore>,
}

pub(super) fn fixture() -> Fixture {
    let store = Arc::new(MarketStore::in_memory());
    let images = Arc::new(MemoryImageStore::default());
    let service = ListingService::new(store.clone(), images.clone());
    Fixture {
        service,
        store,
        images,
    }
}

pub(super) fn register(store: &MarketStore, email: &str) -> Identity {
    let user = store
        .insert_user(NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$unused".to_string(),
        })
        .expect("user inserted");
    Identity::user(user.id)
}

pub(super) fn owner_of(identity: &Identity) -> UserId {
    identity.user_id().expect("signed in")
}

pub(super) fn house_form(title: &str, price: &str) -> ListingForm {
    ListingForm {
        title: Some(title.to_string()),
        category: Some("huis".to_string()),
        status: Some("te koop".to_string()),
        price: Some(price.to_string()),
        currency: Some("SRD".to_string()),
        district: Some("Paramaribo".to_string()),
        sub_district: Some("Blauwgrond".to_string()),
        description: Some("Ruime woning met tuin".to_string()),
        ..ListingForm::default()
    }
}

pub(super) fn photos(count: usize) -> Vec<UploadCandidate> {
    (0..count)
        .map(|index| UploadCandidate::new(format!("foto{index}.jpg"), vec![0xFF, 0xD8, index as u8]))
        .collect()
}

pub(super) fn publish(fixture: &Fixture, owner: &Identity, title: &str, photo_count: usize) -> ListingDetail {
    fixture
        .service
        .create(owner, &house_form(title, "1000"), photos(photo_count))
        .expect("listing published")
}

pub(super) struct App {
    pub(super) router: axum::Router,
    pub(super) store: Arc<MarketStore>,
}

pub(super) fn app() -> App {
    let store = Arc::new(MarketStore::in_memory());
    let images = Arc::new(MemoryImageStore::default());
    let state = MarketState::new(store.clone(), store.clone(), images);
    App {
        router: market_router(state, session_layer(false)),
        store,
    }
}

/// Store a user, log them in over HTTP and return the session cookie.
pub(super) async fn signed_in(app: &App, email: &str) -> (UserId, String) {
    let user = app
        .store
        .insert_user(NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: hash_password("geheim1").expect("hash"),
        })
        .expect("user inserted");
    let login = Request::post("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("email={}&password=geheim1", email.replace('@', "%40"))))
        .expect("request builds");
    let response = app.router.clone().oneshot(login).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.split(';').next())
        .expect("session cookie")
        .to_string();
    (user.id, cookie)
}

pub(super) const BOUNDARY: &str = "estate-boundary";

/// Multipart body with text fields and `(file name, bytes)` photo parts.
pub(super) fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    for (file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"fotos\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) fn multipart_request(uri: &str, cookie: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("request builds")
}

pub(super) fn listing_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("titel", "Woning Blauwgrond"),
        ("type_object", "huis"),
        ("status", "te koop"),
        ("prijs", "1000"),
        ("valuta", "SRD"),
        ("district", "Paramaribo"),
        ("wijk", "Blauwgrond"),
        ("beschrijving", "Ruime woning"),
    ]
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
