//! Shared setup for the HTTP integration tests: an app wired against
//! the in-memory object store with a seeded volume.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use publink_api::{AppState, build_router};
use publink_auth::{PasswordHasher, SessionAuthCache};
use publink_core::config::AppConfig;
use publink_core::traits::store::ObjectStore;
use publink_service::{AccessService, ShareService};
use publink_storage::providers::memory::MemoryObjectStore;

pub const ACCESS_KEY: &str = "test-access-key";
pub const SHARE_VOLUME: &str = "__sharelinks__";

/// Build a router over a fresh in-memory store seeded with a small
/// directory tree under `/vol/docs/`.
pub async fn test_app() -> (Router, Arc<MemoryObjectStore>) {
    let mut config = AppConfig::default();
    config.share.access_key = ACCESS_KEY.to_string();

    let store = Arc::new(MemoryObjectStore::new());
    store.ensure_volume(SHARE_VOLUME).await.unwrap();
    store.ensure_volume("vol").await.unwrap();
    for (key, body) in [
        ("docs/report.pdf", "%PDF-1.4 fake"),
        ("docs/notes.txt", "some notes"),
        ("docs/img/logo.png", "png bytes"),
    ] {
        store.put("vol", key, Bytes::from(body)).await.unwrap();
    }

    let hasher = Arc::new(PasswordHasher::new());
    let share_volume = SHARE_VOLUME.to_string();
    let state = AppState {
        share_service: Arc::new(ShareService::new(
            store.clone() as Arc<dyn ObjectStore>,
            hasher.clone(),
            config.share.clone(),
            share_volume.clone(),
        )),
        access_service: Arc::new(AccessService::new(
            store.clone() as Arc<dyn ObjectStore>,
            hasher,
            share_volume,
        )),
        sessions: Arc::new(SessionAuthCache::new()),
        store: store.clone() as Arc<dyn ObjectStore>,
        config: Arc::new(config),
    };

    (build_router(state), store)
}

/// Send one request through the router.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// Build a JSON request.
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a GET request, optionally with a cookie header.
pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Create a share through the API and return the publink path
/// (`/s/<token>`).
pub async fn create_share(app: &Router, body: serde_json::Value) -> String {
    let mut body = body;
    body["access_key"] = serde_json::json!(ACCESS_KEY);
    let response = send(app, json_request("POST", "/api/shares", body)).await;
    let json = body_json(response).await;
    assert_eq!(json["status"], true, "share creation failed: {json}");
    let publink = json["publink"].as_str().unwrap();
    let idx = publink.find("/s/").unwrap();
    publink[idx..].to_string()
}
