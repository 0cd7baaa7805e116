#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use adaptlabel_api::auth::jwt::{Claims, JwtConfig};
use adaptlabel_api::config::ServerConfig;
use adaptlabel_api::router::build_app_router;
use adaptlabel_api::state::AppState;
use adaptlabel_core::types::DbId;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use sqlx::PgPool;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const ALICE: DbId = 1;
pub const BOB: DbId = 2;
const BOUNDARY: &str = "adaptlabel-test-boundary";

/// Address that refuses connections, for tests that never reach inference.
pub const NO_SIDECAR: &str = "http://127.0.0.1:9";

/// Application state plus the scratch directories it writes into.
pub struct TestApp {
    pub state: AppState,
    pub cancel: CancellationToken,
    uploads: TempDir,
    models: TempDir,
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_app_router(self.state.clone())
    }

    pub fn upload_root(&self) -> PathBuf {
        self.uploads.path().to_path_buf()
    }

    pub fn models_root(&self) -> PathBuf {
        self.models.path().to_path_buf()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub fn test_config(uploads: &TempDir, models: &TempDir, inference_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        upload_root: uploads.path().to_path_buf(),
        models_root: models.path().to_path_buf(),
        inference_url: inference_url.to_string(),
        model_cache_capacity: 2,
        annotation_workers: 2,
        annotation_queue_depth: 8,
    }
}

/// Build the full application with the production middleware stack.
pub fn build_test_app(pool: PgPool, inference_url: &str) -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let models = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    let (state, _workers) =
        AppState::start(pool, test_config(&uploads, &models, inference_url), cancel.clone());
    TestApp {
        state,
        cancel,
        uploads,
        models,
    }
}

pub fn token(user_id: DbId) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        exp: now + 900,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    user: Option<DbId>,
    content_type: Option<&str>,
    body: Body,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token(user)));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    app.router().oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str, user: DbId) -> Response<Body> {
    send(app, Method::GET, uri, Some(user), None, Body::empty()).await
}

pub async fn delete(app: &TestApp, uri: &str, user: DbId) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(user), None, Body::empty()).await
}

pub async fn post_json(app: &TestApp, uri: &str, user: DbId, body: Value) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Some(user),
        Some("application/json"),
        Body::from(body.to_string()),
    )
    .await
}

pub async fn put_json(app: &TestApp, uri: &str, user: DbId, body: Value) -> Response<Body> {
    send(
        app,
        Method::PUT,
        uri,
        Some(user),
        Some("application/json"),
        Body::from(body.to_string()),
    )
    .await
}

pub async fn post_empty(app: &TestApp, uri: &str, user: DbId) -> Response<Body> {
    send(app, Method::POST, uri, Some(user), None, Body::empty()).await
}

/// One multipart part: field name, optional file name, contents.
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: &TestApp, uri: &str, user: DbId, parts: &[Part<'_>]) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Some(user),
        Some(&format!("multipart/form-data; boundary={BOUNDARY}")),
        Body::from(multipart_body(parts)),
    )
    .await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Encode a blank PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::new_rgb8(width, height)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Create a dataset for `user` and return its id.
pub async fn create_dataset(app: &TestApp, user: DbId, body: Value) -> DbId {
    let response = post_json(app, "/api/v1/datasets", user, body).await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Upload PNG images of the given size to a dataset.
pub async fn upload_images(app: &TestApp, user: DbId, dataset_id: DbId, names: &[&str], size: (u32, u32)) {
    let png = png_bytes(size.0, size.1);
    let parts: Vec<Part<'_>> = names.iter().map(|n| ("files", Some(*n), png.as_slice())).collect();
    let response = post_multipart(app, &format!("/api/v1/datasets/{dataset_id}/images"), user, &parts).await;
    assert_eq!(response.status(), 201);
}

/// Start a fake inference sidecar on an ephemeral port.
///
/// The detector knows `person`, `cat` and `dog` and reports one dog box
/// per image after `delay`.
pub async fn spawn_sidecar(delay: Duration) -> String {
    let app = Router::new()
        .route(
            "/models/load",
            post(|Json(_): Json<Value>| async move {
                Json(json!({
                    "model": "det-1",
                    "class_names": {"0": "person", "15": "cat", "16": "dog"}
                }))
            }),
        )
        .route(
            "/models/{handle}/predict",
            post(move |Json(_): Json<Value>| async move {
                tokio::time::sleep(delay).await;
                Json(json!({
                    "objects": [{
                        "class_index": 16,
                        "confidence": 0.9,
                        "shape": {"type": "box", "x": 0.5, "y": 0.5, "width": 0.2, "height": 0.1}
                    }]
                }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
