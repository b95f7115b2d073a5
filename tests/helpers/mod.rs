//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use nimbus_api::{AppState, build_app};
use nimbus_core::config::AppConfig;
use nimbus_core::traits::BlobStore;
use nimbus_database::DatabasePool;
use nimbus_database::migration::run_migrations;
use nimbus_storage::LocalBlobStore;

/// Password every test account is registered with.
pub const PASSWORD: &str = "secret123";

const BOUNDARY: &str = "nimbus-test-boundary";

/// Test application context
pub struct TestApp {
    /// The fully layered router
    pub router: Router,
    /// Blob root; removed when the app is dropped
    pub blob_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub bytes: Bytes,
    /// Body parsed as JSON, `Null` when it is not JSON
    pub body: Value,
}

impl TestResponse {
    /// A response header as a string.
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// Create a new test application over an in-memory database
    pub async fn new() -> Self {
        let db = DatabasePool::in_memory()
            .await
            .expect("Failed to open in-memory database");
        run_migrations(db.pool())
            .await
            .expect("Failed to run migrations");

        let blob_dir = tempfile::tempdir().expect("Failed to create blob root");
        let blobs: Arc<dyn BlobStore> = Arc::new(
            LocalBlobStore::new(blob_dir.path())
                .await
                .expect("Failed to init blob store"),
        );

        let state = AppState::with_blob_store(AppConfig::default(), db.into_pool(), blobs);
        Self {
            router: build_app(state),
            blob_dir,
        }
    }

    /// Register an account and return its bearer token
    pub async fn register(&self, username: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/register",
                Some(serde_json::json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Register failed: {:?}",
            response.body
        );
        token_of(&response)
    }

    /// Make a JSON request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.send(req).await
    }

    /// GET with extra headers
    pub async fn get_with(
        &self,
        path: &str,
        token: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut req = Request::builder()
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        self.send(req.body(Body::empty()).expect("Failed to build request"))
            .await
    }

    /// Upload one file through `POST /api/files`
    pub async fn upload(
        &self,
        token: &str,
        name: &str,
        content_type: &str,
        data: &[u8],
        folder_id: Option<i64>,
    ) -> TestResponse {
        let mut fields = Vec::new();
        if let Some(folder_id) = folder_id {
            fields.push(text_part("folderId", &folder_id.to_string()));
        }
        fields.push(file_part("file", name, content_type, data));
        self.multipart("/api/files", token, fields).await
    }

    /// Send a multipart request assembled from encoded parts
    pub async fn multipart(&self, path: &str, token: &str, parts: Vec<Vec<u8>>) -> TestResponse {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(&part);
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("Failed to build request");

        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// A multipart text field
pub fn text_part(name: &str, value: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
    )
    .into_bytes()
}

/// A multipart file field
pub fn file_part(name: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut part = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    part.extend_from_slice(data);
    part.extend_from_slice(b"\r\n");
    part
}

/// Bearer token from a register or login response
pub fn token_of(response: &TestResponse) -> String {
    response
        .body
        .get("token")
        .and_then(|v| v.as_str())
        .expect("No token in response")
        .to_string()
}

/// Numeric `id` of a JSON record
pub fn id_of(value: &Value) -> i64 {
    value
        .get("id")
        .and_then(|v| v.as_i64())
        .expect("No id in record")
}
