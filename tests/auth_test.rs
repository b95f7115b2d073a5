//! Integration tests for accounts and the reset-key flow.

mod helpers;

use axum::http::{StatusCode, header};
use serde_json::json;

use helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_register_and_login() {
    let app = TestApp::new().await;
    let token = app.register("alice").await;

    let me = app.request("GET", "/api/user", None, Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "alice");
    assert_eq!(me.body["displayName"], "alice");
    assert!(me.body.get("passwordHash").is_none());
    assert!(me.body.get("currentResetKey").is_none());

    let login = app
        .request(
            "POST",
            "/api/login",
            Some(json!({ "username": "alice", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert!(login.body["token"].is_string());
}

#[tokio::test]
async fn test_login_invalid_password() {
    let app = TestApp::new().await;
    app.register("bob").await;

    let response = app
        .request(
            "POST",
            "/api/login",
            Some(json!({ "username": "bob", "password": "wrongpassword" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = TestApp::new().await;
    app.register("carol").await;

    let response = app
        .request(
            "POST",
            "/api/register",
            Some(json!({
                "username": "carol",
                "email": "other@example.com",
                "password": PASSWORD,
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new().await;

    let missing = app.request("GET", "/api/files", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = app.request("GET", "/api/files", None, Some("not-a-jwt")).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reset_key_rotates_on_use() {
    let app = TestApp::new().await;
    let token = app.register("dave").await;

    let doc = app
        .request("GET", "/api/download-reset-key", None, Some(&token))
        .await;
    assert_eq!(doc.status, StatusCode::OK);
    assert_eq!(
        doc.header(header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"dave-reset-key.json\"")
    );
    let old_key = doc.body["resetKey"].as_str().unwrap().to_string();

    let reset = app
        .request(
            "POST",
            "/api/reset-password",
            Some(json!({ "resetKey": old_key, "newPassword": "brand-new-pass" })),
            None,
        )
        .await;
    assert_eq!(reset.status, StatusCode::OK);
    let new_key = reset.body["newResetKey"].as_str().unwrap().to_string();
    assert_ne!(new_key, old_key);

    let reused = app
        .request(
            "POST",
            "/api/reset-password",
            Some(json!({ "resetKey": old_key, "newPassword": "another-pass" })),
            None,
        )
        .await;
    assert_eq!(reused.status, StatusCode::BAD_REQUEST);

    let old_login = app
        .request(
            "POST",
            "/api/login",
            Some(json!({ "username": "dave", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(old_login.status, StatusCode::UNAUTHORIZED);

    let new_login = app
        .request(
            "POST",
            "/api/login",
            Some(json!({ "username": "dave", "password": "brand-new-pass" })),
            None,
        )
        .await;
    assert_eq!(new_login.status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::new().await;
    let token = app.register("erin").await;

    let updated = app
        .request(
            "PUT",
            "/api/profile",
            Some(json!({ "displayName": "Erin E.", "language": "de" })),
            Some(&token),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["displayName"], "Erin E.");
    assert_eq!(updated.body["language"], "de");

    let missing_picture = app
        .request("GET", "/api/profile/picture", None, Some(&token))
        .await;
    assert_eq!(missing_picture.status, StatusCode::NOT_FOUND);
}
