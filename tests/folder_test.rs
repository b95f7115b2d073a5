//! Integration tests for the folder lifecycle.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::{TestApp, id_of};

#[tokio::test]
async fn test_create_nested_and_list_children() {
    let app = TestApp::new().await;
    let token = app.register("alice").await;

    let parent = app
        .request("POST", "/api/folders", Some(json!({ "name": "  Photos " })), Some(&token))
        .await;
    assert_eq!(parent.status, StatusCode::CREATED);
    assert_eq!(parent.body["name"], "Photos");
    let parent_id = id_of(&parent.body);

    let child = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": "2024", "parentId": parent_id })),
            Some(&token),
        )
        .await;
    assert_eq!(child.status, StatusCode::CREATED);
    assert_eq!(child.body["parentId"], parent_id);

    let roots = app.request("GET", "/api/folders", None, Some(&token)).await;
    assert_eq!(roots.body.as_array().unwrap().len(), 1);

    let children = app
        .request("GET", &format!("/api/folders?parentId={parent_id}"), None, Some(&token))
        .await;
    assert_eq!(children.body.as_array().unwrap().len(), 1);
    assert_eq!(children.body[0]["name"], "2024");

    let all = app.request("GET", "/api/folders/all", None, Some(&token)).await;
    assert_eq!(all.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_blank_names_are_rejected() {
    let app = TestApp::new().await;
    let token = app.register("alice").await;

    let created = app
        .request("POST", "/api/folders", Some(json!({ "name": "   " })), Some(&token))
        .await;
    assert_eq!(created.status, StatusCode::BAD_REQUEST);

    let folder = app
        .request("POST", "/api/folders", Some(json!({ "name": "Docs" })), Some(&token))
        .await;
    let folder_id = id_of(&folder.body);
    let renamed = app
        .request(
            "PUT",
            &format!("/api/folders/{folder_id}"),
            Some(json!({ "name": "" })),
            Some(&token),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::BAD_REQUEST);

    let renamed = app
        .request(
            "PUT",
            &format!("/api/folders/{folder_id}"),
            Some(json!({ "name": "Papers" })),
            Some(&token),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["name"], "Papers");
}

#[tokio::test]
async fn test_other_users_folders_are_not_found() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let mallory = app.register("mallory").await;

    let folder = app
        .request("POST", "/api/folders", Some(json!({ "name": "Private" })), Some(&alice))
        .await;
    let folder_id = id_of(&folder.body);

    let nested = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": "Intruder", "parentId": folder_id })),
            Some(&mallory),
        )
        .await;
    assert_eq!(nested.status, StatusCode::NOT_FOUND);

    let purge = app
        .request("DELETE", &format!("/api/folders/{folder_id}/permanent"), None, Some(&mallory))
        .await;
    assert_eq!(purge.status, StatusCode::NOT_FOUND);

    let get = app
        .request("GET", &format!("/api/folders/{folder_id}"), None, Some(&alice))
        .await;
    assert_eq!(get.status, StatusCode::OK);
}

#[tokio::test]
async fn test_trash_does_not_cascade_and_restores() {
    let app = TestApp::new().await;
    let token = app.register("alice").await;

    let folder = app
        .request("POST", "/api/folders", Some(json!({ "name": "Docs" })), Some(&token))
        .await;
    let folder_id = id_of(&folder.body);
    app.upload(&token, "a.txt", "text/plain", b"abc", Some(folder_id))
        .await;

    let trashed = app
        .request("DELETE", &format!("/api/folders/{folder_id}"), None, Some(&token))
        .await;
    assert_eq!(trashed.body["message"], "Folder moved to trash");

    let deleted = app.request("GET", "/api/folders/deleted", None, Some(&token)).await;
    assert_eq!(deleted.body.as_array().unwrap().len(), 1);
    let files_trash = app.request("GET", "/api/files/deleted", None, Some(&token)).await;
    assert!(files_trash.body.as_array().unwrap().is_empty());

    let restored = app
        .request("POST", &format!("/api/folders/{folder_id}/restore"), None, Some(&token))
        .await;
    assert_eq!(restored.status, StatusCode::OK);
    let roots = app.request("GET", "/api/folders", None, Some(&token)).await;
    assert_eq!(roots.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_permanent_delete_removes_subtree() {
    let app = TestApp::new().await;
    let token = app.register("alice").await;

    let parent = app
        .request("POST", "/api/folders", Some(json!({ "name": "Parent" })), Some(&token))
        .await;
    let parent_id = id_of(&parent.body);
    let child = app
        .request(
            "POST",
            "/api/folders",
            Some(json!({ "name": "Child", "parentId": parent_id })),
            Some(&token),
        )
        .await;
    let child_id = id_of(&child.body);

    let inner = app
        .upload(&token, "inner.txt", "text/plain", b"inner", Some(child_id))
        .await;
    app.upload(&token, "top.txt", "text/plain", b"top", Some(parent_id))
        .await;
    app.upload(&token, "keep.txt", "text/plain", b"keep", None)
        .await;

    let purged = app
        .request("DELETE", &format!("/api/folders/{parent_id}/permanent"), None, Some(&token))
        .await;
    assert_eq!(purged.status, StatusCode::OK);
    assert_eq!(purged.body["foldersDeleted"], 2);
    assert_eq!(purged.body["filesDeleted"], 2);

    let child = app
        .request("GET", &format!("/api/folders/{child_id}"), None, Some(&token))
        .await;
    assert_eq!(child.status, StatusCode::NOT_FOUND);
    let inner = app
        .request("GET", &format!("/api/files/{}", id_of(&inner.body)), None, Some(&token))
        .await;
    assert_eq!(inner.status, StatusCode::NOT_FOUND);

    let root_files = app.request("GET", "/api/files", None, Some(&token)).await;
    assert_eq!(root_files.body.as_array().unwrap().len(), 1);
    assert_eq!(root_files.body[0]["originalName"], "keep.txt");
}
