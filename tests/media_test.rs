//! Integration tests for previews, downloads, and byte ranges.

mod helpers;

use axum::http::{StatusCode, header};

use helpers::{TestApp, id_of};

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_video_range_request() {
    let app = TestApp::new().await;
    let token = app.register("alice").await;
    let data = sample(1000);

    let uploaded = app.upload(&token, "clip.mp4", "video/mp4", &data, None).await;
    let file_id = id_of(&uploaded.body);
    let path = format!("/api/files/{file_id}/preview");

    let partial = app.get_with(&path, &token, &[("range", "bytes=0-99")]).await;
    assert_eq!(partial.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(partial.header(header::CONTENT_RANGE), Some("bytes 0-99/1000"));
    assert_eq!(partial.header(header::CONTENT_LENGTH), Some("100"));
    assert_eq!(partial.header(header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(partial.header(header::CONTENT_TYPE), Some("video/mp4"));
    assert_eq!(&partial.bytes[..], &data[..100]);

    let tail = app.get_with(&path, &token, &[("range", "bytes=900-")]).await;
    assert_eq!(tail.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(tail.header(header::CONTENT_RANGE), Some("bytes 900-999/1000"));
    assert_eq!(&tail.bytes[..], &data[900..]);

    let full = app.get_with(&path, &token, &[]).await;
    assert_eq!(full.status, StatusCode::OK);
    assert_eq!(full.header(header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(full.bytes.len(), 1000);
}

#[tokio::test]
async fn test_unsatisfiable_range() {
    let app = TestApp::new().await;
    let token = app.register("alice").await;

    let uploaded = app
        .upload(&token, "clip.mp4", "video/mp4", &sample(1000), None)
        .await;
    let path = format!("/api/files/{}/preview", id_of(&uploaded.body));

    let response = app.get_with(&path, &token, &[("range", "bytes=1000-")]).await;
    assert_eq!(response.status, StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.header(header::CONTENT_RANGE), Some("bytes */1000"));
}

#[tokio::test]
async fn test_non_video_preview_ignores_range() {
    let app = TestApp::new().await;
    let token = app.register("alice").await;

    let uploaded = app
        .upload(&token, "photo.png", "image/png", &sample(300), None)
        .await;
    let path = format!("/api/files/{}/preview", id_of(&uploaded.body));

    let response = app.get_with(&path, &token, &[("range", "bytes=0-9")]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.bytes.len(), 300);
    assert_eq!(response.header(header::CONTENT_DISPOSITION), Some("inline"));
    assert!(response.header(header::ACCEPT_RANGES).is_none());
}

#[tokio::test]
async fn test_download_uses_original_name() {
    let app = TestApp::new().await;
    let token = app.register("alice").await;

    let uploaded = app
        .upload(&token, "Quarterly Report.pdf", "application/pdf", b"%PDF-1.7", None)
        .await;
    let path = format!("/api/files/{}/download", id_of(&uploaded.body));

    let response = app.get_with(&path, &token, &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"Quarterly Report.pdf\"")
    );
    assert_eq!(&response.bytes[..], b"%PDF-1.7");
}

#[tokio::test]
async fn test_trashed_file_still_downloads() {
    let app = TestApp::new().await;
    let token = app.register("alice").await;

    let uploaded = app.upload(&token, "a.txt", "text/plain", b"abc", None).await;
    let file_id = id_of(&uploaded.body);
    app.request("DELETE", &format!("/api/files/{file_id}"), None, Some(&token))
        .await;

    let response = app
        .get_with(&format!("/api/files/{file_id}/download"), &token, &[])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.bytes[..], b"abc");
}

#[tokio::test]
async fn test_missing_blob_is_reported_distinctly() {
    let app = TestApp::new().await;
    let token = app.register("alice").await;

    let uploaded = app.upload(&token, "a.txt", "text/plain", b"abc", None).await;
    let key = uploaded.body["path"].as_str().unwrap();
    std::fs::remove_file(app.blob_dir.path().join(key)).unwrap();

    let response = app
        .get_with(&format!("/api/files/{}/download", id_of(&uploaded.body)), &token, &[])
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "File not found on disk");
}
