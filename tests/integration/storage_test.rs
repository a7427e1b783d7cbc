//! Integration tests for signed downloads from local storage.

use axum::http::StatusCode;

use crate::helpers::TestApp;

/// Path and query of an absolute URL.
fn path_of(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme
        .find('/')
        .map_or("/", |i| &without_scheme[i..])
}

#[tokio::test]
async fn test_signed_link_serves_object() {
    let dir = tempfile::tempdir().unwrap();
    let app = TestApp::with_local_storage(dir.path()).await;
    let (token, _) = app.register("alice", "secret1").await;
    let id = app.upload_ok(&token, "notes.txt", b"hello from disk").await;

    let redirect = app
        .request("GET", &format!("/files/{id}/download"), None, Some(&token))
        .await;
    assert_eq!(redirect.status, StatusCode::FOUND);
    let location = redirect.location().to_string();
    assert!(location.starts_with("http://localhost:8080/storage/u"));
    assert!(location.contains("signature="));

    // The signature is the credential; no bearer token needed.
    let download = app.request("GET", path_of(&location), None, None).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.bytes, b"hello from disk");
}

#[tokio::test]
async fn test_tampered_link_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let app = TestApp::with_local_storage(dir.path()).await;
    let (token, _) = app.register("alice", "secret1").await;
    let id = app.upload_ok(&token, "notes.txt", b"secret").await;

    let redirect = app
        .request("GET", &format!("/files/{id}/download"), None, Some(&token))
        .await;
    let location = redirect.location().to_string();
    let (base, _) = location.split_once("?expires=").unwrap();
    let forged = format!("{}?expires=4102444800&signature=AAAA", path_of(base));

    let response = app.request("GET", &forged, None, None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["status"], 403);
}

#[tokio::test]
async fn test_storage_route_absent_for_remote_stores() {
    let app = TestApp::new().await;
    let response = app
        .request("GET", "/storage/u1/20250101/x_a.txt?expires=1&signature=AAAA", None, None)
        .await;
    response.assert_error(StatusCode::NOT_FOUND, "/storage/u1/20250101/x_a.txt");
}
