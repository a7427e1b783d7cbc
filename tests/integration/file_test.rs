//! Integration tests for the file lifecycle.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_upload_streams_into_object_store() {
    let app = TestApp::new().await;
    let (token, user_id) = app.register("alice", "secret1").await;

    let response = app.upload(&token, "report final.pdf", b"%PDF-1.7 body").await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["name"], "report final.pdf");
    assert_eq!(response.body["status"], "ACTIVE");
    assert_eq!(response.uuid("ownerId"), user_id);

    let location = response.str("location");
    let key = location
        .strip_prefix("memory://objects/")
        .expect("memory location");
    assert!(key.starts_with(&format!("u{user_id}/")));
    assert!(key.ends_with("_report_final.pdf"));

    let (data, content_type) = app.objects.object(key).expect("object stored");
    assert_eq!(&data[..], b"%PDF-1.7 body");
    assert_eq!(content_type, "text/plain");
}

#[tokio::test]
async fn test_upload_requires_file_field() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;

    let wrong_field = app
        .upload_field(&token, "attachment", "a.txt", b"data")
        .await;
    wrong_field.assert_error(StatusCode::BAD_REQUEST, "/files");

    let blank_name = app.upload(&token, "", b"data").await;
    blank_name.assert_error(StatusCode::BAD_REQUEST, "/files");
    assert!(app.objects.is_empty());
}

#[tokio::test]
async fn test_upload_requires_authentication() {
    let app = TestApp::new().await;
    let response = app.request("POST", "/files", None, None).await;
    response.assert_error(StatusCode::UNAUTHORIZED, "/files");
}

#[tokio::test]
async fn test_failed_upload_records_nothing() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;
    app.objects.set_fail_puts(true);

    let response = app.upload(&token, "a.txt", b"data").await;
    response.assert_error(StatusCode::BAD_GATEWAY, "/files");

    let files = app.request("GET", "/files", None, Some(&token)).await;
    assert!(files.items().is_empty());
    let events = app.request("GET", "/events", None, Some(&token)).await;
    assert!(events.items().is_empty());
}

#[tokio::test]
async fn test_slow_object_store_times_out() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;
    app.objects
        .set_put_delay(std::time::Duration::from_secs(5));

    let response = app.upload(&token, "a.txt", b"data").await;
    response.assert_error(StatusCode::BAD_GATEWAY, "/files");

    let files = app.request("GET", "/files", None, Some(&token)).await;
    assert!(files.items().is_empty());
    assert!(app.objects.is_empty());
}

#[tokio::test]
async fn test_rename_keeps_location() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;
    let uploaded = app.upload(&token, "draft.txt", b"v1").await;
    let id = uploaded.uuid("id");

    let renamed = app
        .request(
            "PUT",
            &format!("/files/{id}"),
            Some(json!({ "name": "final.txt" })),
            Some(&token),
        )
        .await;

    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["name"], "final.txt");
    assert_eq!(renamed.body["location"], uploaded.body["location"]);

    let blank = app
        .request(
            "PUT",
            &format!("/files/{id}"),
            Some(json!({ "name": "" })),
            Some(&token),
        )
        .await;
    blank.assert_error(StatusCode::BAD_REQUEST, &format!("/files/{id}"));
}

#[tokio::test]
async fn test_delete_archives_and_blocks_further_mutation() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;
    let id = app.upload_ok(&token, "a.txt", b"data").await;
    let path = format!("/files/{id}");

    let deleted = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(app.objects.is_empty());

    let fetched = app.request("GET", &path, None, Some(&token)).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["status"], "ARCHIVED");

    let again = app.request("DELETE", &path, None, Some(&token)).await;
    again.assert_error(StatusCode::CONFLICT, &path);

    let rename = app
        .request("PUT", &path, Some(json!({ "name": "b.txt" })), Some(&token))
        .await;
    rename.assert_error(StatusCode::CONFLICT, &path);

    let download_path = format!("{path}/download");
    let download = app.request("GET", &download_path, None, Some(&token)).await;
    download.assert_error(StatusCode::CONFLICT, &download_path);

    // Archived files drop out of the owner's default listing.
    let files = app.request("GET", "/files", None, Some(&token)).await;
    assert!(files.items().is_empty());
}

#[tokio::test]
async fn test_delete_survives_object_store_failure() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;
    let id = app.upload_ok(&token, "a.txt", b"data").await;
    app.objects.set_fail_deletes(true);

    let deleted = app
        .request("DELETE", &format!("/files/{id}"), None, Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(app.objects.len(), 1);

    let events = app.request("GET", "/events", None, Some(&token)).await;
    let newest = &events.items()[0];
    assert_eq!(newest["status"], "DELETED");
    assert_eq!(newest["message"], "Object removal pending");
}

#[tokio::test]
async fn test_download_redirects_to_presigned_url() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;
    let uploaded = app.upload(&token, "a.txt", b"data").await;
    let id = uploaded.uuid("id");

    let response = app
        .request("GET", &format!("/files/{id}/download"), None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    let location = response.location();
    assert!(location.starts_with(uploaded.str("location")));
    assert!(location.contains("?expires="));
}

#[tokio::test]
async fn test_presign_failure_is_bad_gateway() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;
    let id = app.upload_ok(&token, "a.txt", b"data").await;
    app.objects.set_fail_presign(true);

    let path = format!("/files/{id}/download");
    let response = app.request("GET", &path, None, Some(&token)).await;
    response.assert_error(StatusCode::BAD_GATEWAY, &path);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;

    let missing = "/files/00000000-0000-0000-0000-999999999999";
    let response = app.request("GET", missing, None, Some(&token)).await;
    response.assert_error(StatusCode::NOT_FOUND, missing);

    let response = app.request("GET", "/files/not-a-uuid", None, Some(&token)).await;
    response.assert_error(StatusCode::BAD_REQUEST, "/files/not-a-uuid");
}

#[tokio::test]
async fn test_unknown_route_uses_envelope() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/nowhere", None, None).await;
    response.assert_error(StatusCode::NOT_FOUND, "/nowhere");
}

#[tokio::test]
async fn test_health_reports_database() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["database"], "connected");
}
