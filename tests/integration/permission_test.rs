//! Integration tests for ownership and role checks.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_stranger_cannot_touch_foreign_file() {
    let app = TestApp::new().await;
    let (owner, _) = app.register("alice", "secret1").await;
    let (stranger, _) = app.register("mallory", "secret1").await;
    let id = app.upload_ok(&owner, "a.txt", b"data").await;
    let path = format!("/files/{id}");

    let rename = app
        .request("PUT", &path, Some(json!({ "name": "pwned.txt" })), Some(&stranger))
        .await;
    rename.assert_error(StatusCode::FORBIDDEN, &path);
    assert_eq!(rename.body["message"], "Not owner");

    let delete = app.request("DELETE", &path, None, Some(&stranger)).await;
    delete.assert_error(StatusCode::FORBIDDEN, &path);

    let download_path = format!("{path}/download");
    let download = app.request("GET", &download_path, None, Some(&stranger)).await;
    download.assert_error(StatusCode::FORBIDDEN, &download_path);

    // Denied attempts leave no trace in the ledger.
    let admin = app.admin_token().await;
    let events = app.request("GET", "/events", None, Some(&admin)).await;
    assert_eq!(events.items().len(), 1);
    assert_eq!(events.items()[0]["status"], "CREATED");

    let file = app.request("GET", &path, None, Some(&owner)).await;
    assert_eq!(file.body["name"], "a.txt");
    assert_eq!(file.body["status"], "ACTIVE");
}

#[tokio::test]
async fn test_stranger_listing_excludes_foreign_files() {
    let app = TestApp::new().await;
    let (owner, _) = app.register("alice", "secret1").await;
    let (stranger, _) = app.register("mallory", "secret1").await;
    app.upload_ok(&owner, "a.txt", b"data").await;

    let files = app.request("GET", "/files", None, Some(&stranger)).await;
    assert_eq!(files.status, StatusCode::OK);
    assert!(files.items().is_empty());

    let events = app.request("GET", "/events", None, Some(&stranger)).await;
    assert!(events.items().is_empty());
}

#[tokio::test]
async fn test_moderator_may_manage_any_file() {
    let app = TestApp::new().await;
    let (owner, owner_id) = app.register("alice", "secret1").await;
    let (moderator, moderator_id) = app.user_with_roles("mod", &["MODERATOR"]).await;
    let id = app.upload_ok(&owner, "a.txt", b"data").await;

    let renamed = app
        .request(
            "PUT",
            &format!("/files/{id}"),
            Some(json!({ "name": "moderated.txt" })),
            Some(&moderator),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    // Ownership never changes hands.
    assert_eq!(renamed.uuid("ownerId"), owner_id);

    let all = app.request("GET", "/files", None, Some(&moderator)).await;
    assert_eq!(all.items().len(), 1);

    let events = app.request("GET", "/events", None, Some(&owner)).await;
    // The owner sees only events they authored.
    assert_eq!(events.items().len(), 1);

    let events = app.request("GET", "/events", None, Some(&moderator)).await;
    let update = &events.items()[0];
    assert_eq!(update["status"], "UPDATED");
    assert_eq!(update["userId"], moderator_id.to_string());
    assert_eq!(update["message"], "Renamed from 'a.txt'");
}

#[tokio::test]
async fn test_admin_may_delete_any_file() {
    let app = TestApp::new().await;
    let (owner, _) = app.register("alice", "secret1").await;
    let admin = app.admin_token().await;
    let id = app.upload_ok(&owner, "a.txt", b"data").await;

    let deleted = app
        .request("DELETE", &format!("/files/{id}"), None, Some(&admin))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_user_directory_requires_privilege() {
    let app = TestApp::new().await;
    let (user, _) = app.register("alice", "secret1").await;
    let (moderator, _) = app.user_with_roles("mod", &["MODERATOR"]).await;

    let denied = app.request("GET", "/users", None, Some(&user)).await;
    denied.assert_error(StatusCode::FORBIDDEN, "/users");

    let listed = app.request("GET", "/users", None, Some(&moderator)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.items().len(), 3);

    // Moderators browse but do not administer.
    let create = app
        .request(
            "POST",
            "/users",
            Some(json!({ "username": "eve", "password": "password1" })),
            Some(&moderator),
        )
        .await;
    create.assert_error(StatusCode::FORBIDDEN, "/users");
    assert_eq!(create.body["message"], "Admin role required");
}

#[tokio::test]
async fn test_protected_routes_reject_anonymous() {
    let app = TestApp::new().await;

    for path in ["/files", "/files/paged", "/events", "/events/paged", "/users"] {
        let response = app.request("GET", path, None, None).await;
        response.assert_error(StatusCode::UNAUTHORIZED, path);
        assert_eq!(response.headers["www-authenticate"], "Bearer");
    }
}
