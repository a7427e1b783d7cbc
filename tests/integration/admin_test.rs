//! Integration tests for administrative user management.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{ADMIN_USERNAME, TestApp};

#[tokio::test]
async fn test_bootstrap_admin_exists() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let me = app.request("GET", "/users/me", None, Some(&admin)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], ADMIN_USERNAME);
    let roles = me.body["roles"].as_array().unwrap();
    assert!(roles.contains(&json!("ADMIN")));
}

#[tokio::test]
async fn test_create_user_with_roles_and_status() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let created = app
        .request(
            "POST",
            "/users",
            Some(json!({
                "username": "carol",
                "password": "password1",
                "roles": ["MODERATOR"],
                "status": "DISABLED"
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["roles"], json!(["MODERATOR"]));
    assert_eq!(created.body["status"], "DISABLED");

    let defaults = app
        .request(
            "POST",
            "/users",
            Some(json!({ "username": "dave", "password": "password1" })),
            Some(&admin),
        )
        .await;
    assert_eq!(defaults.status, StatusCode::CREATED);
    assert_eq!(defaults.body["roles"], json!(["USER"]));
    assert_eq!(defaults.body["status"], "ACTIVE");
}

#[tokio::test]
async fn test_create_user_rejects_bad_input() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let unknown_role = app
        .request(
            "POST",
            "/users",
            Some(json!({ "username": "carol", "password": "password1", "roles": ["ROOT"] })),
            Some(&admin),
        )
        .await;
    unknown_role.assert_error(StatusCode::BAD_REQUEST, "/users");

    let unknown_status = app
        .request(
            "POST",
            "/users",
            Some(json!({ "username": "carol", "password": "password1", "status": "ASLEEP" })),
            Some(&admin),
        )
        .await;
    unknown_status.assert_error(StatusCode::BAD_REQUEST, "/users");

    let taken = app
        .request(
            "POST",
            "/users",
            Some(json!({ "username": ADMIN_USERNAME, "password": "password1" })),
            Some(&admin),
        )
        .await;
    taken.assert_error(StatusCode::CONFLICT, "/users");
}

#[tokio::test]
async fn test_update_roles_and_status() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (_, id) = app.register("alice", "secret1").await;

    let roles_path = format!("/users/{id}/roles");
    let roles = app
        .request(
            "PUT",
            &roles_path,
            Some(json!({ "roles": ["ADMIN", "USER"] })),
            Some(&admin),
        )
        .await;
    assert_eq!(roles.status, StatusCode::OK);
    assert_eq!(roles.body["roles"], json!(["USER", "ADMIN"]));

    let bad_role = app
        .request("PUT", &roles_path, Some(json!({ "roles": ["GOD"] })), Some(&admin))
        .await;
    bad_role.assert_error(StatusCode::BAD_REQUEST, &roles_path);

    let status_path = format!("/users/{id}/status");
    let unchanged = app
        .request("PATCH", &status_path, Some(json!({ "status": "" })), Some(&admin))
        .await;
    assert_eq!(unchanged.status, StatusCode::OK);
    assert_eq!(unchanged.body["status"], "ACTIVE");

    let missing = format!("/users/{}/status", uuid::Uuid::new_v4());
    let response = app
        .request("PATCH", &missing, Some(json!({ "status": "DISABLED" })), Some(&admin))
        .await;
    response.assert_error(StatusCode::NOT_FOUND, &missing);
}

#[tokio::test]
async fn test_delete_user_guarded_by_references() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (owner, owner_id) = app.register("alice", "secret1").await;
    let (_, idle_id) = app.register("bob", "secret1").await;
    app.upload_ok(&owner, "a.txt", b"data").await;

    let owner_path = format!("/users/{owner_id}");
    let referenced = app.request("DELETE", &owner_path, None, Some(&admin)).await;
    referenced.assert_error(StatusCode::CONFLICT, &owner_path);

    let idle_path = format!("/users/{idle_id}");
    let deleted = app.request("DELETE", &idle_path, None, Some(&admin)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let again = app.request("DELETE", &idle_path, None, Some(&admin)).await;
    again.assert_error(StatusCode::NOT_FOUND, &idle_path);

    let users = app.request("GET", "/users", None, Some(&admin)).await;
    let names: Vec<&str> = users
        .items()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["admin", "alice"]);
}
