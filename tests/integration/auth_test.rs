//! Integration tests for registration, login and token handling.

use axum::http::StatusCode;
use serde_json::json;

use filestore_database::store::UserStore;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_register_issues_token() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/auth/register",
            Some(json!({ "username": "alice", "password": "secret1" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["tokenType"], "Bearer");
    assert_eq!(response.body["username"], "alice");
    assert_eq!(response.body["roles"], json!(["USER"]));
    assert_eq!(response.body["expiresInSeconds"], 7200);
    assert!(!response.token().is_empty());
}

#[tokio::test]
async fn test_register_duplicate_conflicts() {
    let app = TestApp::new().await;
    app.register("alice", "secret1").await;

    let response = app
        .request(
            "POST",
            "/auth/register",
            Some(json!({ "username": "alice", "password": "another1" })),
            None,
        )
        .await;

    response.assert_error(StatusCode::CONFLICT, "/auth/register");

    let users = UserStore::list(&app.db).await.unwrap();
    assert_eq!(users.iter().filter(|u| u.username == "alice").count(), 1);
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new().await;

    let short_name = app
        .request(
            "POST",
            "/auth/register",
            Some(json!({ "username": "al", "password": "secret1" })),
            None,
        )
        .await;
    short_name.assert_error(StatusCode::BAD_REQUEST, "/auth/register");

    let short_password = app
        .request(
            "POST",
            "/auth/register",
            Some(json!({ "username": "alice", "password": "12345" })),
            None,
        )
        .await;
    short_password.assert_error(StatusCode::BAD_REQUEST, "/auth/register");

    let missing_field = app
        .request(
            "POST",
            "/auth/register",
            Some(json!({ "username": "alice" })),
            None,
        )
        .await;
    missing_field.assert_error(StatusCode::BAD_REQUEST, "/auth/register");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new().await;

    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from("{\"username\": "))
        .unwrap();
    let response = app.send(req).await;

    response.assert_error(StatusCode::BAD_REQUEST, "/auth/login");
}

#[tokio::test]
async fn test_login_failures_look_identical() {
    let app = TestApp::new().await;
    app.register("alice", "secret1").await;

    let wrong_password = app
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "username": "alice", "password": "wrong-password" })),
            None,
        )
        .await;
    let unknown_user = app
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "username": "nobody", "password": "secret1" })),
            None,
        )
        .await;

    wrong_password.assert_error(StatusCode::UNAUTHORIZED, "/auth/login");
    unknown_user.assert_error(StatusCode::UNAUTHORIZED, "/auth/login");
    assert_eq!(wrong_password.body["message"], "Bad credentials");
    assert_eq!(wrong_password.body["message"], unknown_user.body["message"]);
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let app = TestApp::new().await;
    let (token, id) = app.register("alice", "secret1").await;

    let anonymous = app.request("GET", "/users/me", None, None).await;
    anonymous.assert_error(StatusCode::UNAUTHORIZED, "/users/me");

    let garbage = app.request("GET", "/users/me", None, Some("not-a-jwt")).await;
    garbage.assert_error(StatusCode::UNAUTHORIZED, "/users/me");

    let (head, signature) = token.rsplit_once('.').expect("compact JWS");
    let swapped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{head}.{swapped}{}", &signature[1..]);
    let tampered = app.request("GET", "/users/me", None, Some(&tampered)).await;
    assert_eq!(tampered.status, StatusCode::UNAUTHORIZED);

    let me = app.request("GET", "/users/me", None, Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.uuid("id"), id);
    assert_eq!(me.body["username"], "alice");
    assert_eq!(me.body["status"], "ACTIVE");
    assert!(me.body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_disabled_account_is_locked_out() {
    let app = TestApp::new().await;
    let (token, id) = app.register("alice", "secret1").await;
    let admin = app.admin_token().await;

    let disabled = app
        .request(
            "PATCH",
            &format!("/users/{id}/status"),
            Some(json!({ "status": "DISABLED" })),
            Some(&admin),
        )
        .await;
    assert_eq!(disabled.status, StatusCode::OK);
    assert_eq!(disabled.body["status"], "DISABLED");

    // The previously issued token no longer resolves.
    let me = app.request("GET", "/users/me", None, Some(&token)).await;
    me.assert_error(StatusCode::UNAUTHORIZED, "/users/me");

    let login = app
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "username": "alice", "password": "secret1" })),
            None,
        )
        .await;
    login.assert_error(StatusCode::UNAUTHORIZED, "/auth/login");
    assert_eq!(login.body["message"], "Bad credentials");
}

#[tokio::test]
async fn test_role_change_applies_to_existing_token() {
    let app = TestApp::new().await;
    let (token, id) = app.register("alice", "secret1").await;
    let admin = app.admin_token().await;

    let before = app.request("GET", "/users", None, Some(&token)).await;
    assert_eq!(before.status, StatusCode::FORBIDDEN);

    let promoted = app
        .request(
            "PUT",
            &format!("/users/{id}/roles"),
            Some(json!({ "roles": ["USER", "MODERATOR"] })),
            Some(&admin),
        )
        .await;
    assert_eq!(promoted.status, StatusCode::OK);

    let after = app.request("GET", "/users", None, Some(&token)).await;
    assert_eq!(after.status, StatusCode::OK);
}

#[tokio::test]
async fn test_deleted_account_token_rejected() {
    let app = TestApp::new().await;
    let (token, id) = app.register("alice", "secret1").await;
    let admin = app.admin_token().await;

    let deleted = app
        .request("DELETE", &format!("/users/{id}"), None, Some(&admin))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let me = app.request("GET", "/users/me", None, Some(&token)).await;
    me.assert_error(StatusCode::UNAUTHORIZED, "/users/me");
}
