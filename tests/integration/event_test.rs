//! Integration tests for the audit trail.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_lifecycle_records_one_event_per_mutation() {
    let app = TestApp::new().await;
    let (token, user_id) = app.register("alice", "secret1").await;
    let id = app.upload_ok(&token, "a.txt", b"data").await;

    app.request(
        "PUT",
        &format!("/files/{id}"),
        Some(json!({ "name": "b.txt" })),
        Some(&token),
    )
    .await;
    app.request("DELETE", &format!("/files/{id}"), None, Some(&token))
        .await;

    let events = app.request("GET", "/events", None, Some(&token)).await;
    assert_eq!(events.status, StatusCode::OK);

    let kinds: Vec<&str> = events
        .items()
        .iter()
        .map(|e| e["status"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["DELETED", "UPDATED", "CREATED"]);

    for event in events.items() {
        assert_eq!(event["fileId"], id.to_string());
        assert_eq!(event["userId"], user_id.to_string());
        assert!(event["createdAt"].is_string());
    }
    assert!(events.items()[2]["message"].is_null());
}

#[tokio::test]
async fn test_paged_events_filter_by_actor_and_kind() {
    let app = TestApp::new().await;
    let (alice, alice_id) = app.register("alice", "secret1").await;
    let (bob, bob_id) = app.register("bob", "secret1").await;
    let admin = app.admin_token().await;

    let a = app.upload_ok(&alice, "a.txt", b"data").await;
    app.upload_ok(&bob, "b.txt", b"data").await;
    app.request(
        "PUT",
        &format!("/files/{a}"),
        Some(json!({ "name": "a2.txt" })),
        Some(&alice),
    )
    .await;

    let by_alice = app
        .request(
            "GET",
            &format!("/events/paged?userId={alice_id}"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(by_alice.status, StatusCode::OK);
    assert_eq!(by_alice.body["total"], 2);

    let created = app
        .request("GET", "/events/paged?status=CREATED", None, Some(&admin))
        .await;
    assert_eq!(created.body["total"], 2);

    // Plain users are narrowed to their own events whatever they ask for.
    let foreign = app
        .request(
            "GET",
            &format!("/events/paged?userId={bob_id}"),
            None,
            Some(&alice),
        )
        .await;
    assert_eq!(foreign.body["total"], 0);
    assert!(foreign.items().is_empty());
}

#[tokio::test]
async fn test_paged_events_reject_bad_filters() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let bad_status = app
        .request("GET", "/events/paged?status=EXPLODED", None, Some(&admin))
        .await;
    bad_status.assert_error(StatusCode::BAD_REQUEST, "/events/paged");

    let bad_user = app
        .request("GET", "/events/paged?userId=nope", None, Some(&admin))
        .await;
    bad_user.assert_error(StatusCode::BAD_REQUEST, "/events/paged");

    let bad_sort = app
        .request("GET", "/events/paged?sort=message,asc", None, Some(&admin))
        .await;
    bad_sort.assert_error(StatusCode::BAD_REQUEST, "/events/paged");
}
