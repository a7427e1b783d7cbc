//! Integration tests for paged listings.

use axum::http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_pages_cover_all_files() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;
    for name in ["c.txt", "a.txt", "e.txt", "b.txt", "d.txt"] {
        app.upload_ok(&token, name, b"data").await;
    }

    let first = app
        .request("GET", "/files/paged?page=0&size=2", None, Some(&token))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["total"], 5);
    assert_eq!(first.body["totalPages"], 3);
    assert_eq!(first.body["hasNext"], true);
    assert_eq!(first.body["hasPrevious"], false);
    // Newest first by default.
    assert_eq!(first.items()[0]["name"], "d.txt");

    let last = app
        .request("GET", "/files/paged?page=2&size=2", None, Some(&token))
        .await;
    assert_eq!(last.items().len(), 1);
    assert_eq!(last.body["hasNext"], false);
    assert_eq!(last.body["hasPrevious"], true);
    assert_eq!(last.items()[0]["name"], "c.txt");

    let beyond = app
        .request("GET", "/files/paged?page=9&size=2", None, Some(&token))
        .await;
    assert!(beyond.items().is_empty());
    assert_eq!(beyond.body["total"], 5);

    let far_beyond = app
        .request("GET", "/files/paged?page=4611686018427387904&size=20", None, Some(&token))
        .await;
    assert_eq!(far_beyond.status, StatusCode::OK);
    assert!(far_beyond.items().is_empty());
    assert_eq!(far_beyond.body["total"], 5);
    assert_eq!(far_beyond.body["hasNext"], false);
}

#[tokio::test]
async fn test_sort_by_name() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;
    for name in ["b.txt", "c.txt", "a.txt"] {
        app.upload_ok(&token, name, b"data").await;
    }

    let asc = app
        .request("GET", "/files/paged?sort=name,asc", None, Some(&token))
        .await;
    let names: Vec<&str> = asc
        .items()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);

    let bad = app
        .request("GET", "/files/paged?sort=ownerId", None, Some(&token))
        .await;
    bad.assert_error(StatusCode::BAD_REQUEST, "/files/paged");

    let bad_direction = app
        .request("GET", "/files/paged?sort=name,sideways", None, Some(&token))
        .await;
    bad_direction.assert_error(StatusCode::BAD_REQUEST, "/files/paged");
}

#[tokio::test]
async fn test_page_size_is_clamped() {
    let app = TestApp::new().await;
    let (token, _) = app.register("alice", "secret1").await;

    let huge = app
        .request("GET", "/files/paged?size=1000", None, Some(&token))
        .await;
    assert_eq!(huge.body["size"], 100);

    let zero = app
        .request("GET", "/files/paged?size=0", None, Some(&token))
        .await;
    assert_eq!(zero.body["size"], 1);

    let negative = app
        .request("GET", "/files/paged?page=-1", None, Some(&token))
        .await;
    negative.assert_error(StatusCode::BAD_REQUEST, "/files/paged");
}

#[tokio::test]
async fn test_status_filter_and_visibility() {
    let app = TestApp::new().await;
    let (alice, _) = app.register("alice", "secret1").await;
    let (bob, _) = app.register("bob", "secret1").await;
    let (moderator, _) = app.user_with_roles("mod", &["MODERATOR"]).await;

    let archived = app.upload_ok(&alice, "old.txt", b"data").await;
    app.upload_ok(&alice, "new.txt", b"data").await;
    app.upload_ok(&bob, "bob.txt", b"data").await;
    app.request("DELETE", &format!("/files/{archived}"), None, Some(&alice))
        .await;

    let own = app.request("GET", "/files/paged", None, Some(&alice)).await;
    assert_eq!(own.body["total"], 1);
    assert_eq!(own.items()[0]["name"], "new.txt");

    let own_archived = app
        .request("GET", "/files/paged?status=ARCHIVED", None, Some(&alice))
        .await;
    assert_eq!(own_archived.body["total"], 1);
    assert_eq!(own_archived.items()[0]["name"], "old.txt");

    let everything = app.request("GET", "/files/paged", None, Some(&moderator)).await;
    assert_eq!(everything.body["total"], 3);

    let active = app
        .request("GET", "/files/paged?status=active", None, Some(&moderator))
        .await;
    assert_eq!(active.body["total"], 2);

    let invalid = app
        .request("GET", "/files/paged?status=LOST", None, Some(&moderator))
        .await;
    invalid.assert_error(StatusCode::BAD_REQUEST, "/files/paged");
}
