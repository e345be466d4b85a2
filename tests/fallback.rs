use std::time::{Duration, Instant};

use httpmock::MockServer;
use postwire::config::ApiSettings;
use postwire::{BlogClient, Upload};
use postwire_api_types::{ModerationStatus, Post, PostQuery};
use serde_json::json;
use url::Url;

fn settings(server: &MockServer, timeout_ms: u64) -> ApiSettings {
    ApiSettings::new(Url::parse(&server.base_url()).expect("mock url"))
        .expect("api settings")
        .with_timeout(Duration::from_millis(timeout_ms))
}

fn client(server: &MockServer, timeout_ms: u64) -> BlogClient {
    BlogClient::new(&settings(server, timeout_ms)).expect("client")
}

#[tokio::test]
async fn timed_out_list_resolves_to_empty_envelope() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/posts/");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"results": [], "count": 0}))
            .delay(Duration::from_secs(3));
    });

    let client = client(&server, 100);
    let started = Instant::now();
    let fetched = client.posts().list(&PostQuery::default()).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    let error = fetched.error().expect("fallback");
    assert!(error.is_timeout());

    let envelope = fetched.value();
    assert!(envelope.is_empty());
    assert_eq!(envelope.count, 0);
    assert_eq!(envelope.total_pages, 1);
    assert_eq!(envelope.current_page, 1);
    assert_eq!(
        envelope.error.as_deref(),
        Some("request timed out after 100 ms")
    );
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn unreachable_backend_yields_placeholder_post() {
    // Nothing listens on port 9 of the loopback interface.
    let settings = ApiSettings::new(Url::parse("http://127.0.0.1:9").expect("url"))
        .expect("settings")
        .with_timeout(Duration::from_millis(2_000));
    let client = BlogClient::new(&settings).expect("client");

    let fetched = client.posts().get(3).await;
    let post = fetched.value();
    assert!(!fetched.is_fresh());
    assert_eq!(post.id, 3);
    assert_eq!(
        post.content,
        "There was an error loading this post. Please try again later."
    );
    assert!(post.error.is_some());
}

#[tokio::test]
async fn bare_array_list_is_normalized() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET")
            .path("/api/posts/")
            .query_param("published", "true")
            .query_param("page_size", "10");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([
                {"id": 1, "title": "one", "published": "true"},
                {"id": 2, "title": "two", "created_at": "not a date"}
            ]));
    });

    let client = client(&server, 5_000);
    let fetched = client.posts().list(&PostQuery::default()).await;
    let envelope = fetched.value();

    assert!(fetched.is_fresh());
    assert_eq!(envelope.count, 2);
    assert_eq!(envelope.total_pages, 1);
    assert!(envelope.results[0].published);
    assert!(envelope.results[1].created_at.is_none());
}

#[tokio::test]
async fn delete_with_no_content_resolves_true() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("DELETE")
            .path("/api/posts/5/")
            .header("X-CSRFToken", "csrf-123");
        then.status(204);
    });

    let client = BlogClient::new(&settings(&server, 5_000).with_csrf_token("csrf-123"))
        .expect("client");
    client.post_cache().put(5, Post::placeholder(5, "seed"));

    let deleted = client.posts().delete(5).await.expect("delete");

    mock.assert();
    assert!(deleted);
    assert!(!client.post_cache().contains(&5));
}

#[tokio::test]
async fn comment_thread_falls_back_to_bucket_lists() {
    let server = MockServer::start();
    let combined = server.mock(|when, then| {
        when.method("GET")
            .path("/api/comments/all/")
            .query_param("post", "5");
        then.status(404)
            .header("content-type", "application/json")
            .body(r#"{"detail":"Not found."}"#);
    });
    let approved = server.mock(|when, then| {
        when.method("GET")
            .path("/api/comments/")
            .query_param("post", "5")
            .query_param("approved", "true");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"results": [{"id": 1, "post": 5, "content": "hi", "approved": true}], "count": 1}));
    });
    let pending = server.mock(|when, then| {
        when.method("GET")
            .path("/api/comments/")
            .query_param("post", "5")
            .query_param("approved", "false");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([{"id": 2, "post": 5, "content": "wait", "approved": false}]));
    });

    let client = client(&server, 5_000);
    let fetched = client.comments().thread(5).await;

    combined.assert();
    approved.assert();
    pending.assert();
    assert!(fetched.is_fresh());
    let thread = fetched.value();
    assert_eq!(thread.approved[0].id, 1);
    assert_eq!(thread.pending[0].status(), ModerationStatus::Pending);
    assert_eq!(thread.total, 2);
}

#[tokio::test]
async fn comment_thread_degrades_to_empty_when_everything_fails() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET");
        then.status(502).body("bad gateway");
    });

    let client = client(&server, 5_000);
    let fetched = client.comments().thread(5).await;

    assert!(!fetched.is_fresh());
    let thread = fetched.value();
    assert!(thread.approved.is_empty());
    assert!(thread.pending.is_empty());
    assert!(thread.error.as_deref().is_some_and(|err| err.contains("502")));
}

#[tokio::test]
async fn moderation_actions_send_csrf_and_propagate_errors() {
    let server = MockServer::start();
    let approve = server.mock(|when, then| {
        when.method("POST")
            .path("/api/comments/7/approve/")
            .header("X-CSRFToken", "tok");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"status": "comment approved"}));
    });
    server.mock(|when, then| {
        when.method("POST").path("/api/comments/8/reject/");
        then.status(403)
            .header("content-type", "application/json")
            .body(r#"{"detail":"CSRF Failed"}"#);
    });
    let reply = server.mock(|when, then| {
        when.method("PATCH")
            .path("/api/comments/7/")
            .json_body_includes(r#"{"admin_reply":"Thanks!"}"#);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": 7, "content": "c", "approved": true, "admin_reply": "Thanks!"}));
    });

    let client = BlogClient::new(&settings(&server, 5_000).with_csrf_token("tok")).expect("client");
    let comments = client.comments();

    let approved = comments.approve(7).await.expect("approve");
    assert_eq!(approved["status"], "comment approved");
    approve.assert();

    let err = comments.reject(8).await.expect_err("reject fails");
    assert_eq!(
        err.body().and_then(|body| body.detail()).as_deref(),
        Some("CSRF Failed")
    );

    let replied = comments.reply(7, "  Thanks!  ").await.expect("reply");
    reply.assert();
    assert_eq!(replied.admin_reply.as_deref(), Some("Thanks!"));
}

#[tokio::test]
async fn image_upload_is_multipart_and_resolves_media_url() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/api/images/");
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({"id": 9, "post": 5, "image": "/media/post_images/cover.png"}));
    });

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cover.png");
    tokio::fs::write(&path, [0x89_u8, b'P', b'N', b'G'])
        .await
        .expect("write image");

    let client = client(&server, 5_000);
    let upload = Upload::from_path(&path).await.expect("upload");
    assert_eq!(upload.content_type, "image/png");

    let image = client.images().upload(5, upload).await.expect("image");
    mock.assert();
    assert_eq!(image.post, Some(5));

    let url = client.images().url(&image).expect("url");
    assert_eq!(
        url.as_str(),
        format!("{}/media/post_images/cover.png", server.base_url())
    );
}

#[tokio::test]
async fn missing_upload_file_is_an_io_error() {
    let err = Upload::from_path(std::path::Path::new("/definitely/not/here.png"))
        .await
        .expect_err("missing file");
    assert!(matches!(err, postwire::ApiError::Io { .. }));
}

#[tokio::test]
async fn combined_thread_with_null_total_is_not_refetched() {
    let server = MockServer::start();
    let combined = server.mock(|when, then| {
        when.method("GET")
            .path("/api/comments/all/")
            .query_param("post", "5");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "approved": [{"id": 1, "post": 5, "content": "hi", "approved": true}],
                "pending": [],
                "total": null
            }));
    });
    let split = server.mock(|when, then| {
        when.method("GET").path("/api/comments/");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([]));
    });

    let client = client(&server, 5_000);
    let fetched = client.comments().thread(5).await;

    combined.assert();
    split.assert_hits(0);
    assert!(fetched.is_fresh());
    let thread = fetched.value();
    assert_eq!(thread.approved[0].id, 1);
    assert_eq!(thread.total, 1);
}
