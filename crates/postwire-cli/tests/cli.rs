#![deny(clippy::all, clippy::pedantic)]

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;

#[test]
fn pending_count_works_end_to_end() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/api/comments/pending_count/");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"count":7}"#);
    });

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("postwire-cli"));
    let assert = cmd
        .env_remove("POSTWIRE_API__BASE_URL")
        .arg("--api-url")
        .arg(server.base_url())
        .arg("comments")
        .arg("pending-count")
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("\"count\": 7"));
    mock.assert();
}

#[test]
fn fallback_read_prints_payload_and_fails() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/posts/");
        then.status(503);
    });

    Command::new(assert_cmd::cargo::cargo_bin!("postwire-cli"))
        .env("POSTWIRE_API__BASE_URL", server.base_url())
        .args(["posts", "list"])
        .assert()
        .failure()
        .stdout(contains("\"results\": []"))
        .stderr(contains("Degraded"));
}

#[test]
fn missing_api_url_fails_fast() {
    Command::new(assert_cmd::cargo::cargo_bin!("postwire-cli"))
        .env_remove("POSTWIRE_API__BASE_URL")
        .args(["comments", "pending-count"])
        .assert()
        .failure()
        .stderr(contains("api.base_url"));
}
