//! Shared test helpers for Synology API integration tests
//!
//! Every API goes through `POST /webapi/entry.cgi` with a form body, so the
//! mocks match on fragments of the url-encoded body (`/` is sent as `%2F`,
//! `:` as `%3A`).

use std::time::Duration;

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use synoexport_drive::client::DriveClient;

pub const ENTRY: &str = "/webapi/entry.cgi";
pub const TEST_SID: &str = "sid-test-001";

/// Starts a mock server answering logins with [`TEST_SID`] and returns a
/// client that is already logged in.
pub async fn setup_logged_in() -> (MockServer, DriveClient) {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let mut client = DriveClient::with_base_url(server.uri())
        .with_retry_policy(2, Duration::from_millis(10));
    client
        .login("alice", "secret")
        .await
        .expect("login against mock server");

    (server, client)
}

pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(ENTRY))
        .and(body_string_contains("api=SYNO.API.Auth"))
        .and(body_string_contains("method=login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": { "sid": TEST_SID }
        })))
        .mount(server)
        .await;
}

/// Mounts a successful answer for requests whose body contains every
/// fragment in `fragments`.
pub async fn mount_data(server: &MockServer, fragments: &[&str], data: serde_json::Value) {
    let mut mock = Mock::given(method("POST")).and(path(ENTRY));
    for fragment in fragments {
        mock = mock.and(body_string_contains(*fragment));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "success": true,
        "data": data
    })))
    .mount(server)
    .await;
}

/// Mounts a `success: false` answer with the given error code.
pub async fn mount_api_error(server: &MockServer, fragments: &[&str], code: i64) {
    let mut mock = Mock::given(method("POST")).and(path(ENTRY));
    for fragment in fragments {
        mock = mock.and(body_string_contains(*fragment));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "success": false,
        "error": { "code": code }
    })))
    .mount(server)
    .await;
}

/// A listing entry as returned by `SYNO.SynologyDrive.Files`
pub fn file_json(file_id: &str, display_path: &str, item_type: &str, hash: &str) -> serde_json::Value {
    let name = display_path.rsplit('/').next().unwrap_or(display_path);
    serde_json::json!({
        "file_id": file_id,
        "name": name,
        "display_path": display_path,
        "type": item_type,
        "content_type": if item_type == "dir" { "dir" } else { "document" },
        "hash": hash,
    })
}
