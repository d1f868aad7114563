//! Session tests

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use synoexport_drive::client::DriveClient;
use synoexport_drive::DriveError;

use crate::common::{self, ENTRY, TEST_SID};

#[tokio::test]
async fn test_login_stores_session() {
    let (_server, client) = common::setup_logged_in().await;
    assert!(client.is_logged_in());
}

#[tokio::test]
async fn test_login_sends_credentials_and_session_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENTRY))
        .and(body_string_contains("account=alice"))
        .and(body_string_contains("passwd=secret"))
        .and(body_string_contains("session=SynologyDrive"))
        .and(body_string_contains("format=sid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": { "sid": TEST_SID }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = DriveClient::with_base_url(server.uri());
    client.login("alice", "secret").await.unwrap();
    assert!(client.is_logged_in());
}

#[tokio::test]
async fn test_rejected_credentials_are_unauthorized() {
    let server = MockServer::start().await;
    common::mount_api_error(&server, &["method=login"], 400).await;

    let mut client = DriveClient::with_base_url(server.uri());
    let err = client.login("alice", "wrong").await.unwrap_err();
    assert!(matches!(err, DriveError::Unauthorized(_)), "got {err:?}");
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_logout_sends_sid() {
    let (server, client) = common::setup_logged_in().await;
    Mock::given(method("POST"))
        .and(path(ENTRY))
        .and(body_string_contains("method=logout"))
        .and(body_string_contains(format!("_sid={TEST_SID}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": true })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.logout().await.unwrap();
}

#[tokio::test]
async fn test_logout_without_session() {
    let client = DriveClient::with_base_url("http://127.0.0.1:9");
    let err = client.logout().await.unwrap_err();
    assert!(matches!(err, DriveError::NotLoggedIn));
}

#[tokio::test]
async fn test_http_unauthorized_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENTRY))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut client = DriveClient::with_base_url(server.uri());
    let err = client.login("alice", "secret").await.unwrap_err();
    assert!(matches!(err, DriveError::Unauthorized(_)));
}
