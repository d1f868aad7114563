//! Listing tests, through the client and through the provider port

use std::sync::Arc;

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use synoexport_core::domain::{RemoteId, UnitKind};
use synoexport_core::ports::IDriveClient;
use synoexport_drive::{DriveError, SynologyDriveProvider};

use crate::common::{self, file_json, ENTRY, TEST_SID};

#[tokio::test]
async fn test_list_root_by_path() {
    let (server, client) = common::setup_logged_in().await;
    common::mount_data(
        &server,
        &[
            "api=SYNO.SynologyDrive.Files",
            "method=list",
            "path=%2Fmydrive",
            "offset=0",
            "limit=50",
            &format!("_sid={TEST_SID}"),
        ],
        serde_json::json!({
            "items": [
                file_json("101", "/mydrive/Plans", "dir", ""),
                file_json("102", "/mydrive/q3.osheet", "file", "h-102"),
            ],
            "total": 2
        }),
    )
    .await;

    let list = client
        .list_folder(&RemoteId::new("/mydrive").unwrap(), 0, 50)
        .await
        .unwrap();
    assert_eq!(list.total, 2);
    assert_eq!(list.items.len(), 2);
    assert!(list.items[0].is_dir());
}

#[tokio::test]
async fn test_provider_lists_folder_by_id() {
    let (server, client) = common::setup_logged_in().await;
    common::mount_data(
        &server,
        &["method=list", "path=id%3A101", "offset=100"],
        serde_json::json!({
            "items": [
                file_json("201", "/mydrive/Plans/Archive", "dir", ""),
                file_json("202", "/mydrive/Plans/budget.odoc", "file", "h-202"),
            ],
            "total": 102
        }),
    )
    .await;

    let provider = SynologyDriveProvider::new(Arc::new(client));
    let page = provider
        .list_page(&RemoteId::new("101").unwrap(), 100, 100)
        .await
        .unwrap();

    assert_eq!(page.total, 102);
    assert_eq!(page.items[0].kind, UnitKind::Container);
    assert_eq!(page.items[1].kind, UnitKind::Leaf);
    assert_eq!(page.items[1].content_hash, "h-202");
    assert_eq!(page.items[1].display_path, "/mydrive/Plans/budget.odoc");
}

#[tokio::test]
async fn test_provider_team_folders_are_containers() {
    let (server, client) = common::setup_logged_in().await;
    common::mount_data(
        &server,
        &["api=SYNO.SynologyDrive.TeamFolders", "method=list"],
        serde_json::json!({
            "items": [ { "file_id": "301", "name": "Sales", "display_path": "/team-folders/Sales" } ],
            "total": 1
        }),
    )
    .await;

    let provider = SynologyDriveProvider::new(Arc::new(client));
    let page = provider.list_team_folders(0, 100).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert!(page.items[0].is_container());
    assert_eq!(page.items[0].remote_id.as_str(), "301");
}

#[tokio::test]
async fn test_provider_shared_with_me() {
    let (server, client) = common::setup_logged_in().await;
    common::mount_data(
        &server,
        &["api=SYNO.SynologyDrive.Files", "method=shared_with_me"],
        serde_json::json!({
            "items": [ file_json("401", "/shared-with-me/notes.odoc", "file", "h-401") ],
            "total": 1
        }),
    )
    .await;

    let provider = SynologyDriveProvider::new(Arc::new(client));
    let page = provider.list_shared_with_me(0, 100).await.unwrap();
    assert_eq!(page.items[0].kind, UnitKind::Leaf);
}

#[tokio::test]
async fn test_expired_session_is_unauthorized() {
    let (server, client) = common::setup_logged_in().await;
    common::mount_api_error(&server, &["method=list"], 119).await;

    let err = client
        .list_folder(&RemoteId::new("/mydrive").unwrap(), 0, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, DriveError::Unauthorized(_)));
}

#[tokio::test]
async fn test_api_error_code_is_kept() {
    let (server, client) = common::setup_logged_in().await;
    common::mount_api_error(&server, &["method=list"], 1002).await;

    let err = client
        .list_folder(&RemoteId::new("101").unwrap(), 0, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, DriveError::Api { code: 1002, .. }), "got {err:?}");
}

#[tokio::test]
async fn test_provider_error_has_context() {
    let (server, client) = common::setup_logged_in().await;
    common::mount_api_error(&server, &["method=list"], 1002).await;

    let provider = SynologyDriveProvider::new(Arc::new(client));
    let err = provider
        .list_page(&RemoteId::new("101").unwrap(), 0, 10)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to list folder 101"));
}

#[tokio::test]
async fn test_retries_transient_server_error() {
    let (server, client) = common::setup_logged_in().await;

    // First listing attempt fails with 503, the retry succeeds.
    Mock::given(method("POST"))
        .and(path(ENTRY))
        .and(body_string_contains("method=list"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    common::mount_data(
        &server,
        &["method=list"],
        serde_json::json!({ "items": [], "total": 0 }),
    )
    .await;

    let list = client
        .list_folder(&RemoteId::new("/mydrive").unwrap(), 0, 10)
        .await
        .unwrap();
    assert_eq!(list.total, 0);
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let (server, client) = common::setup_logged_in().await;
    Mock::given(method("POST"))
        .and(path(ENTRY))
        .and(body_string_contains("method=list"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = client
        .list_folder(&RemoteId::new("/mydrive").unwrap(), 0, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, DriveError::ServerError(_)));
}
