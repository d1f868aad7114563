//! Document export tests

use std::sync::Arc;

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use synoexport_core::domain::RemoteId;
use synoexport_core::ports::IDriveClient;
use synoexport_drive::{DriveError, SynologyDriveProvider};

use crate::common::{self, ENTRY};

const DOCX_BYTES: &[u8] = b"PK\x03\x04 fake docx";

#[tokio::test]
async fn test_export_returns_file_content() {
    let (server, client) = common::setup_logged_in().await;
    Mock::given(method("POST"))
        .and(path(ENTRY))
        .and(body_string_contains("api=SYNO.Office.Export"))
        .and(body_string_contains("method=download"))
        .and(body_string_contains("path=id%3A882614125167948806"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                DOCX_BYTES,
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = SynologyDriveProvider::new(Arc::new(client));
    let bytes = provider
        .fetch_content(&RemoteId::new("882614125167948806").unwrap())
        .await
        .unwrap();
    assert_eq!(bytes, DOCX_BYTES);
}

#[tokio::test]
async fn test_export_json_error_envelope() {
    let (server, client) = common::setup_logged_in().await;
    common::mount_api_error(&server, &["api=SYNO.Office.Export"], 1002).await;

    let err = client
        .export_document(&RemoteId::new("42").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, DriveError::Api { code: 1002, .. }), "got {err:?}");
}

#[tokio::test]
async fn test_export_not_found_status() {
    let (server, client) = common::setup_logged_in().await;
    Mock::given(method("POST"))
        .and(path(ENTRY))
        .and(body_string_contains("api=SYNO.Office.Export"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client
        .export_document(&RemoteId::new("42").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, DriveError::InvalidResponse(_)));
}
