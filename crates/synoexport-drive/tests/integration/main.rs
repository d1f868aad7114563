//! Integration tests for synoexport-drive
//!
//! Uses wiremock to simulate the Synology `webapi/entry.cgi` endpoint and
//! verifies end-to-end behavior of the DriveClient and the
//! SynologyDriveProvider.

mod common;

mod test_auth;
mod test_export;
mod test_listing;
