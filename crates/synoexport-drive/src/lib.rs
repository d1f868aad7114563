//! SynoExport Drive - Synology Drive / Synology Office API client
//!
//! Provides async client for:
//! - Session login/logout against `SYNO.API.Auth`
//! - Paginated listings of folders, team folders and shared items
//! - Export of Synology Office documents to Microsoft Office formats
//!
//! ## Modules
//!
//! - [`client`] - HTTP client for the `webapi/entry.cgi` endpoint
//! - [`provider`] - `IDriveClient` implementation used by the sync engine
//! - [`types`] - Wire types of the listing responses

pub mod client;
pub mod provider;
pub mod types;

use thiserror::Error;

pub use client::DriveClient;
pub use provider::SynologyDriveProvider;

/// Errors that can occur when communicating with the Synology NAS
#[derive(Debug, Error)]
pub enum DriveError {
    /// Credentials were rejected or the session is no longer valid
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The API answered with `success: false`
    #[error("Synology API {api} failed with error code {code}")]
    Api {
        /// API name, e.g. `SYNO.SynologyDrive.Files`
        api: String,
        /// Synology error code
        code: i64,
    },

    /// The NAS asked us to slow down (HTTP 429)
    #[error("Too many requests")]
    TooManyRequests,

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A call that needs a session was made before `login`
    #[error("Not logged in")]
    NotLoggedIn,
}

impl DriveError {
    /// Returns true for failures worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            DriveError::TooManyRequests | DriveError::ServerError(_) => true,
            DriveError::NetworkError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            DriveError::Unauthorized(_)
            | DriveError::Api { .. }
            | DriveError::InvalidResponse(_)
            | DriveError::NotLoggedIn => false,
        }
    }
}
