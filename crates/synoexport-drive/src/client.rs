//! Synology Drive HTTP client
//!
//! All calls go to `<base_url>/webapi/entry.cgi` as form-encoded POST requests
//! naming the API, its version and the method. The session id obtained by
//! [`DriveClient::login`] is sent as `_sid` on every later call.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use synoexport_core::domain::RemoteId;
//! use synoexport_drive::client::DriveClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut client = DriveClient::with_base_url("https://nas.local:5001");
//! client.login("alice", "secret").await?;
//! let page = client.list_folder(&RemoteId::new("/mydrive")?, 0, 100).await?;
//! println!("{} items", page.total);
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use synoexport_core::config::DriveConfig;
use synoexport_core::domain::RemoteId;

use crate::types::{ApiEnvelope, FileList, LoginData};
use crate::DriveError;

const ENTRY_PATH: &str = "/webapi/entry.cgi";

const AUTH_API: &str = "SYNO.API.Auth";
const FILES_API: &str = "SYNO.SynologyDrive.Files";
const TEAM_FOLDERS_API: &str = "SYNO.SynologyDrive.TeamFolders";
const EXPORT_API: &str = "SYNO.Office.Export";

/// Session name requested at login
const SESSION_NAME: &str = "SynologyDrive";

/// Error code for an unknown or expired session id
const ERROR_INVALID_SESSION: i64 = 119;

/// Error code for a rejected account or password
const ERROR_BAD_CREDENTIALS: i64 = 400;

/// Maximum number of retries for transient failures
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Upper bound for a single backoff delay
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay before retry number `attempt + 1`: doubles from `base`, capped at
/// [`MAX_RETRY_DELAY`]
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_RETRY_DELAY)
}

/// HTTP client for the Synology Drive and Synology Office APIs
pub struct DriveClient {
    client: Client,
    base_url: String,
    sid: Option<String>,
    max_retries: u32,
    retry_delay: Duration,
}

impl DriveClient {
    /// Creates a client from the `drive` configuration section
    pub fn new(config: &DriveConfig) -> Result<Self, DriveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;
        if !config.verify_tls {
            warn!("TLS certificate verification is disabled");
        }

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            sid: None,
            max_retries: config.max_retries,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Creates a client with default settings against `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sid: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Overrides the retry policy
    pub fn with_retry_policy(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_logged_in(&self) -> bool {
        self.sid.is_some()
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Logs in and keeps the session id for later calls
    #[tracing::instrument(skip(self, password), fields(base_url = %self.base_url))]
    pub async fn login(&mut self, account: &str, password: &str) -> Result<(), DriveError> {
        let params = [
            ("account", account.to_string()),
            ("passwd", password.to_string()),
            ("session", SESSION_NAME.to_string()),
            ("format", "sid".to_string()),
        ];
        let data: LoginData = self.call(AUTH_API, 6, "login", &params).await?;
        self.sid = Some(data.sid);
        info!("Logged in to Synology NAS");
        Ok(())
    }

    /// Ends the session
    pub async fn logout(&self) -> Result<(), DriveError> {
        let params = [("session", SESSION_NAME.to_string())];
        let envelope: ApiEnvelope<serde_json::Value> =
            self.call_envelope(AUTH_API, 6, "logout", &params).await?;
        check(envelope, AUTH_API)?;
        info!("Logged out from Synology NAS");
        Ok(())
    }

    // ========================================================================
    // Listings
    // ========================================================================

    /// Lists one page of the children of a folder
    pub async fn list_folder(
        &self,
        folder: &RemoteId,
        offset: u64,
        limit: u64,
    ) -> Result<FileList, DriveError> {
        debug!(folder = %folder, offset, limit, "Listing folder");
        let params = [
            ("path", drive_path(folder)),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        self.call(FILES_API, 2, "list", &params).await
    }

    /// Lists one page of the team folders
    pub async fn list_team_folders(&self, offset: u64, limit: u64) -> Result<FileList, DriveError> {
        debug!(offset, limit, "Listing team folders");
        let params = [("offset", offset.to_string()), ("limit", limit.to_string())];
        self.call(TEAM_FOLDERS_API, 1, "list", &params).await
    }

    /// Lists one page of the items shared with the user
    pub async fn list_shared_with_me(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<FileList, DriveError> {
        debug!(offset, limit, "Listing items shared with me");
        let params = [("offset", offset.to_string()), ("limit", limit.to_string())];
        self.call(FILES_API, 2, "shared_with_me", &params).await
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Exports a Synology Office document and returns the converted bytes
    pub async fn export_document(&self, file: &RemoteId) -> Result<Vec<u8>, DriveError> {
        let params = [("path", format!("id:{}", file.as_str()))];
        let response = self.send_with_retry(EXPORT_API, 1, "download", &params).await?;

        // Failures come back as a JSON envelope instead of file content.
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        if is_json {
            let envelope: ApiEnvelope<serde_json::Value> = response
                .json()
                .await
                .map_err(|e| DriveError::InvalidResponse(e.to_string()))?;
            check(envelope, EXPORT_API)?;
            return Err(DriveError::InvalidResponse(
                "export returned JSON instead of file content".to_string(),
            ));
        }

        let bytes = response.bytes().await?;
        debug!(file = %file, bytes = bytes.len(), "Document exported");
        Ok(bytes.to_vec())
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, ENTRY_PATH)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        api: &str,
        version: u32,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, DriveError> {
        let envelope = self.call_envelope(api, version, method, params).await?;
        check(envelope, api)?.ok_or_else(|| {
            DriveError::InvalidResponse(format!("{api} {method} returned no data"))
        })
    }

    async fn call_envelope<T: DeserializeOwned>(
        &self,
        api: &str,
        version: u32,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<ApiEnvelope<T>, DriveError> {
        let response = self.send_with_retry(api, version, method, params).await?;
        response
            .json()
            .await
            .map_err(|e| DriveError::InvalidResponse(e.to_string()))
    }

    /// Sends a request, retrying transient failures with exponential backoff
    async fn send_with_retry(
        &self,
        api: &str,
        version: u32,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<Response, DriveError> {
        let mut attempt = 0;
        loop {
            match self.send(api, version, method, params).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = backoff_delay(self.retry_delay, attempt);
                    warn!(
                        api,
                        method,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Ok(response) => {
                    if attempt > 0 {
                        info!(api, method, attempt, "Request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(
        &self,
        api: &str,
        version: u32,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<Response, DriveError> {
        let mut form: Vec<(&str, String)> = vec![
            ("api", api.to_string()),
            ("version", version.to_string()),
            ("method", method.to_string()),
        ];
        form.extend(params.iter().cloned());
        if api != AUTH_API || method != "login" {
            let sid = self.sid.as_ref().ok_or(DriveError::NotLoggedIn)?;
            form.push(("_sid", sid.clone()));
        }

        let response = self.client.post(self.endpoint()).form(&form).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => DriveError::TooManyRequests,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                DriveError::Unauthorized(format!("HTTP {status}"))
            }
            s if s.is_server_error() => DriveError::ServerError(format!("HTTP {status}")),
            _ => DriveError::InvalidResponse(format!("unexpected HTTP status {status}")),
        })
    }
}

/// Unwraps an envelope, mapping `success: false` to a [`DriveError`]
fn check<T>(envelope: ApiEnvelope<T>, api: &str) -> Result<Option<T>, DriveError> {
    if envelope.success {
        return Ok(envelope.data);
    }

    let code = envelope.error.map(|e| e.code).unwrap_or_default();
    Err(match code {
        ERROR_INVALID_SESSION => DriveError::Unauthorized("session is invalid or expired".into()),
        ERROR_BAD_CREDENTIALS if api == AUTH_API => {
            DriveError::Unauthorized("account or password rejected".into())
        }
        code => DriveError::Api {
            api: api.to_string(),
            code,
        },
    })
}

/// `path` parameter addressing a file or folder
///
/// Category roots such as `/mydrive` are addressed by path, everything else
/// by file id.
fn drive_path(id: &RemoteId) -> String {
    if id.as_str().starts_with('/') {
        id.as_str().to_string()
    } else {
        format!("id:{}", id.as_str())
    }
}
