//! Wire types of the Synology Drive API
//!
//! Every call answers with an envelope:
//!
//! ```text
//! { "success": true,  "data": { ... } }
//! { "success": false, "error": { "code": 119 } }
//! ```

use serde::Deserialize;

/// Response envelope shared by all `entry.cgi` APIs
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: i64,
}

/// `data` of a successful login
#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    pub sid: String,
}

/// One page of a listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub items: Vec<DriveItem>,
    /// Total number of items in the full listing
    #[serde(default)]
    pub total: u64,
}

/// A file, folder or team folder as returned by the listing APIs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriveItem {
    pub file_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_path: String,
    /// `dir` or `file`
    #[serde(rename = "type", default)]
    pub item_type: String,
    /// `document`, `spreadsheet`, `slides`, ... for Office files
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub hash: String,
}

impl DriveItem {
    pub fn is_dir(&self) -> bool {
        self.item_type == "dir"
    }
}
