//! SyncUnit - the unit of work submitted to the traversal
//!
//! A `SyncUnit` is a port-level view of one remote object: either a
//! container (folder, team folder, drive root) whose children are listed,
//! or a leaf (document) that may be exported.

use serde::{Deserialize, Serialize};

use super::newtypes::RemoteId;

/// Kind of remote object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// A folder-like object whose children are listed page by page
    Container,
    /// A document whose content can be fetched
    Leaf,
}

/// One remote object submitted to the traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncUnit {
    /// Container or leaf
    pub kind: UnitKind,
    /// Remote identifier used for listing and fetching
    pub remote_id: RemoteId,
    /// Human-readable path on the remote drive (e.g. `/mydrive/Plans/q3.osheet`)
    pub display_path: String,
    /// Content fingerprint reported by the remote (empty for containers)
    pub content_hash: String,
    /// Remote content type (e.g. `document`, `spreadsheet`); may be empty
    pub content_type: String,
}

impl SyncUnit {
    /// Creates a container unit
    pub fn container(remote_id: RemoteId, display_path: impl Into<String>) -> Self {
        Self {
            kind: UnitKind::Container,
            remote_id,
            display_path: display_path.into(),
            content_hash: String::new(),
            content_type: String::new(),
        }
    }

    /// Creates a leaf unit
    pub fn leaf(
        remote_id: RemoteId,
        display_path: impl Into<String>,
        content_hash: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            kind: UnitKind::Leaf,
            remote_id,
            display_path: display_path.into(),
            content_hash: content_hash.into(),
            content_type: content_type.into(),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, UnitKind::Container)
    }
}
