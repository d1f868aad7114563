//! Remote drive port (driven/secondary port)
//!
//! This module defines the narrow contract the sync engine needs from the
//! remote drive service: paginated listings and content export.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific; the engine only counts and logs them.
//! - Listings are offset/limit based. `DrivePage::total` is the total number
//!   of children reported by the service, not the size of the page.

use crate::domain::newtypes::RemoteId;
use crate::domain::unit::SyncUnit;

/// One page of a remote listing
#[derive(Debug, Clone, Default)]
pub struct DrivePage {
    /// Items on this page
    pub items: Vec<SyncUnit>,
    /// Total number of items in the full listing
    pub total: u64,
}

impl DrivePage {
    pub fn new(items: Vec<SyncUnit>, total: u64) -> Self {
        Self { items, total }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Port trait for the remote drive service
///
/// All methods assume an authenticated session; session management is the
/// adapter's concern.
#[async_trait::async_trait]
pub trait IDriveClient: Send + Sync {
    /// Lists one page of the children of a container
    ///
    /// # Arguments
    /// * `container` - Remote id of the container to list
    /// * `offset` - Index of the first child to return
    /// * `limit` - Maximum number of children to return
    async fn list_page(
        &self,
        container: &RemoteId,
        offset: u64,
        limit: u64,
    ) -> anyhow::Result<DrivePage>;

    /// Lists one page of the team folders visible to the user
    async fn list_team_folders(&self, offset: u64, limit: u64) -> anyhow::Result<DrivePage>;

    /// Lists one page of the items shared with the user
    async fn list_shared_with_me(&self, offset: u64, limit: u64) -> anyhow::Result<DrivePage>;

    /// Exports a document and returns the converted file content
    async fn fetch_content(&self, remote_id: &RemoteId) -> anyhow::Result<Vec<u8>>;
}
