//! SynologyDriveProvider - IDriveClient implementation for Synology Drive
//!
//! Wraps a logged-in [`DriveClient`] and maps the wire types onto the
//! [`SyncUnit`] values the sync engine traverses.
//!
//! ## Design Notes
//!
//! - Session handling stays on the client. The provider only takes `&self`
//!   calls, so the client is logged in before it is wrapped.
//! - Folders and team folders become containers, everything else a leaf.
//!   Whether a leaf is exportable is decided by the engine.
//! - An item without a usable id fails the whole listing; dropping it would
//!   make its history entry look obsolete.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use synoexport_core::domain::newtypes::RemoteId;
use synoexport_core::domain::unit::SyncUnit;
use synoexport_core::ports::drive_client::{DrivePage, IDriveClient};

use crate::client::DriveClient;
use crate::types::{DriveItem, FileList};

/// Synology Drive adapter for the [`IDriveClient`] port
pub struct SynologyDriveProvider {
    client: Arc<DriveClient>,
}

impl SynologyDriveProvider {
    pub fn new(client: Arc<DriveClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<DriveClient> {
        &self.client
    }
}

/// Display path of an item, falling back to `<parent>/<name>` when the
/// service leaves it empty
fn display_path(item: &DriveItem, parent: Option<&str>) -> String {
    if !item.display_path.is_empty() {
        return item.display_path.clone();
    }
    match parent {
        Some(parent) => format!("{}/{}", parent.trim_end_matches('/'), item.name),
        None => item.name.clone(),
    }
}

fn to_unit(item: DriveItem, parent: Option<&str>, force_container: bool) -> Result<SyncUnit> {
    let remote_id = RemoteId::new(item.file_id.clone())
        .with_context(|| format!("Listing returned an invalid file id for {:?}", item.name))?;
    let path = display_path(&item, parent);

    if force_container || item.is_dir() {
        Ok(SyncUnit::container(remote_id, path))
    } else {
        Ok(SyncUnit::leaf(remote_id, path, item.hash, item.content_type))
    }
}

fn to_page(list: FileList, parent: Option<&str>, force_container: bool) -> Result<DrivePage> {
    let items = list
        .items
        .into_iter()
        .map(|item| to_unit(item, parent, force_container))
        .collect::<Result<Vec<_>>>()?;
    Ok(DrivePage::new(items, list.total))
}

#[async_trait::async_trait]
impl IDriveClient for SynologyDriveProvider {
    async fn list_page(&self, container: &RemoteId, offset: u64, limit: u64) -> Result<DrivePage> {
        let list = self
            .client
            .list_folder(container, offset, limit)
            .await
            .with_context(|| format!("Failed to list folder {container}"))?;

        // Only category roots carry a path-like id usable as parent path.
        let parent = container
            .as_str()
            .starts_with('/')
            .then_some(container.as_str());
        let page = to_page(list, parent, false)?;
        debug!(container = %container, offset, items = page.items.len(), total = page.total, "Listed page");
        Ok(page)
    }

    async fn list_team_folders(&self, offset: u64, limit: u64) -> Result<DrivePage> {
        let list = self
            .client
            .list_team_folders(offset, limit)
            .await
            .context("Failed to list team folders")?;
        to_page(list, Some("/team-folders"), true)
    }

    async fn list_shared_with_me(&self, offset: u64, limit: u64) -> Result<DrivePage> {
        let list = self
            .client
            .list_shared_with_me(offset, limit)
            .await
            .context("Failed to list items shared with me")?;
        to_page(list, Some("/shared-with-me"), false)
    }

    async fn fetch_content(&self, remote_id: &RemoteId) -> Result<Vec<u8>> {
        self.client
            .export_document(remote_id)
            .await
            .with_context(|| format!("Failed to export document {remote_id}"))
    }
}
