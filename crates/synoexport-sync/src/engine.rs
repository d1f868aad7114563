//! Incremental export engine
//!
//! The [`SyncEngine`] walks the remote drive through the [`IDriveClient`]
//! port and exports every Synology Office document it finds, consulting a
//! per-source [`HistoryStore`] to skip documents whose content hash did not
//! change since the previous run.
//!
//! ## Run Flow
//!
//! 1. **Lock**: take the [`ProcessLock`] on the source's history file
//! 2. **Load**: read the history; every entry starts out `Loaded`
//! 3. **Walk**: page through containers, decide per document
//! 4. **Persist**: write the history back
//! 5. **Cleanup**: remove local files of entries still `Loaded`, but only if
//!    the walk had no errors; a partial walk cannot tell "deleted upstream"
//!    from "not reached"
//! 6. **Unlock**: release the lock whatever the outcome
//!
//! ## Per-document decision
//!
//! | History entry                 | Action              | Counter    |
//! |-------------------------------|---------------------|------------|
//! | not an Office document        | nothing             | ignored    |
//! | `Loaded`, same hash           | `mark_skipped`      | skipped    |
//! | `Loaded`, other hash / absent | fetch, write, record| downloaded |
//! | already confirmed this run    | nothing             | errored    |
//! | fetch or write failed         | nothing             | errored    |

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use synoexport_core::config::ExportConfig;
use synoexport_core::domain::{Location, RemoteId, SyncUnit, UnitKind};
use synoexport_core::export::export_location;
use synoexport_core::ports::{DrivePage, IDriveClient, ILocalFileSystem};
use synoexport_history::{Counter, HistoryStore, LockError, ProcessLock};

use crate::SyncError;

/// Remote id and display path of the personal drive root
pub const MY_DRIVE_ROOT: &str = "/mydrive";

// ============================================================================
// ExportSource
// ============================================================================

/// Root category exported with its own history file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExportSource {
    /// The user's personal drive
    #[serde(rename = "mydrive")]
    MyDrive,
    /// Every team folder the user can see
    #[serde(rename = "teamfolder")]
    TeamFolders,
    /// Items other users shared with the user
    #[serde(rename = "shared")]
    SharedWithMe,
}

impl ExportSource {
    pub const ALL: [ExportSource; 3] = [
        ExportSource::MyDrive,
        ExportSource::TeamFolders,
        ExportSource::SharedWithMe,
    ];

    /// Name used in configuration files and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            ExportSource::MyDrive => "mydrive",
            ExportSource::TeamFolders => "teamfolder",
            ExportSource::SharedWithMe => "shared",
        }
    }

    /// File name of the history kept for this source in the output directory
    pub fn history_file_name(&self) -> &'static str {
        match self {
            ExportSource::MyDrive => "mydrive_history.json",
            ExportSource::TeamFolders => "teamfolder_history.json",
            ExportSource::SharedWithMe => "shared_history.json",
        }
    }
}

impl fmt::Display for ExportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mydrive" => Ok(ExportSource::MyDrive),
            "teamfolder" => Ok(ExportSource::TeamFolders),
            "shared" => Ok(ExportSource::SharedWithMe),
            other => Err(format!(
                "unknown export source '{other}' (expected mydrive, teamfolder or shared)"
            )),
        }
    }
}

// ============================================================================
// SyncOptions / SyncStats
// ============================================================================

/// Settings for one engine
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Directory receiving exported files and history files
    pub output_dir: PathBuf,
    /// Number of children requested per listing call
    pub page_size: u64,
    /// Ignore stored hashes and export everything
    pub force_refresh: bool,
    /// Decide and count, but fetch, write and remove nothing
    pub dry_run: bool,
    pub dir_mode: u32,
    pub file_mode: u32,
}

impl SyncOptions {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            page_size: config.page_size.max(1),
            force_refresh: config.force_refresh,
            dry_run: config.dry_run,
            dir_mode: config.dir_mode,
            file_mode: config.file_mode,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

/// Summary of one or more export runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub downloaded: u64,
    pub skipped: u64,
    pub ignored: u64,
    pub removed: u64,
    pub download_errors: u64,
    pub remove_errors: u64,
}

impl SyncStats {
    /// Adds the counters of `other` to this summary
    pub fn merge(&mut self, other: &SyncStats) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.ignored += other.ignored;
        self.removed += other.removed;
        self.download_errors += other.download_errors;
        self.remove_errors += other.remove_errors;
    }

    pub fn total_errors(&self) -> u64 {
        self.download_errors + self.remove_errors
    }

    pub fn is_success(&self) -> bool {
        self.total_errors() == 0
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Collects every item of an offset/limit listing
///
/// Stops once the reported total is reached or a page comes back empty.
async fn collect_pages<F, Fut>(page_size: u64, mut list: F) -> anyhow::Result<Vec<SyncUnit>>
where
    F: FnMut(u64, u64) -> Fut,
    Fut: Future<Output = anyhow::Result<DrivePage>>,
{
    let mut units = Vec::new();
    let mut offset = 0;
    loop {
        let page = list(offset, page_size).await?;
        if page.is_empty() {
            break;
        }
        offset += page.items.len() as u64;
        units.extend(page.items);
        if offset >= page.total {
            break;
        }
    }
    Ok(units)
}

type UnitFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

// ============================================================================
// SyncEngine
// ============================================================================

/// Incremental export engine
///
/// ## Dependencies
///
/// - `drive`: Remote listings and document export
/// - `local_filesystem`: Writing exported files and removing obsolete ones
pub struct SyncEngine {
    drive: Arc<dyn IDriveClient>,
    local_filesystem: Arc<dyn ILocalFileSystem>,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(
        drive: Arc<dyn IDriveClient>,
        local_filesystem: Arc<dyn ILocalFileSystem>,
        options: SyncOptions,
    ) -> Self {
        Self {
            drive,
            local_filesystem,
            options,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Path of the history file for `file_name`
    pub fn history_path(&self, file_name: &str) -> PathBuf {
        self.options.output_dir.join(file_name)
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Exports one source
    ///
    /// # Errors
    /// [`SyncError::RootListing`] if the source's roots cannot be listed, or
    /// any error of [`SyncEngine::sync_roots`].
    #[tracing::instrument(skip(self))]
    pub async fn export(&self, source: ExportSource) -> Result<SyncStats, SyncError> {
        let roots = self.resolve_roots(source).await?;
        info!(roots = roots.len(), "Export roots resolved");
        self.sync_roots(&roots, source.history_file_name()).await
    }

    /// Runs one export over `roots`, tracked in `history_file`
    ///
    /// # Errors
    /// Returns an error if the lock is held, or if the history cannot be
    /// loaded or persisted. Errors on single items are only counted.
    #[tracing::instrument(skip(self, roots), fields(roots = roots.len(), dry_run = self.options.dry_run))]
    pub async fn sync_roots(
        &self,
        roots: &[SyncUnit],
        history_file: &str,
    ) -> Result<SyncStats, SyncError> {
        tokio::fs::create_dir_all(&self.options.output_dir).await?;
        let history_path = self.history_path(history_file);

        let lock = match ProcessLock::acquire(&history_path) {
            Ok(lock) => lock,
            Err(LockError::Held { path, holder }) => {
                error!(path = %path.display(), ?holder, "History file is locked");
                return Err(SyncError::AlreadyRunning { path });
            }
            Err(e) => return Err(e.into()),
        };

        let result = self.run_locked(roots, &history_path).await;

        if let Err(e) = lock.release() {
            warn!(error = %e, "Failed to release history lock");
        }
        result
    }

    async fn run_locked(
        &self,
        roots: &[SyncUnit],
        history_path: &Path,
    ) -> Result<SyncStats, SyncError> {
        let store = HistoryStore::new(history_path).dry_run(self.options.dry_run);
        store.load().await?;

        for root in roots {
            self.process_unit(&store, root).await;
        }

        // Entries not seen are dropped from the file only on runs that go on
        // to remove their files; a restored document is then new again.
        let counters = store.stats();
        let clean = counters.errored == 0;
        if clean {
            store.persist_pruning_obsolete().await?;
        } else {
            store.persist().await?;
        }

        let mut stats = SyncStats {
            downloaded: counters.downloaded,
            skipped: counters.skipped,
            ignored: counters.ignored,
            download_errors: counters.errored,
            ..SyncStats::default()
        };

        if !clean {
            warn!(
                errors = counters.errored,
                "Errors during export, not removing obsolete files"
            );
        } else {
            let (removed, remove_errors) = self.remove_obsolete(&store).await?;
            stats.removed = removed;
            stats.remove_errors = remove_errors;
        }

        info!(
            downloaded = stats.downloaded,
            skipped = stats.skipped,
            ignored = stats.ignored,
            removed = stats.removed,
            download_errors = stats.download_errors,
            remove_errors = stats.remove_errors,
            "Export finished"
        );
        Ok(stats)
    }

    async fn resolve_roots(&self, source: ExportSource) -> Result<Vec<SyncUnit>, SyncError> {
        let page_size = self.options.page_size;
        let listed = match source {
            ExportSource::MyDrive => {
                let root = SyncUnit::container(RemoteId::new(MY_DRIVE_ROOT)?, MY_DRIVE_ROOT);
                return Ok(vec![root]);
            }
            ExportSource::TeamFolders => {
                collect_pages(page_size, |offset, limit| {
                    self.drive.list_team_folders(offset, limit)
                })
                .await
            }
            ExportSource::SharedWithMe => {
                collect_pages(page_size, |offset, limit| {
                    self.drive.list_shared_with_me(offset, limit)
                })
                .await
            }
        };

        listed.map_err(|e| SyncError::RootListing {
            source_name: source.to_string(),
            message: format!("{e:#}"),
        })
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    fn process_unit<'a>(&'a self, store: &'a HistoryStore, unit: &'a SyncUnit) -> UnitFuture<'a> {
        Box::pin(async move {
            match unit.kind {
                UnitKind::Container => self.process_container(store, unit).await,
                UnitKind::Leaf => self.process_leaf(store, unit).await,
            }
        })
    }

    /// Lists every child of a container and processes them in order
    ///
    /// A listing failure abandons the whole container, including children
    /// from pages that were already received.
    async fn process_container(&self, store: &HistoryStore, unit: &SyncUnit) {
        debug!(path = %unit.display_path, "Listing container");
        let children = collect_pages(self.options.page_size, |offset, limit| {
            self.drive.list_page(&unit.remote_id, offset, limit)
        })
        .await;

        let children = match children {
            Ok(children) => children,
            Err(e) => {
                error!(
                    path = %unit.display_path,
                    remote_id = %unit.remote_id,
                    error = %format!("{e:#}"),
                    "Failed to list container"
                );
                store.increment(Counter::Errored);
                return;
            }
        };

        for child in &children {
            self.process_unit(store, child).await;
        }
    }

    async fn process_leaf(&self, store: &HistoryStore, unit: &SyncUnit) {
        let Some(location) = export_location(&unit.display_path, &unit.content_type) else {
            debug!(path = %unit.display_path, "Not an Office document, ignoring");
            store.increment(Counter::Ignored);
            return;
        };

        let existing = match store.get(&location).await {
            Ok(existing) => existing,
            Err(e) => {
                error!(location = %location, error = %e, "History lookup failed");
                store.increment(Counter::Errored);
                return;
            }
        };

        if let Some(item) = existing {
            if item.status().is_confirmed() {
                warn!(
                    location = %location,
                    remote_id = %unit.remote_id,
                    "Another document was already exported to this location"
                );
                store.increment(Counter::Errored);
                return;
            }

            let unchanged = !unit.content_hash.is_empty() && item.has_hash(&unit.content_hash);
            if unchanged && !self.options.force_refresh {
                match store.mark_skipped(&location).await {
                    Ok(()) => {
                        debug!(location = %location, "Unchanged, skipping");
                        store.increment(Counter::Skipped);
                    }
                    Err(e) => {
                        error!(location = %location, error = %e, "Failed to mark as skipped");
                        store.increment(Counter::Errored);
                    }
                }
                return;
            }
        }

        match self.download(store, &location, unit).await {
            Ok(()) => store.increment(Counter::Downloaded),
            Err(e) => {
                error!(
                    location = %location,
                    remote_id = %unit.remote_id,
                    error = %format!("{e:#}"),
                    "Export failed"
                );
                store.increment(Counter::Errored);
            }
        }
    }

    async fn download(
        &self,
        store: &HistoryStore,
        location: &Location,
        unit: &SyncUnit,
    ) -> anyhow::Result<()> {
        if self.options.dry_run {
            info!(location = %location, "Dry run: would export");
        } else {
            let content = self
                .drive
                .fetch_content(&unit.remote_id)
                .await
                .with_context(|| format!("Failed to fetch {}", unit.display_path))?;
            let path = location.to_local_path(&self.options.output_dir);
            self.local_filesystem
                .write_file(
                    &path,
                    &content,
                    self.options.dir_mode,
                    self.options.file_mode,
                )
                .await?;
            info!(location = %location, bytes = content.len(), "Exported");
        }

        store
            .set_downloaded(
                location.clone(),
                unit.remote_id.clone(),
                unit.content_hash.clone(),
                Utc::now(),
            )
            .await?;
        Ok(())
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    /// Removes local files of entries not seen during this run
    ///
    /// Returns `(removed, remove_errors)`. A dry run counts only files that
    /// are actually present.
    async fn remove_obsolete(&self, store: &HistoryStore) -> Result<(u64, u64), SyncError> {
        let obsolete = store.obsolete_locations().await?;
        let mut removed = 0;
        let mut errors = 0;

        for location in obsolete {
            let path = location.to_local_path(&self.options.output_dir);
            let outcome = if self.options.dry_run {
                self.local_filesystem.file_exists(&path).await
            } else {
                self.local_filesystem.remove_file(&path).await
            };

            match outcome {
                Ok(true) if self.options.dry_run => {
                    info!(location = %location, "Dry run: would remove");
                    removed += 1;
                }
                Ok(true) => {
                    info!(location = %location, "Removed obsolete file");
                    removed += 1;
                }
                Ok(false) => debug!(location = %location, "Obsolete file already absent"),
                Err(e) => {
                    warn!(
                        location = %location,
                        error = %format!("{e:#}"),
                        "Failed to remove obsolete file"
                    );
                    errors += 1;
                }
            }
        }

        Ok((removed, errors))
    }
}

// ============================================================================
// Unit tests
// ============================================================================
