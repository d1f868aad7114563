//! HistoryStore - change-tracking table for one export run
//!
//! ## Lifecycle
//!
//! ```text
//!   Unloaded ──load──► Ready ──persist──► Persisted
//! ```
//!
//! Items can only be queried or mutated in `Ready`. Obsolete locations are
//! only available in `Persisted`, after the run's outcome has been recorded.
//! The table and the lifecycle state live behind one `RwLock` so a caller can
//! never observe a half-loaded table. The per-run counters are atomics and
//! readable in any state.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use synoexport_core::domain::{ItemStatus, Location, RemoteId, TrackedItem};

use crate::format;
use crate::HistoryError;

// ============================================================================
// State and counters
// ============================================================================

/// Lifecycle state of a [`HistoryStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Created, backing file not read yet
    Unloaded,
    /// Table loaded, items can be queried and mutated
    Ready,
    /// Table written, only obsolete locations can be queried
    Persisted,
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreState::Unloaded => "unloaded",
            StoreState::Ready => "ready",
            StoreState::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Per-run counter kept by a [`HistoryStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Downloaded,
    Skipped,
    Ignored,
    Errored,
}

/// Snapshot of the per-run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub downloaded: u64,
    pub skipped: u64,
    pub ignored: u64,
    pub errored: u64,
}

struct Inner {
    state: StoreState,
    items: BTreeMap<Location, TrackedItem>,
}

impl Inner {
    fn require(&self, expected: StoreState) -> Result<(), HistoryError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(HistoryError::NotReady(self.state))
        }
    }
}

// ============================================================================
// HistoryStore
// ============================================================================

/// Change-tracking table backed by a history file
pub struct HistoryStore {
    path: PathBuf,
    dry_run: bool,
    inner: RwLock<Inner>,
    downloaded: AtomicU64,
    skipped: AtomicU64,
    ignored: AtomicU64,
    errored: AtomicU64,
}

impl HistoryStore {
    /// Creates an unloaded store for the history file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dry_run: false,
            inner: RwLock::new(Inner {
                state: StoreState::Unloaded,
                items: BTreeMap::new(),
            }),
            downloaded: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            ignored: AtomicU64::new(0),
            errored: AtomicU64::new(0),
        }
    }

    /// In dry-run mode `persist` encodes the table but leaves the file alone
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn state(&self) -> StoreState {
        self.inner.read().await.state
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.items.is_empty()
    }

    /// Reads the backing file and moves the store to `Ready`
    ///
    /// A missing file yields an empty table. On failure the store stays
    /// `Unloaded`.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<(), HistoryError> {
        let mut inner = self.inner.write().await;
        if inner.state != StoreState::Unloaded {
            return Err(HistoryError::AlreadyLoaded);
        }

        let items = match tokio::fs::read(&self.path).await {
            Ok(bytes) => format::decode(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history file yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        info!(items = items.len(), "History loaded");
        inner.items = items;
        inner.state = StoreState::Ready;
        Ok(())
    }

    /// Returns a copy of the item tracked under `location`
    pub async fn get(&self, location: &Location) -> Result<Option<TrackedItem>, HistoryError> {
        let inner = self.inner.read().await;
        inner.require(StoreState::Ready)?;
        Ok(inner.items.get(location).cloned())
    }

    /// Confirms an unchanged item: `Loaded -> Skipped`
    pub async fn mark_skipped(&self, location: &Location) -> Result<(), HistoryError> {
        let mut inner = self.inner.write().await;
        inner.require(StoreState::Ready)?;

        let item = inner
            .items
            .get_mut(location)
            .ok_or_else(|| HistoryError::NotFound(location.to_string()))?;
        let status = item.status();
        item.mark_skipped().map_err(|_| invalid_status(location, status))
    }

    /// Records fresh content for `location`
    ///
    /// Inserts a new `Downloaded` item, or overwrites an existing one that is
    /// still `Loaded`. An item already confirmed this run is left untouched.
    pub async fn set_downloaded(
        &self,
        location: Location,
        remote_id: RemoteId,
        content_hash: impl Into<String>,
        seen_at: DateTime<Utc>,
    ) -> Result<(), HistoryError> {
        let mut inner = self.inner.write().await;
        inner.require(StoreState::Ready)?;

        match inner.items.get_mut(&location) {
            Some(item) => {
                let status = item.status();
                item.mark_downloaded(remote_id, content_hash, seen_at)
                    .map_err(|_| invalid_status(&location, status))
            }
            None => {
                let item =
                    TrackedItem::observed(location.clone(), remote_id, content_hash, seen_at);
                inner.items.insert(location, item);
                Ok(())
            }
        }
    }

    /// Writes the table and moves the store to `Persisted`
    ///
    /// The file is replaced atomically through a sibling temp file. Succeeds
    /// once; a store that failed to write stays `Ready`.
    pub async fn persist(&self) -> Result<(), HistoryError> {
        self.write_table(false).await
    }

    /// Like [`HistoryStore::persist`], but items still `Loaded` are left out
    /// of the file
    ///
    /// For runs whose obsolete files are about to be removed. The in-memory
    /// table is unchanged, so [`HistoryStore::obsolete_locations`] still
    /// reports the dropped items.
    pub async fn persist_pruning_obsolete(&self) -> Result<(), HistoryError> {
        self.write_table(true).await
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display(), dry_run = self.dry_run))]
    async fn write_table(&self, prune_obsolete: bool) -> Result<(), HistoryError> {
        let mut inner = self.inner.write().await;
        match inner.state {
            StoreState::Ready => {}
            StoreState::Persisted => return Err(HistoryError::AlreadyPersisted),
            StoreState::Unloaded => return Err(HistoryError::NotReady(StoreState::Unloaded)),
        }

        let kept: Vec<&TrackedItem> = inner
            .items
            .values()
            .filter(|item| !prune_obsolete || item.status() != ItemStatus::Loaded)
            .collect();
        let written = kept.len();
        let bytes = format::encode(kept, Utc::now())?;

        if self.dry_run {
            debug!(bytes = bytes.len(), "Dry run, history file not written");
        } else {
            let tmp_path = temp_path(&self.path);
            tokio::fs::write(&tmp_path, &bytes).await?;
            if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
                let _ = tokio::fs::remove_file(&tmp_path).await;
                return Err(e.into());
            }
            info!(
                items = written,
                pruned = inner.items.len() - written,
                "History persisted"
            );
        }

        inner.state = StoreState::Persisted;
        Ok(())
    }

    /// Locations not confirmed during this run, sorted
    pub async fn obsolete_locations(&self) -> Result<Vec<Location>, HistoryError> {
        let inner = self.inner.read().await;
        inner.require(StoreState::Persisted)?;
        Ok(inner
            .items
            .values()
            .filter(|item| item.status() == ItemStatus::Loaded)
            .map(|item| item.location().clone())
            .collect())
    }

    pub fn increment(&self, counter: Counter) {
        let cell = match counter {
            Counter::Downloaded => &self.downloaded,
            Counter::Skipped => &self.skipped,
            Counter::Ignored => &self.ignored,
            Counter::Errored => &self.errored,
        };
        cell.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            downloaded: self.downloaded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            errored: self.errored.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("path", &self.path)
            .field("dry_run", &self.dry_run)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn invalid_status(location: &Location, status: ItemStatus) -> HistoryError {
    HistoryError::InvalidStatus {
        location: location.to_string(),
        status: status.to_string(),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
