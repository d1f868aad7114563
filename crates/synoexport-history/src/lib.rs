//! SynoExport History - Change tracking between export runs
//!
//! Persists which remote documents were exported, under which location and
//! with which content hash, so the next run can skip unchanged documents and
//! remove local files whose source disappeared.
//!
//! ## Key Components
//!
//! - [`HistoryStore`] - In-memory table with an `Unloaded -> Ready -> Persisted` lifecycle
//! - [`format`] - Versioned JSON history file encoding
//! - [`ProcessLock`] - Marker-file mutual exclusion around a history file
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use synoexport_history::{HistoryStore, ProcessLock};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let path = Path::new("/srv/office/mydrive_history.json");
//! let lock = ProcessLock::acquire(path)?;
//! let store = HistoryStore::new(path);
//! store.load().await?;
//! // ... reconcile items ...
//! store.persist().await?;
//! let obsolete = store.obsolete_locations().await?;
//! lock.release()?;
//! # Ok(())
//! # }
//! ```

pub mod format;
pub mod lock;
pub mod store;

use std::path::PathBuf;

pub use lock::{LockRecord, ProcessLock};
pub use store::{Counter, HistoryStats, HistoryStore, StoreState};

/// Errors that can occur while using a [`HistoryStore`]
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Operation not permitted in the store's current state
    #[error("History store is not ready (state: {0})")]
    NotReady(StoreState),

    /// `load` was already called successfully on this store
    #[error("History store is already loaded")]
    AlreadyLoaded,

    /// `persist` was already called successfully on this store
    #[error("History store is already persisted")]
    AlreadyPersisted,

    /// No item is tracked under this location
    #[error("No history entry for location: {0}")]
    NotFound(String),

    /// The item exists but its status does not allow the transition
    #[error("History entry {location} has status {status}")]
    InvalidStatus { location: String, status: String },

    /// The history file is not valid JSON or has an invalid item
    #[error("Failed to parse history file: {0}")]
    Parse(String),

    /// The history file header has an unexpected version or magic
    #[error("Unsupported history file: {0}")]
    Version(String),

    /// The history file lists the same location twice
    #[error("Duplicate location in history file: {0}")]
    DuplicateKey(String),

    /// Reading or writing the history file failed
    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while acquiring or releasing a [`ProcessLock`]
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another process holds the lock
    #[error("Lock {} is held{}; remove the marker if no export is running", .path.display(), holder_suffix(.holder))]
    Held {
        path: PathBuf,
        holder: Option<LockRecord>,
    },

    /// Creating, writing or removing the lock marker failed
    #[error("Lock I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The lock record could not be encoded
    #[error("Failed to serialize lock record: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn holder_suffix(holder: &Option<LockRecord>) -> String {
    match holder {
        Some(record) => format!(
            " by pid {} on {} since {}",
            record.pid,
            record.hostname,
            record.timestamp.to_rfc3339()
        ),
        None => String::new(),
    }
}
