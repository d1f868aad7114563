//! SynoExport Sync - Incremental export engine
//!
//! Provides:
//! - Recursive traversal of the remote drive through the `IDriveClient` port
//! - Hash-based skip of unchanged documents, tracked in a history file
//! - Removal of local files whose remote document disappeared
//!
//! ## Modules
//!
//! - [`engine`] - Export engine driving one run per export source
//! - [`filesystem`] - Local filesystem adapter (atomic writes, permissions)

pub mod engine;
pub mod filesystem;

use std::path::PathBuf;

use thiserror::Error;

pub use engine::{ExportSource, SyncEngine, SyncOptions, SyncStats};
pub use filesystem::LocalFileSystemAdapter;

/// Errors that abort an export run
///
/// Failures that concern a single document or folder are counted in
/// [`SyncStats`] instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Another export holds the lock on the history file
    #[error("An export is already running (lock file {}); remove it if that process is gone", .path.display())]
    AlreadyRunning { path: PathBuf },

    /// The lock could not be taken or released
    #[error("Lock error: {0}")]
    Lock(#[from] synoexport_history::LockError),

    /// The history file could not be loaded or persisted
    #[error("History error: {0}")]
    History(#[from] synoexport_history::HistoryError),

    /// The roots of an export source could not be listed
    #[error("Failed to list roots of {source_name}: {message}")]
    RootListing {
        source_name: String,
        message: String,
    },

    /// An I/O error occurred while preparing the output directory
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A domain-level error propagated from synoexport-core
    #[error("Domain error: {0}")]
    DomainError(#[from] synoexport_core::domain::DomainError),
}
