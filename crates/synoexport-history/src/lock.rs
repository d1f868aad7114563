//! Cross-process lock around a history file
//!
//! The lock is a marker file next to the protected file (`<path>.lock`),
//! created with `create_new` so that exactly one process can win. The marker
//! holds a small JSON [`LockRecord`] for operators; only its existence
//! matters for exclusion. A marker left behind by a crashed process is not
//! recovered automatically.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::LockError;

/// Contents of a lock marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub pid: u32,
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
}

impl LockRecord {
    /// Record describing the current process
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            timestamp: Utc::now(),
            hostname: hostname(),
        }
    }

    /// Reads the record from an existing marker, if it can be parsed
    pub fn read(lock_path: &Path) -> Option<Self> {
        let contents = fs::read_to_string(lock_path).ok()?;
        serde_json::from_str(&contents).ok()
    }
}

/// Exclusive hold on `<path>.lock`; the marker is removed on release or drop
#[derive(Debug)]
pub struct ProcessLock {
    lock_path: PathBuf,
    released: bool,
}

impl ProcessLock {
    /// Path of the marker protecting `path`
    pub fn lock_path_for(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Takes the lock for `path` in a single non-blocking attempt
    ///
    /// # Errors
    /// [`LockError::Held`] if the marker already exists.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let lock_path = Self::lock_path_for(path);
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = LockRecord::read(&lock_path);
                return Err(LockError::Held {
                    path: lock_path,
                    holder,
                });
            }
            Err(e) => return Err(e.into()),
        };

        // From here on the guard owns the marker, so a failed write still
        // removes it on drop.
        let lock = Self {
            lock_path,
            released: false,
        };
        let record = serde_json::to_vec(&LockRecord::current())?;
        file.write_all(&record)?;
        file.sync_all()?;

        debug!(path = %lock.lock_path.display(), "Lock acquired");
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    /// Removes the marker
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        fs::remove_file(&self.lock_path)?;
        debug!(path = %self.lock_path.display(), "Lock released");
        Ok(())
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = fs::remove_file(&self.lock_path) {
            warn!(path = %self.lock_path.display(), error = %e, "Failed to remove lock marker");
        }
    }
}

/// Host name recorded in the lock marker, for diagnostics only
///
/// The kernel file exists on Linux only. Elsewhere `$HOSTNAME` is used, which
/// most shells do not export, so the marker may say `unknown`.
fn hostname() -> String {
    fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok().filter(|name| !name.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}
