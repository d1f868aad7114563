//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] using `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: Uses write-to-temp + rename to avoid partial files
//!   on crash or power loss. Permissions are applied to the temp file, so the
//!   exported file never appears with the wrong mode.
//! - **Idempotent removal**: A file that is already gone is reported as
//!   `Ok(false)` instead of an error.

use std::fs::Permissions;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use synoexport_core::ports::ILocalFileSystem;
use tracing::{debug, instrument};

// ============================================================================
// LocalFileSystemAdapter struct
// ============================================================================

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// This is a zero-sized struct because all operations derive their context
/// from the path arguments. The output directory lives at a higher layer.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let mut p = target.as_os_str().to_owned();
    p.push(".tmp");
    PathBuf::from(p)
}

// ============================================================================
// ILocalFileSystem implementation
// ============================================================================

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self, data), fields(path = %path.display(), bytes = data.len()))]
    async fn write_file(
        &self,
        path: &Path,
        data: &[u8],
        dir_mode: u32,
        file_mode: u32,
    ) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::DirBuilder::new()
                .recursive(true)
                .mode(dir_mode)
                .create(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = temp_path(path);
        debug!(?tmp_path, "writing to temporary file");
        tokio::fs::write(&tmp_path, data)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;

        let result = async {
            tokio::fs::set_permissions(&tmp_path, Permissions::from_mode(file_mode)).await?;
            tokio::fs::rename(&tmp_path, path).await
        }
        .await;
        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
        }

        debug!("write complete");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn remove_file(&self, path: &Path) -> anyhow::Result<bool> {
        let metadata = match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("nothing to remove");
                return Ok(false);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to stat {}", path.display()))
            }
        };
        if metadata.is_dir() {
            anyhow::bail!("Refusing to remove directory {}", path.display());
        }

        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        debug!("remove complete");
        Ok(true)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn file_exists(&self, path: &Path) -> anyhow::Result<bool> {
        match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) => Ok(!metadata.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to stat {}", path.display())),
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================
