//! Local filesystem port (driven/secondary port)
//!
//! The engine writes exported documents and removes obsolete ones through
//! this trait so that runs can be exercised without touching the disk. Dry
//! runs only look at what is there.

use std::path::Path;

/// Port trait for local filesystem operations
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// Writes `data` to `path`, replacing any existing file
    ///
    /// Missing parent directories are created with `dir_mode`; the file ends
    /// up with `file_mode` permissions.
    async fn write_file(
        &self,
        path: &Path,
        data: &[u8],
        dir_mode: u32,
        file_mode: u32,
    ) -> anyhow::Result<()>;

    /// Removes the file at `path`
    ///
    /// Returns `false` if there was no file to remove.
    ///
    /// # Errors
    /// Returns an error if the path is not a regular file or cannot be removed
    async fn remove_file(&self, path: &Path) -> anyhow::Result<bool>;

    /// Returns whether [`ILocalFileSystem::remove_file`] would find something
    /// to remove at `path`
    ///
    /// Directories do not count.
    async fn file_exists(&self, path: &Path) -> anyhow::Result<bool>;
}
