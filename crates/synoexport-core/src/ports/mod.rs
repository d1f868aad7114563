//! Port definitions (hexagonal architecture interfaces)
//!
//! The sync engine depends on these traits only; the HTTP drive client and
//! the real filesystem adapter live in other crates, and tests substitute
//! in-memory implementations.
//!
//! ## Ports Overview
//!
//! - [`IDriveClient`] - Paginated listing and content export on the remote drive
//! - [`ILocalFileSystem`] - Writing exported files and removing obsolete ones

pub mod drive_client;
pub mod local_filesystem;

pub use drive_client::{DrivePage, IDriveClient};
pub use local_filesystem::ILocalFileSystem;
