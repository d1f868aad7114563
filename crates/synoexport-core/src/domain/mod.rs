//! Domain entities and business logic
//!
//! This module contains the core domain types for SynoExport:
//! - Newtypes for remote identifiers and history locations
//! - Tracked items and their per-run status machine
//! - Sync units submitted to the traversal
//! - Domain-specific error types

pub mod errors;
pub mod item;
pub mod newtypes;
pub mod unit;

// Re-export commonly used types
pub use errors::DomainError;
pub use item::{ItemStatus, TrackedItem};
pub use newtypes::{Location, RemoteId};
pub use unit::{SyncUnit, UnitKind};
