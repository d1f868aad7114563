//! SynoExport Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `TrackedItem`, `ItemStatus`, `SyncUnit`
//! - **Port definitions** - Traits for adapters: `IDriveClient`, `ILocalFileSystem`
//! - **Export mapping** - Synology Office formats to Microsoft Office formats
//! - **Configuration** - YAML configuration with validation and a builder
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O. Ports define
//! the trait interfaces that adapter crates implement; the sync engine
//! consumes them through `Arc<dyn ...>` handles.

pub mod config;
pub mod domain;
pub mod export;
pub mod ports;
