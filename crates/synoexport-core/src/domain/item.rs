//! TrackedItem domain entity
//!
//! One row of the change-tracking table kept between export runs.
//!
//! ## Status Machine
//!
//! ```text
//!                      mark_skipped
//!              ┌─────────────────────────► Skipped
//!     ┌────────┴─┐
//!     │  Loaded  │   (read from the previous run's history file)
//!     └────────┬─┘
//!              └─────────────────────────► Downloaded
//!                      mark_downloaded         ▲
//!                                              │ (new location)
//!                                       TrackedItem::observed
//! ```
//!
//! `Skipped` and `Downloaded` are terminal for the duration of a run. An item
//! that is still `Loaded` when the run ends was not seen upstream and is
//! considered obsolete.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{Location, RemoteId};

// ============================================================================
// ItemStatus
// ============================================================================

/// Reconciliation status of a tracked item within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Read from the persisted history, not yet confirmed this run
    Loaded,
    /// Fetched or re-fetched this run
    Downloaded,
    /// Confirmed unchanged this run
    Skipped,
}

impl ItemStatus {
    /// Returns the status name
    pub fn name(&self) -> &'static str {
        match self {
            ItemStatus::Loaded => "Loaded",
            ItemStatus::Downloaded => "Downloaded",
            ItemStatus::Skipped => "Skipped",
        }
    }

    /// Returns true if the item has been reconciled this run
    pub fn is_confirmed(&self) -> bool {
        match self {
            ItemStatus::Loaded => false,
            ItemStatus::Downloaded | ItemStatus::Skipped => true,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TrackedItem
// ============================================================================

/// Export state of one remote document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedItem {
    location: Location,
    remote_id: RemoteId,
    content_hash: String,
    last_seen_at: DateTime<Utc>,
    status: ItemStatus,
}

impl TrackedItem {
    /// Creates an item read back from a persisted history
    pub fn loaded(
        location: Location,
        remote_id: RemoteId,
        content_hash: impl Into<String>,
        last_seen_at: DateTime<Utc>,
    ) -> Self {
        Self {
            location,
            remote_id,
            content_hash: content_hash.into(),
            last_seen_at,
            status: ItemStatus::Loaded,
        }
    }

    /// Creates an item for content fetched during the current run
    pub fn observed(
        location: Location,
        remote_id: RemoteId,
        content_hash: impl Into<String>,
        last_seen_at: DateTime<Utc>,
    ) -> Self {
        Self {
            location,
            remote_id,
            content_hash: content_hash.into(),
            last_seen_at,
            status: ItemStatus::Downloaded,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn remote_id(&self) -> &RemoteId {
        &self.remote_id
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn last_seen_at(&self) -> DateTime<Utc> {
        self.last_seen_at
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Returns true if the stored hash matches `hash`
    pub fn has_hash(&self, hash: &str) -> bool {
        self.content_hash == hash
    }

    /// Transition: Loaded -> Skipped
    ///
    /// The hash and `last_seen_at` are left untouched.
    pub fn mark_skipped(&mut self) -> Result<(), DomainError> {
        match self.status {
            ItemStatus::Loaded => {
                self.status = ItemStatus::Skipped;
                Ok(())
            }
            ItemStatus::Downloaded | ItemStatus::Skipped => {
                Err(self.transition_error(ItemStatus::Skipped))
            }
        }
    }

    /// Transition: Loaded -> Downloaded, replacing the remote metadata
    pub fn mark_downloaded(
        &mut self,
        remote_id: RemoteId,
        content_hash: impl Into<String>,
        seen_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        match self.status {
            ItemStatus::Loaded => {
                self.remote_id = remote_id;
                self.content_hash = content_hash.into();
                self.last_seen_at = seen_at;
                self.status = ItemStatus::Downloaded;
                Ok(())
            }
            ItemStatus::Downloaded | ItemStatus::Skipped => {
                Err(self.transition_error(ItemStatus::Downloaded))
            }
        }
    }

    fn transition_error(&self, to: ItemStatus) -> DomainError {
        DomainError::InvalidTransition {
            from: self.status.name().to_string(),
            to: to.name().to_string(),
        }
    }
}
