//! History file format
//!
//! ```text
//! {
//!   "header": { "version": 2, "magic": "SYNOLOGY_OFFICE_EXPORTER", "created": "<RFC3339>" },
//!   "items": [
//!     { "location": "...", "file_id": "...", "hash": "...", "download_time": "<RFC3339>" }
//!   ]
//! }
//! ```
//!
//! The header is validated before any item is looked at, so a file written by
//! an incompatible version is rejected with [`HistoryError::Version`] even if
//! its item layout also differs. Items are written sorted by location.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use synoexport_core::domain::{Location, RemoteId, TrackedItem};

use crate::HistoryError;

/// Version of the history file layout written by this crate
pub const HISTORY_VERSION: u32 = 2;

/// Tag identifying a history file
pub const HISTORY_MAGIC: &str = "SYNOLOGY_OFFICE_EXPORTER";

/// Header of a history file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryHeader {
    pub version: u32,
    pub magic: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    location: String,
    file_id: String,
    hash: String,
    download_time: DateTime<Utc>,
}

#[derive(Serialize)]
struct HistoryFile<'a> {
    header: HistoryHeader,
    items: Vec<HistoryRecordRef<'a>>,
}

#[derive(Serialize)]
struct HistoryRecordRef<'a> {
    location: &'a str,
    file_id: &'a str,
    hash: &'a str,
    download_time: DateTime<Utc>,
}

// Items stay untyped until the header has been checked.
#[derive(Deserialize)]
struct Envelope {
    header: HistoryHeader,
    items: serde_json::Value,
}

/// Encodes items into the history file format
///
/// Items are written in iteration order, whatever their status; pass the
/// values of a `BTreeMap` keyed by location to get them sorted.
pub fn encode<'a>(
    items: impl IntoIterator<Item = &'a TrackedItem>,
    created: DateTime<Utc>,
) -> Result<Vec<u8>, HistoryError> {
    let file = HistoryFile {
        header: HistoryHeader {
            version: HISTORY_VERSION,
            magic: HISTORY_MAGIC.to_string(),
            created,
        },
        items: items
            .into_iter()
            .map(|item| HistoryRecordRef {
                location: item.location().as_str(),
                file_id: item.remote_id().as_str(),
                hash: item.content_hash(),
                download_time: item.last_seen_at(),
            })
            .collect(),
    };

    let mut bytes = serde_json::to_vec_pretty(&file)
        .map_err(|e| HistoryError::Parse(format!("failed to encode history: {e}")))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decodes a history file; every returned item has status `Loaded`
pub fn decode(bytes: &[u8]) -> Result<BTreeMap<Location, TrackedItem>, HistoryError> {
    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|e| HistoryError::Parse(e.to_string()))?;

    let header = envelope.header;
    if header.magic != HISTORY_MAGIC {
        return Err(HistoryError::Version(format!(
            "unexpected magic {:?}",
            header.magic
        )));
    }
    if header.version != HISTORY_VERSION {
        return Err(HistoryError::Version(format!(
            "version {} (expected {HISTORY_VERSION})",
            header.version
        )));
    }

    let records: Vec<HistoryRecord> = serde_json::from_value(envelope.items)
        .map_err(|e| HistoryError::Parse(format!("invalid items: {e}")))?;

    let mut items = BTreeMap::new();
    for record in records {
        let location = Location::new(record.location)
            .map_err(|e| HistoryError::Parse(e.to_string()))?;
        let remote_id =
            RemoteId::new(record.file_id).map_err(|e| HistoryError::Parse(e.to_string()))?;

        if items.contains_key(&location) {
            return Err(HistoryError::DuplicateKey(location.to_string()));
        }
        let item = TrackedItem::loaded(
            location.clone(),
            remote_id,
            record.hash,
            record.download_time,
        );
        items.insert(location, item);
    }

    Ok(items)
}
