//! Export format mapping
//!
//! Synology Office documents are stored remotely in proprietary formats
//! (`.odoc`, `.osheet`, `.oslides`) and exported as Microsoft Office files.
//! This module decides which remote items are exportable and derives the
//! history location (and therefore the local file name) for them.

use std::fmt;

use crate::domain::newtypes::Location;

/// Local format a remote document is exported to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Synology Office document -> Word
    Docx,
    /// Synology Office spreadsheet -> Excel
    Xlsx,
    /// Synology Office slides -> PowerPoint
    Pptx,
}

impl ExportFormat {
    /// Detects the export format of a remote item
    ///
    /// The file extension wins; the remote content type is consulted only
    /// when the name carries no Synology Office extension.
    pub fn detect(display_path: &str, content_type: &str) -> Option<Self> {
        let name = display_path.rsplit('/').next().unwrap_or(display_path);
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("odoc") => return Some(Self::Docx),
            Some("osheet") => return Some(Self::Xlsx),
            Some("oslides") => return Some(Self::Pptx),
            _ => {}
        }

        match content_type {
            "document" => Some(Self::Docx),
            "spreadsheet" => Some(Self::Xlsx),
            "slides" => Some(Self::Pptx),
            _ => None,
        }
    }

    /// File extension of the exported file, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
        }
    }

    /// Remote extension this format is exported from
    pub fn source_extension(&self) -> &'static str {
        match self {
            Self::Docx => "odoc",
            Self::Xlsx => "osheet",
            Self::Pptx => "oslides",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Derives the history location for a remote item
///
/// Returns `None` for items that are not Synology Office documents, and for
/// display paths that would not make a valid location.
pub fn export_location(display_path: &str, content_type: &str) -> Option<Location> {
    let format = ExportFormat::detect(display_path, content_type)?;

    let (dir, name) = match display_path.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, display_path),
    };
    let stem = match name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case(format.source_extension()) => stem,
        _ => name,
    };
    if stem.is_empty() {
        return None;
    }

    let exported = match dir {
        Some(dir) => format!("{dir}/{stem}.{}", format.extension()),
        None => format!("{stem}.{}", format.extension()),
    };
    Location::new(exported).ok()
}
