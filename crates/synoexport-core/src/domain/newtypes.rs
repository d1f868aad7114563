//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for remote identifiers and history locations.
//! Each newtype validates its content at construction time.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// RemoteId
// ============================================================================

/// Opaque identifier of an object on the remote drive
///
/// Synology Drive uses numeric file ids for regular items and well-known
/// path-like ids (e.g. `/mydrive`) for category roots, so the only rules
/// are "not empty" and "no control characters".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteId(String);

impl RemoteId {
    /// Create a new RemoteId
    ///
    /// # Errors
    /// Returns error if the id is empty or contains control characters
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidRemoteId(
                "Remote ID cannot be empty".to_string(),
            ));
        }
        if id.chars().any(char::is_control) {
            return Err(DomainError::InvalidRemoteId(format!(
                "Remote ID contains control characters: {id:?}"
            )));
        }
        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RemoteId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemoteId> for String {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}

// ============================================================================
// Location
// ============================================================================

/// Logical key under which a remote item's export state is tracked
///
/// A location is a `/`-separated relative path such as
/// `/mydrive/Reports/q3.xlsx`. It is resolved against the output directory
/// to find the exported file, so it must never escape that directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location(String);

impl Location {
    /// Create a new Location
    ///
    /// # Errors
    /// Returns error if the location is empty, contains NUL bytes, or has a
    /// `..` component
    pub fn new(location: impl Into<String>) -> Result<Self, DomainError> {
        let location = location.into();
        if location.trim_matches('/').is_empty() {
            return Err(DomainError::InvalidLocation(
                "Location cannot be empty".to_string(),
            ));
        }
        if location.contains('\0') {
            return Err(DomainError::InvalidLocation(format!(
                "Location contains a NUL byte: {location:?}"
            )));
        }
        if location.split('/').any(|component| component == "..") {
            return Err(DomainError::InvalidLocation(format!(
                "Location must not contain '..': {location}"
            )));
        }
        Ok(Self(location))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve this location to a path below `root`
    ///
    /// Leading slashes and empty components are dropped, so
    /// `/mydrive//a.docx` under `/out` becomes `/out/mydrive/a.docx`.
    #[must_use]
    pub fn to_local_path(&self, root: &Path) -> PathBuf {
        self.0
            .split('/')
            .filter(|component| !component.is_empty() && *component != ".")
            .fold(root.to_path_buf(), |path, component| path.join(component))
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Location {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Location {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.0
    }
}
