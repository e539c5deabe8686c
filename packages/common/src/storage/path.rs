use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// A validated, `/`-separated relative path inside a file store.
///
/// Every segment must be non-empty and must not start with a dot, so joining
/// a `StoragePath` onto a store root can never escape it or reach the store's
/// own bookkeeping directories.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StoragePath(String);

impl StoragePath {
    /// Parse and validate a relative storage path.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.is_empty() {
            return Err(StorageError::InvalidPath("path is empty".into()));
        }
        if s.starts_with('/') || s.contains('\\') {
            return Err(StorageError::InvalidPath(format!(
                "path must be relative and '/'-separated: {s}"
            )));
        }
        if s.chars().any(|c| c == '\0' || c.is_ascii_control()) {
            return Err(StorageError::InvalidPath(
                "path contains control characters".into(),
            ));
        }
        for segment in s.split('/') {
            if segment.is_empty() || segment.starts_with('.') {
                return Err(StorageError::InvalidPath(format!(
                    "bad segment {segment:?} in {s}"
                )));
            }
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of the path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Resolve the path below a filesystem root.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, seg| acc.join(seg))
    }
}

impl fmt::Debug for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoragePath({})", self.0)
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for StoragePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StoragePath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
