//! Change notifications raised by a vault store

use crate::path::normalize_path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Node created
    Created,
    /// File content changed
    Modified,
    /// Node removed (deleted or trashed)
    Deleted,
    /// Node moved or renamed
    Renamed,
}

/// A single change notification
///
/// Paths are vault-relative and normalized. For renames `path` is the
/// destination and `from_path`/`to_path` carry both endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEvent {
    pub kind: EventKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_path: Option<String>,
}

impl VaultEvent {
    pub fn created(path: impl AsRef<str>) -> Self {
        Self::simple(EventKind::Created, path.as_ref())
    }

    pub fn modified(path: impl AsRef<str>) -> Self {
        Self::simple(EventKind::Modified, path.as_ref())
    }

    pub fn deleted(path: impl AsRef<str>) -> Self {
        Self::simple(EventKind::Deleted, path.as_ref())
    }

    pub fn renamed(from: impl AsRef<str>, to: impl AsRef<str>) -> Self {
        let from = normalize_path(from.as_ref());
        let to = normalize_path(to.as_ref());
        Self {
            kind: EventKind::Renamed,
            path: to.clone(),
            from_path: Some(from),
            to_path: Some(to),
        }
    }

    fn simple(kind: EventKind, path: &str) -> Self {
        Self {
            kind,
            path: normalize_path(path),
            from_path: None,
            to_path: None,
        }
    }
}

impl fmt::Display for VaultEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.from_path) {
            (EventKind::Renamed, Some(from)) => write!(f, "renamed {} -> {}", from, self.path),
            (EventKind::Created, _) => write!(f, "created {}", self.path),
            (EventKind::Modified, _) => write!(f, "modified {}", self.path),
            (EventKind::Deleted, _) => write!(f, "deleted {}", self.path),
            (EventKind::Renamed, None) => write!(f, "renamed {}", self.path),
        }
    }
}
