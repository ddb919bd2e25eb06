//! Shared core types used by the planner and package sources.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What kind of entry a package is in the package list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Regular installed package.
    #[default]
    Regular,
    /// Visual grouping entry with no files.
    Separator,
    /// Backup copy of another package.
    Backup,
    /// Content not managed by the package manager (DLC, base files).
    Foreign,
}

/// A package as supplied by a [`crate::packages::PackageSource`].
///
/// Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    /// Higher ranks win conflicts.
    pub priority: usize,
    /// Subtree projected verbatim onto the target directory.
    pub override_dir: Option<PathBuf>,
    pub active: bool,
    pub kind: PackageKind,
}

impl Package {
    pub fn new(name: impl Into<String>, priority: usize) -> Self {
        Self {
            name: name.into(),
            priority,
            override_dir: None,
            active: true,
            kind: PackageKind::Regular,
        }
    }

    pub fn with_override_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.override_dir = Some(dir.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_kind(mut self, kind: PackageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this package contributes files to a deployment.
    pub fn is_deployable(&self) -> bool {
        self.active && self.kind == PackageKind::Regular && self.override_dir.is_some()
    }
}
