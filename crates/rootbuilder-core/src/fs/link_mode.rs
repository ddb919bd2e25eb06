use std::path::Path;

use serde::{Deserialize, Serialize};

/// Extensions that are always copied, whatever the configured mode.
///
/// A compatibility layer resolves a symlinked executable to the link's
/// target, so the program would look for its sibling files in the package
/// directory instead of the target directory.
pub const PROTECTED_EXTENSIONS: &[&str] = &["exe", "dll"];

/// How package files are materialized in the target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
    Copy,
    Link,
}

impl Default for DeployMode {
    fn default() -> Self {
        Self::Copy
    }
}

impl DeployMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DeployMode::Copy => "copy",
            DeployMode::Link => "link",
        }
    }

    /// Placement strategy for a single source file under this mode.
    pub fn placement_for(self, source: &Path) -> Placement {
        match self {
            DeployMode::Link if !is_protected(source) => Placement::Symlink,
            _ => Placement::Copy,
        }
    }
}

/// Concrete way a single file lands at its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Reflink/CoW copy, full byte copy where unsupported.
    Copy,
    Symlink,
}

fn is_protected(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PROTECTED_EXTENSIONS
                .iter()
                .any(|protected| ext.eq_ignore_ascii_case(protected))
        })
        .unwrap_or(false)
}
