//! Override subtree lookup with a per-run memo table.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Memoized override-subtree lookups for a single run.
///
/// Created by the caller for one deploy and dropped afterwards, so a package
/// that gains or loses its subtree between runs is always seen fresh.
#[derive(Debug, Default)]
pub struct ScanMemo {
    override_dirs: HashMap<(PathBuf, String), Option<PathBuf>>,
}

impl ScanMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached [`find_override_dir`].
    pub fn override_dir(&mut self, package_dir: &Path, name: &str) -> Option<PathBuf> {
        self.override_dirs
            .entry((package_dir.to_path_buf(), name.to_string()))
            .or_insert_with(|| find_override_dir(package_dir, name))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.override_dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.override_dirs.is_empty()
    }
}

/// Find the child directory of `package_dir` named `name`, ignoring case.
///
/// When several spellings exist the lexically first wins.
pub fn find_override_dir(package_dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(package_dir).ok()?;
    let mut matches: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    matches.sort();
    matches.into_iter().next()
}
