//! Engine storage layout and default locations.
//!
//! Engine storage lives outside the target tree: the target directory may be
//! made read-only by the host while the managed program runs.

use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const BACKUP_DIR: &str = "backup";

/// Files and directories inside one engine storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR)
    }

    /// Backup location mirroring `relative` under the backup directory.
    pub fn backup_path_for(&self, relative: &Path) -> PathBuf {
        self.backup_dir().join(relative)
    }
}

/// Get default state directory for engine storage
///
/// # Returns
/// - Unix: `$XDG_STATE_HOME/rootbuilder` or `~/.local/state/rootbuilder`
/// - Windows: `%LOCALAPPDATA%\rootbuilder`
pub fn default_state_dir() -> anyhow::Result<PathBuf> {
    let base = if cfg!(unix) {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| anyhow::anyhow!("Cannot determine state directory"))?
    } else {
        dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine local app data directory"))?
    };
    Ok(base.join("rootbuilder"))
}

/// Stable storage key for a target directory.
///
/// Uses the canonical path when the directory exists. Moving the target
/// directory yields a new key, and with it fresh storage.
pub fn storage_key(target_dir: &Path) -> String {
    let path = fs::canonicalize(target_dir).unwrap_or_else(|_| target_dir.to_path_buf());
    blake3::hash(path.to_string_lossy().as_bytes())
        .to_hex()
        .to_string()
}

/// Default storage root for `target_dir`.
pub fn default_storage_root(target_dir: &Path) -> anyhow::Result<PathBuf> {
    Ok(default_state_dir()?.join(storage_key(target_dir)))
}
