//! Instance configuration schema.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_OVERRIDE_DIR: &str = "Root";

fn default_override_dir() -> String {
    DEFAULT_OVERRIDE_DIR.to_string()
}

/// Contents of `rootbuilder.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceConfig {
    /// Shared directory the packages are deployed onto
    pub target_dir: PathBuf,
    /// Directory holding one subdirectory per package
    pub mods_dir: PathBuf,
    /// Priority-ordered package list
    pub modlist: PathBuf,
    /// Engine-owned storage for manifest, settings and backups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    /// Name of the per-package subtree projected onto the target
    #[serde(default = "default_override_dir")]
    pub override_dir: String,
}

impl InstanceConfig {
    pub fn new(target_dir: PathBuf, mods_dir: PathBuf, modlist: PathBuf) -> Self {
        Self {
            target_dir,
            mods_dir,
            modlist,
            storage_dir: None,
            override_dir: default_override_dir(),
        }
    }

    /// Resolve relative paths against `base` (the config file's directory).
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };
        self.target_dir = resolve(self.target_dir);
        self.mods_dir = resolve(self.mods_dir);
        self.modlist = resolve(self.modlist);
        self.storage_dir = self.storage_dir.map(resolve);
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let name = self.override_dir.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            anyhow::bail!(
                "override_dir must be a single directory name, got '{}'",
                self.override_dir
            );
        }

        // The target may be made read-only while the managed program runs.
        if let Some(storage) = &self.storage_dir
            && storage.starts_with(&self.target_dir)
        {
            anyhow::bail!(
                "storage_dir {} must not be inside target_dir {}",
                storage.display(),
                self.target_dir.display()
            );
        }
        Ok(())
    }
}
