//! User-facing settings persisted next to the manifest.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fs::{DeployMode, write_atomic};

/// `{ "enabled": bool, "mode": "copy" | "link" }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Deploy before and clear after each managed program run
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub mode: DeployMode,
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; missing or unreadable files yield the defaults.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        match self.read() {
            Ok(settings) => settings,
            Err(err) => {
                warn!(path = %self.path.display(), error = %format!("{err:#}"), "Ignoring unreadable settings");
                Settings::default()
            }
        }
    }

    fn read(&self) -> anyhow::Result<Settings> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read settings: {}", self.path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse settings: {}", self.path.display()))
    }

    pub fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(settings).context("Failed to serialize settings")?;
        write_atomic(&self.path, &bytes)
    }
}
