//! Manifest persistence in engine storage
//!
//! The manifest is never written inside the target tree. Its absence means
//! nothing is deployed; an unreadable manifest is treated the same way.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::warn;

use super::types::Manifest;
use crate::config::StorageLayout;
use crate::fs::write_atomic;

#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_layout(layout: &StorageLayout) -> Self {
        Self::new(layout.manifest_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the manifest, failing on unreadable or malformed content.
    ///
    /// Returns `Ok(None)` when no manifest exists.
    pub fn read(&self) -> anyhow::Result<Option<Manifest>> {
        if !self.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read manifest: {}", self.path.display()))?;
        let mut manifest: Manifest = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse manifest: {}", self.path.display()))?;

        let dropped = manifest.sanitize();
        if dropped > 0 {
            warn!(
                path = %self.path.display(),
                dropped,
                "Dropped duplicate or dangling manifest entries"
            );
        }
        Ok(Some(manifest))
    }

    /// Load the manifest, treating a corrupt one as absent.
    pub fn load(&self) -> Option<Manifest> {
        match self.read() {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Treating unreadable manifest as clean state");
                None
            }
        }
    }

    /// Save manifest atomically (tmp + rename)
    pub fn save(&self, manifest: &Manifest) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(manifest).context("Failed to serialize manifest")?;
        write_atomic(&self.path, &bytes)
            .with_context(|| format!("Failed to save manifest: {}", self.path.display()))
    }

    pub fn delete(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("Failed to delete manifest: {}", self.path.display()))),
        }
    }
}
