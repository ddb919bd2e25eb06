//! Status collection for the engine's persisted state.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::Settings;
use crate::context::RootBuilder;
use crate::fs::{entry_exists, walk_files};
use crate::manifest::DeploymentState;

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentStatus {
    pub state: DeploymentState,
    pub target_dir: PathBuf,
    pub storage_dir: PathBuf,
    pub settings: Settings,
    pub deployed: usize,
    pub backups: usize,
    /// Deployed entries no longer present on disk
    pub missing: Vec<PathBuf>,
    /// Files in backup storage that no manifest entry refers to
    pub orphaned_backups: Vec<PathBuf>,
}

impl DeploymentStatus {
    pub fn has_issues(&self) -> bool {
        self.state == DeploymentState::PartiallyCleared
            || !self.missing.is_empty()
            || !self.orphaned_backups.is_empty()
    }
}

impl RootBuilder {
    pub fn status(&self) -> DeploymentStatus {
        let manifest = self.manifest_store().load();
        let state = DeploymentState::of(manifest.as_ref());

        let (deployed, backups, missing, referenced) = match &manifest {
            Some(manifest) => (
                manifest.deployed.len(),
                manifest.backups.len(),
                manifest
                    .deployed
                    .iter()
                    .filter(|path| !entry_exists(path))
                    .cloned()
                    .collect::<Vec<_>>(),
                manifest.backups.values().cloned().collect::<HashSet<_>>(),
            ),
            None => (0, 0, Vec::new(), HashSet::new()),
        };

        let backup_dir = self.layout().backup_dir();
        let orphaned_backups = walk_files(&backup_dir)
            .unwrap_or_default()
            .into_iter()
            .map(|relative| backup_dir.join(relative))
            .filter(|path| !referenced.contains(path))
            .collect();

        DeploymentStatus {
            state,
            target_dir: self.target_dir().to_path_buf(),
            storage_dir: self.layout().root().to_path_buf(),
            settings: self.settings(),
            deployed,
            backups,
            missing,
            orphaned_backups,
        }
    }
}
