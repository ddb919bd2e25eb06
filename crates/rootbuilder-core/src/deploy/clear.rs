//! Reverse a deployment recorded in a manifest.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::StorageLayout;
use crate::error::FileOpError;
use crate::fs::{
    FileOps, entry_exists, force_remove, move_with_fallback, prune_empty_ancestors,
    prune_empty_tree,
};
use crate::manifest::Manifest;

#[derive(Debug, Default)]
pub struct ClearReport {
    /// Deployed entries removed by this call
    pub removed: usize,
    /// Deployed entries that survived every removal attempt
    pub failed: Vec<PathBuf>,
    pub restored: usize,
    /// Targets whose backup could not be moved back; the backup is kept
    pub restore_failures: Vec<PathBuf>,
    pub pruned_dirs: usize,
}

impl ClearReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ClearEngine<'a> {
    target_dir: &'a Path,
    layout: &'a StorageLayout,
    ops: &'a dyn FileOps,
}

impl<'a> ClearEngine<'a> {
    pub fn new(target_dir: &'a Path, layout: &'a StorageLayout, ops: &'a dyn FileOps) -> Self {
        Self {
            target_dir,
            layout,
            ops,
        }
    }

    /// Remove deployed entries and restore backups.
    ///
    /// Returns the report and the manifest that must replace the current
    /// one, or `None` when the manifest should be deleted.
    pub fn execute(&self, manifest: &Manifest) -> (ClearReport, Option<Manifest>) {
        let mut report = ClearReport::default();

        let mut failed = HashSet::new();
        for path in &manifest.deployed {
            if !entry_exists(path) {
                continue;
            }
            match force_remove(self.ops, path) {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed deployed file");
                    report.removed += 1;
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Could not remove deployed file");
                    failed.insert(path.clone());
                    report.failed.push(path.clone());
                }
            }
        }

        let mut carried = BTreeMap::new();
        for (target, backup) in &manifest.backups {
            if failed.contains(target) {
                // Restoring over an entry we could not remove would get the
                // original deleted by the next clear.
                carried.insert(target.clone(), backup.clone());
                continue;
            }
            if !entry_exists(backup) {
                continue;
            }
            match self.restore(target, backup) {
                Ok(()) => {
                    debug!(target = %target.display(), "Restored backup");
                    report.restored += 1;
                }
                Err(err) => {
                    warn!(
                        target = %target.display(),
                        backup = %backup.display(),
                        error = %err,
                        "Could not restore backup, keeping it"
                    );
                    report.restore_failures.push(target.clone());
                }
            }
        }

        let backup_dir = self.layout.backup_dir();
        if !prune_empty_tree(self.ops, &backup_dir) {
            debug!(dir = %backup_dir.display(), "Backup storage still holds files");
        }

        let cleared: Vec<PathBuf> = manifest
            .deployed
            .iter()
            .filter(|path| !failed.contains(*path))
            .cloned()
            .collect();
        report.pruned_dirs = prune_empty_ancestors(self.ops, self.target_dir, &cleared);

        let remaining = (!report.failed.is_empty()).then(|| Manifest {
            deployed: report.failed.clone(),
            backups: carried,
            partial: true,
        });
        (report, remaining)
    }

    fn restore(&self, target: &Path, backup: &Path) -> Result<(), FileOpError> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| FileOpError::io(parent, err))?;
            let _ = self.ops.ensure_writable(parent);
        }
        if entry_exists(target) {
            force_remove(self.ops, target)?;
        }
        move_with_fallback(self.ops, backup, target)
    }
}
