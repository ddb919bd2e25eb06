//! Execute a deployment plan against the target directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::planner::{DeploymentPlan, PlanEntry};
use crate::config::StorageLayout;
use crate::error::FileOpError;
use crate::fs::{
    DeployMode, FileOps, Placement, copy_entry, copy_with_fallback, entry_exists, force_remove,
    prune_empty_tree,
};
use crate::manifest::Manifest;

#[derive(Debug, Default)]
pub struct DeployReport {
    /// Distinct targets successfully placed
    pub placed: usize,
    pub backed_up: usize,
    /// Targets left as they were
    pub skipped: Vec<PathBuf>,
}

/// Places plan entries, backing up whatever they displace.
pub struct DeployEngine<'a> {
    layout: &'a StorageLayout,
    ops: &'a dyn FileOps,
    mode: DeployMode,
}

/// Bookkeeping for a single execute call.
#[derive(Default)]
struct Progress {
    manifest: Manifest,
    report: DeployReport,
    placed: HashSet<PathBuf>,
    recorded: HashSet<PathBuf>,
}

impl Progress {
    fn record(&mut self, target: &Path, backup: Option<PathBuf>) {
        if self.recorded.insert(target.to_path_buf()) {
            self.manifest.deployed.push(target.to_path_buf());
        }
        if let Some(backup) = backup {
            self.manifest.backups.insert(target.to_path_buf(), backup);
            self.report.backed_up += 1;
        }
    }

    fn skip(&mut self, target: &Path) {
        self.report.skipped.push(target.to_path_buf());
    }
}

impl<'a> DeployEngine<'a> {
    pub fn new(layout: &'a StorageLayout, ops: &'a dyn FileOps, mode: DeployMode) -> Self {
        Self { layout, ops, mode }
    }

    /// Place every entry of `plan`, returning the manifest to persist.
    ///
    /// A failing entry is logged and skipped; it never stops the rest of
    /// the plan.
    pub fn execute(&self, plan: &DeploymentPlan) -> (Manifest, DeployReport) {
        let mut progress = Progress::default();
        for entry in plan.entries() {
            self.deploy_entry(entry, &mut progress);
        }

        if progress.manifest.backups.is_empty() {
            prune_empty_tree(self.ops, &self.layout.backup_dir());
        }
        (progress.manifest, progress.report)
    }

    fn deploy_entry(&self, entry: &PlanEntry, progress: &mut Progress) {
        let target = entry.target.as_path();
        let existed = entry_exists(target);

        let mut backup = None;
        if existed && !progress.placed.contains(target) {
            if target.is_dir() && !target.is_symlink() {
                warn!(target = %target.display(), "Directory in the way of a package file, skipping");
                progress.skip(target);
                return;
            }
            match self.backup(entry) {
                Ok(path) => backup = Some(path),
                Err(err) => {
                    warn!(target = %target.display(), error = %err, "Could not back up existing file, skipping");
                    progress.skip(target);
                    return;
                }
            }
        }

        if let Some(parent) = target.parent()
            && let Err(err) = fs::create_dir_all(parent)
        {
            warn!(target = %target.display(), error = %err, "Could not create target directory, skipping");
            self.discard_backup(backup);
            progress.skip(target);
            return;
        }

        if existed && let Err(err) = force_remove(self.ops, target) {
            warn!(target = %target.display(), error = %err, "Could not remove existing file, skipping");
            self.discard_backup(backup);
            progress.skip(target);
            return;
        }

        match self.place(entry) {
            Ok(placement) => {
                debug!(target = %target.display(), package = %entry.package, ?placement, "Placed file");
                progress.record(target, backup);
                if progress.placed.insert(target.to_path_buf()) {
                    progress.report.placed += 1;
                }
            }
            Err(err) => {
                warn!(target = %target.display(), error = %err, "Could not deploy file");
                // The original is already gone; keep its backup reachable.
                if backup.is_some() {
                    progress.record(target, backup);
                }
                progress.skip(target);
            }
        }
    }

    fn backup(&self, entry: &PlanEntry) -> Result<PathBuf, FileOpError> {
        let path = unique_backup_path(&self.layout.backup_path_for(&entry.relative))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| FileOpError::io(parent, err))?;
        }
        copy_entry(self.ops, &entry.target, &path)?;
        debug!(target = %entry.target.display(), backup = %path.display(), "Backed up existing file");
        Ok(path)
    }

    fn discard_backup(&self, backup: Option<PathBuf>) {
        if let Some(path) = backup
            && let Err(err) = force_remove(self.ops, &path)
        {
            warn!(backup = %path.display(), error = %err, "Could not discard unused backup");
        }
    }

    fn place(&self, entry: &PlanEntry) -> Result<Placement, FileOpError> {
        match self.mode.placement_for(&entry.source) {
            Placement::Symlink => match self.ops.symlink(&entry.source, &entry.target) {
                Ok(()) => Ok(Placement::Symlink),
                Err(err) => {
                    debug!(target = %entry.target.display(), error = %err, "Symlink failed, copying instead");
                    copy_with_fallback(self.ops, &entry.source, &entry.target)?;
                    Ok(Placement::Copy)
                }
            },
            Placement::Copy => {
                copy_with_fallback(self.ops, &entry.source, &entry.target)?;
                Ok(Placement::Copy)
            }
        }
    }
}

/// `preferred`, or the first free `<name>.<n>` sibling when a stale backup
/// from an earlier cycle still occupies it.
fn unique_backup_path(preferred: &Path) -> Result<PathBuf, FileOpError> {
    if !entry_exists(preferred) {
        return Ok(preferred.to_path_buf());
    }
    let base = preferred
        .file_name()
        .ok_or_else(|| FileOpError::Directory(preferred.to_path_buf()))?
        .to_string_lossy()
        .into_owned();

    for attempt in 1u32..1000 {
        let candidate = preferred.with_file_name(format!("{base}.{attempt}"));
        if !entry_exists(&candidate) {
            warn!(
                stale = %preferred.display(),
                backup = %candidate.display(),
                "Stale backup found, using a fresh name"
            );
            return Ok(candidate);
        }
    }

    Err(FileOpError::io(
        preferred,
        std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "no free backup name available",
        ),
    ))
}
