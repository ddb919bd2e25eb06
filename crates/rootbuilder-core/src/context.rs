//! Engine facade wiring storage, file operations and the package source.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::{InstanceConfig, Settings, SettingsStore, StorageLayout, default_storage_root};
use crate::deploy::{ClearEngine, ClearReport, DeployEngine, DeployReport, DeploymentPlan, Planner};
use crate::fs::{FileOps, HostEnvironment, LocalFileOps};
use crate::manifest::ManifestStore;
use crate::packages::{ModListSource, PackageSource, ScanMemo};

/// One target directory under engine management.
///
/// Frontends create this once and call [`RootBuilder::deploy`] and
/// [`RootBuilder::clear`]; both are safe to call repeatedly and never fail,
/// degrading to warnings and lower counts instead.
pub struct RootBuilder {
    target_dir: PathBuf,
    layout: StorageLayout,
    ops: Box<dyn FileOps>,
    packages: Box<dyn PackageSource>,
}

impl std::fmt::Debug for RootBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootBuilder")
            .field("target_dir", &self.target_dir)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl RootBuilder {
    pub fn new(
        target_dir: PathBuf,
        layout: StorageLayout,
        ops: Box<dyn FileOps>,
        packages: Box<dyn PackageSource>,
    ) -> Self {
        Self {
            target_dir,
            layout,
            ops,
            packages,
        }
    }

    /// Build from an instance config, using local file operations.
    pub fn from_config(config: &InstanceConfig, host: HostEnvironment) -> anyhow::Result<Self> {
        let storage_root = match &config.storage_dir {
            Some(dir) => dir.clone(),
            None => default_storage_root(&config.target_dir)?,
        };
        Ok(Self::new(
            config.target_dir.clone(),
            StorageLayout::new(storage_root),
            Box::new(LocalFileOps::new(host)),
            Box::new(ModListSource::from_config(config)),
        ))
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn manifest_store(&self) -> ManifestStore {
        ManifestStore::from_layout(&self.layout)
    }

    pub fn settings_store(&self) -> SettingsStore {
        SettingsStore::new(self.layout.settings_path())
    }

    pub fn settings(&self) -> Settings {
        self.settings_store().load()
    }

    /// Compute the plan for the current package list without touching disk.
    pub fn plan(&self) -> anyhow::Result<DeploymentPlan> {
        let mut memo = ScanMemo::new();
        let packages = self.packages.packages(&mut memo)?;
        Ok(Planner::new(&self.target_dir).plan(&packages))
    }

    /// Deploy all active packages. Returns the number of files placed.
    pub fn deploy(&self) -> usize {
        self.deploy_with_report().placed
    }

    pub fn deploy_with_report(&self) -> DeployReport {
        let store = self.manifest_store();
        if store.load().is_some() {
            info!("Existing deployment found, clearing it first");
            self.clear();
            if store.load().is_some() {
                warn!(
                    manifest = %store.path().display(),
                    "Previous deployment could not be fully cleared, not deploying"
                );
                return DeployReport::default();
            }
        }

        let plan = match self.plan() {
            Ok(plan) => plan,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Could not load package list, not deploying");
                return DeployReport::default();
            }
        };

        let mode = self.settings().mode;
        info!(
            target = %self.target_dir.display(),
            files = plan.len(),
            mode = mode.as_str(),
            "Deploying"
        );

        let (manifest, report) = DeployEngine::new(&self.layout, self.ops.as_ref(), mode).execute(&plan);
        if let Err(err) = store.save(&manifest) {
            error!(
                error = %format!("{err:#}"),
                "Could not save manifest; deployed files are untracked"
            );
        }

        info!(
            placed = report.placed,
            backed_up = report.backed_up,
            skipped = report.skipped.len(),
            "Deployment finished"
        );
        report
    }

    /// Reverse the current deployment. Returns the number of files removed.
    pub fn clear(&self) -> usize {
        self.clear_with_report().removed
    }

    pub fn clear_with_report(&self) -> ClearReport {
        let store = self.manifest_store();
        let Some(manifest) = store.load() else {
            debug!("No deployment to clear");
            return ClearReport::default();
        };

        let engine = ClearEngine::new(&self.target_dir, &self.layout, self.ops.as_ref());
        let (report, remaining) = engine.execute(&manifest);

        match remaining {
            None => {
                if let Err(err) = store.delete() {
                    warn!(error = %format!("{err:#}"), "Could not delete manifest");
                }
            }
            Some(remaining) => {
                if let Err(err) = store.save(&remaining) {
                    error!(error = %format!("{err:#}"), "Could not save manifest of remaining files");
                }
                warn!(
                    failed = report.failed.len(),
                    "Some deployed files could not be removed; they will be retried on next clear"
                );
            }
        }

        info!(
            removed = report.removed,
            restored = report.restored,
            restore_failures = report.restore_failures.len(),
            "Clear finished"
        );
        report
    }
}
