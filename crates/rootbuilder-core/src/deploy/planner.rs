//! Flatten prioritized package trees into one target-relative plan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::fs::walk_files;
use crate::types::Package;

/// One file to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// Path relative to both the override subtree and the target directory
    pub relative: PathBuf,
    pub target: PathBuf,
    pub source: PathBuf,
    /// Package that won this path
    pub package: String,
}

/// Conflict-resolved file plan. Rebuilt on every deploy, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentPlan {
    entries: Vec<PlanEntry>,
}

impl DeploymentPlan {
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, relative: &Path) -> Option<&PlanEntry> {
        self.entries.iter().find(|entry| entry.relative == relative)
    }
}

impl From<Vec<PlanEntry>> for DeploymentPlan {
    fn from(entries: Vec<PlanEntry>) -> Self {
        Self { entries }
    }
}

#[derive(Debug, Clone)]
pub struct Planner {
    target_dir: PathBuf,
}

impl Planner {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
        }
    }

    /// Build the plan for `packages`.
    ///
    /// Packages are stacked from lowest to highest priority; a later package
    /// takes over a path an earlier one supplied, while the path keeps its
    /// original position in the plan. Packages whose override tree cannot be
    /// read are skipped entirely.
    pub fn plan(&self, packages: &[Package]) -> DeploymentPlan {
        let mut ordered: Vec<&Package> = packages.iter().filter(|p| p.is_deployable()).collect();
        ordered.sort_by_key(|p| p.priority);

        let mut entries: Vec<PlanEntry> = Vec::new();
        let mut index: HashMap<PathBuf, usize> = HashMap::new();

        for package in ordered {
            let Some(root) = package.override_dir.as_deref() else {
                continue;
            };
            let files = match walk_files(root) {
                Ok(files) => files,
                Err(err) => {
                    warn!(
                        package = %package.name,
                        error = %format!("{err:#}"),
                        "Skipping package with unreadable override tree"
                    );
                    continue;
                }
            };
            debug!(package = %package.name, files = files.len(), "Planning package");

            for relative in files {
                let source = root.join(&relative);
                match index.get(&relative) {
                    Some(&slot) => {
                        let entry = &mut entries[slot];
                        entry.source = source;
                        entry.package = package.name.clone();
                    }
                    None => {
                        index.insert(relative.clone(), entries.len());
                        entries.push(PlanEntry {
                            target: self.target_dir.join(&relative),
                            relative,
                            source,
                            package: package.name.clone(),
                        });
                    }
                }
            }
        }

        DeploymentPlan { entries }
    }
}
