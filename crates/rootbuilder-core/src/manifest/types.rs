use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Persisted undo record of one deployment.
///
/// ```json
/// { "deployed": ["/game/d3d11.dll"], "backups": { "/game/d3d11.dll": "/state/backup/d3d11.dll" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Absolute target paths placed by the engine, in placement order
    #[serde(default)]
    pub deployed: Vec<PathBuf>,

    /// Absolute target path -> absolute backup path of the displaced original
    #[serde(default)]
    pub backups: BTreeMap<PathBuf, PathBuf>,

    /// Set when a clear left entries behind
    #[serde(default, skip_serializing_if = "is_false")]
    pub partial: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DeploymentState {
        if self.partial {
            DeploymentState::PartiallyCleared
        } else {
            DeploymentState::Deployed
        }
    }

    /// Drop duplicate deployed entries and backups of paths that are not
    /// deployed. Returns the number of entries dropped.
    pub fn sanitize(&mut self) -> usize {
        let before = self.deployed.len() + self.backups.len();

        let mut seen = HashSet::new();
        self.deployed.retain(|path| seen.insert(path.clone()));
        self.backups.retain(|target, _| seen.contains(target));

        before - (self.deployed.len() + self.backups.len())
    }
}

/// Where the engine is in its deploy/clear cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    /// No manifest: nothing deployed
    Clean,
    Deployed,
    /// A clear could not remove everything; the next clear retries
    PartiallyCleared,
}

impl DeploymentState {
    pub fn of(manifest: Option<&Manifest>) -> Self {
        manifest.map_or(Self::Clean, Manifest::state)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentState::Clean => "clean",
            DeploymentState::Deployed => "deployed",
            DeploymentState::PartiallyCleared => "partially-cleared",
        }
    }
}
