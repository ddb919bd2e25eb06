//! Root Builder Core Library
//!
//! Projects the override trees of prioritized packages onto one shared
//! target directory, records what was placed and what was displaced, and
//! reverses the deployment exactly.

pub mod config;
pub mod context;
pub mod deploy;
pub mod error;
pub mod fs;
pub mod hooks;
pub mod manifest;
pub mod packages;
pub mod status;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{InstanceConfig, Settings, SettingsStore, StorageLayout};

    // Engine
    pub use crate::context::RootBuilder;
    pub use crate::deploy::{ClearReport, DeployReport, DeploymentPlan, Planner};

    // Filesystem
    pub use crate::fs::{DeployMode, FileOps, HostEnvironment, LocalFileOps};

    // Persistence
    pub use crate::manifest::{DeploymentState, Manifest, ManifestStore};

    // Packages
    pub use crate::packages::{ModListSource, PackageSource, ScanMemo};
    pub use crate::types::{Package, PackageKind};

    // Status
    pub use crate::status::DeploymentStatus;
}
