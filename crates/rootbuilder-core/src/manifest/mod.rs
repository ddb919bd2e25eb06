//! Manifest types and persistence.
//!
//! The manifest is the engine's undo record: what was placed in the target
//! directory and where displaced originals were backed up.

pub mod store;
pub mod types;

pub use store::ManifestStore;
pub use types::{DeploymentState, Manifest};
