//! Filesystem primitives shared across features.

pub mod atomic;
pub mod escalate;
pub mod host;
pub mod link_mode;
pub mod ops;
pub mod prune;
pub mod walk;

use std::path::Path;

pub use atomic::write_atomic;
pub use escalate::{copy_entry, copy_with_fallback, force_remove, move_with_fallback};
pub use host::HostEnvironment;
pub use link_mode::{DeployMode, PROTECTED_EXTENSIONS, Placement};
pub use ops::{FileOps, LocalFileOps};
pub use prune::{prune_empty_ancestors, prune_empty_tree};
pub use walk::walk_files;

/// Whether anything exists at `path`, without following symlinks.
///
/// A dangling symlink counts as existing.
pub fn entry_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}
