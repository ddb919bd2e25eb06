//! Removal of directories left empty by a clear.

use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::ops::FileOps;

/// Remove empty ancestors of `paths`, deepest first, stopping below `base`.
///
/// `base` itself is never removed, and paths outside `base` are ignored.
/// Returns the number of directories removed.
pub fn prune_empty_ancestors(ops: &dyn FileOps, base: &Path, paths: &[PathBuf]) -> usize {
    let mut candidates = BTreeSet::new();
    for path in paths {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == base || !dir.starts_with(base) {
                break;
            }
            candidates.insert(dir.to_path_buf());
            current = dir.parent();
        }
    }

    let mut ordered: Vec<PathBuf> = candidates.into_iter().collect();
    ordered.sort_by_key(|dir| Reverse(dir.components().count()));

    let mut removed = 0;
    for dir in ordered {
        if is_empty_dir(&dir) && ops.remove_dir(&dir).is_ok() {
            debug!(dir = %dir.display(), "Removed empty directory");
            removed += 1;
        }
    }
    removed
}

/// Remove every empty directory under `root` bottom-up, then `root` itself
/// if it ended up empty. Returns true when `root` no longer exists.
pub fn prune_empty_tree(ops: &dyn FileOps, root: &Path) -> bool {
    match fs::symlink_metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return false,
        Err(_) => return true,
    }
    prune_children(ops, root);
    is_empty_dir(root) && ops.remove_dir(root).is_ok()
}

fn prune_children(ops: &dyn FileOps, dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let Ok(ty) = entry.file_type() else {
            continue;
        };
        if ty.is_dir() {
            let path = entry.path();
            prune_children(ops, &path);
            if is_empty_dir(&path) {
                let _ = ops.remove_dir(&path);
            }
        }
    }
}

fn is_empty_dir(path: &Path) -> bool {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false),
        _ => false,
    }
}
