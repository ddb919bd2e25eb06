//! Deterministic enumeration of package override trees.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// List every file under `root` as a path relative to `root`.
///
/// Entries are visited in name order so the result is stable across runs.
/// Symlinks to files are included; symlinks to directories are not
/// followed.
pub fn walk_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_into(root, Path::new(""), &mut files)?;
    Ok(files)
}

fn walk_into(dir: &Path, relative: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read dir: {}", dir.display()))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read dir entry: {}", dir.display()))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let ty = entry
            .file_type()
            .with_context(|| format!("Failed to stat dir entry: {}", entry.path().display()))?;
        let rel = relative.join(entry.file_name());

        if ty.is_dir() {
            walk_into(&entry.path(), &rel, files)?;
        } else if ty.is_file() {
            files.push(rel);
        } else if ty.is_symlink() && entry.path().is_file() {
            files.push(rel);
        }
    }
    Ok(())
}
