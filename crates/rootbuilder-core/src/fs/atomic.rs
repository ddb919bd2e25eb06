use std::fs;
use std::path::Path;

use anyhow::Context;

/// Write `bytes` to `path` through a temp file and rename.
///
/// Creates the parent directory when missing.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Path has no filename: {}", path.display()))?;
    let tmp_path = parent.join(format!(
        ".{}.tmp.{}",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    fs::write(&tmp_path, bytes)
        .with_context(|| format!("Failed to write temp file: {}", tmp_path.display()))?;

    // Windows rename does not replace an existing file.
    #[cfg(windows)]
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove existing file: {}", path.display()))?;
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(anyhow::Error::new(err)
            .context(format!("Failed to rename temp file into {}", path.display())));
    }
    Ok(())
}
