//! Escalation ladders over [`FileOps`].
//!
//! Each ladder tries the direct primitive first, then fixes permissions and
//! retries, and only then asks the host for help.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use super::ops::FileOps;
use crate::error::{FileOpError, Result};

/// Remove a file or symlink, escalating until it is gone.
///
/// A path that is already missing counts as removed.
pub fn force_remove(ops: &dyn FileOps, path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => return Err(FileOpError::Directory(path.to_path_buf())),
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(_) => {}
    }

    let direct = match ops.remove_file(path) {
        Ok(()) => return Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => err,
    };
    debug!(path = %path.display(), error = %direct, "Direct removal failed, fixing permissions");

    if let Some(parent) = path.parent() {
        let _ = ops.ensure_writable(parent);
    }
    let _ = ops.ensure_writable(path);

    let retried = match ops.remove_file(path) {
        Ok(()) => return Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => err,
    };

    match ops.host_remove(path) {
        Ok(()) => Ok(()),
        Err(FileOpError::NoHostFallback) => Err(FileOpError::io(path, retried)),
        Err(err) => Err(err),
    }
}

/// Copy a regular file, escalating on permission errors.
///
/// Only the destination side is made writable; `src` may belong to a
/// package and is never modified.
pub fn copy_with_fallback(ops: &dyn FileOps, src: &Path, dst: &Path) -> Result<()> {
    copy_escalating(ops, src, dst, false)
}

/// Duplicate a file or symlink at `dst`. Symlinks are recreated, not followed.
///
/// Used for backups and restores, where `src` is an engine-owned or
/// displaced target entry, so a permission failure also fixes `src`.
pub fn copy_entry(ops: &dyn FileOps, src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(src).map_err(|err| FileOpError::io(src, err))?;
    if meta.is_dir() {
        return Err(FileOpError::Directory(src.to_path_buf()));
    }
    if meta.file_type().is_symlink() {
        let link_target = fs::read_link(src).map_err(|err| FileOpError::io(src, err))?;
        return ops
            .symlink(&link_target, dst)
            .map_err(|err| FileOpError::io(dst, err));
    }
    copy_escalating(ops, src, dst, true)
}

fn copy_escalating(ops: &dyn FileOps, src: &Path, dst: &Path, fix_src: bool) -> Result<()> {
    let direct = match ops.copy_file(src, dst) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    if direct.kind() == io::ErrorKind::PermissionDenied {
        debug!(dst = %dst.display(), "Copy denied, fixing permissions and retrying");
        if let Some(parent) = dst.parent() {
            let _ = ops.ensure_writable(parent);
        }
        if fs::symlink_metadata(dst).is_ok() {
            let _ = ops.ensure_writable(dst);
        }
        if fix_src {
            let _ = ops.ensure_writable(src);
        }
        if ops.copy_file(src, dst).is_ok() {
            return Ok(());
        }
    }

    match ops.host_copy(src, dst) {
        Ok(()) => Ok(()),
        Err(FileOpError::NoHostFallback) => Err(FileOpError::io(dst, direct)),
        Err(err) => Err(err),
    }
}

/// Move `src` to `dst`, replacing any file at `dst`.
///
/// Falls back to copy-then-remove (cross-device moves), then to the host.
pub fn move_with_fallback(ops: &dyn FileOps, src: &Path, dst: &Path) -> Result<()> {
    let direct = match ops.rename(src, dst) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    debug!(src = %src.display(), dst = %dst.display(), error = %direct, "Rename failed, copying instead");

    if copy_entry(ops, src, dst).is_ok() {
        if let Err(err) = force_remove(ops, src) {
            warn!(path = %src.display(), error = %err, "Moved by copy but could not remove source");
        }
        return Ok(());
    }

    match ops.host_move(src, dst) {
        Ok(()) => Ok(()),
        Err(FileOpError::NoHostFallback) => Err(FileOpError::io(dst, direct)),
        Err(err) => Err(err),
    }
}
