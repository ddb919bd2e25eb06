//! File operations provider.
//!
//! [`FileOps`] is the seam between the engine and the filesystem. The
//! engine only ever calls these primitives; escalation across them lives in
//! [`super::escalate`].

use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use super::host::HostEnvironment;
use crate::error::{FileOpError, Result};

/// Primitive filesystem operations with optional host-side fallbacks.
pub trait FileOps {
    /// Copy a regular file, sharing storage (reflink/CoW) where supported.
    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()>;

    /// Create a symbolic link at `dst` pointing to `src`.
    fn symlink(&self, src: &Path, dst: &Path) -> io::Result<()>;

    /// Remove a file or symlink (never follows the link).
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    fn rename(&self, src: &Path, dst: &Path) -> io::Result<()>;

    /// Grant the owner write permission on `path`.
    fn ensure_writable(&self, path: &Path) -> io::Result<()>;

    fn host_copy(&self, _src: &Path, _dst: &Path) -> Result<()> {
        Err(FileOpError::NoHostFallback)
    }

    fn host_remove(&self, _path: &Path) -> Result<()> {
        Err(FileOpError::NoHostFallback)
    }

    fn host_move(&self, _src: &Path, _dst: &Path) -> Result<()> {
        Err(FileOpError::NoHostFallback)
    }
}

/// [`FileOps`] on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalFileOps {
    host: HostEnvironment,
}

impl LocalFileOps {
    pub fn new(host: HostEnvironment) -> Self {
        Self { host }
    }

    fn reflink_copy(&self, cp: &Path, src: &Path, dst: &Path) -> bool {
        let status = Command::new(cp)
            .args(["--reflink=auto", "-f", "--"])
            .arg(src)
            .arg(dst)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) if status.success() => true,
            Ok(status) => {
                debug!(src = %src.display(), %status, "cp --reflink=auto failed");
                false
            }
            Err(err) => {
                debug!(src = %src.display(), error = %err, "Failed to spawn cp");
                false
            }
        }
    }
}

impl FileOps for LocalFileOps {
    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        if let Some(cp) = self.host.reflink_cp()
            && self.reflink_copy(cp, src, dst)
        {
            return Ok(());
        }
        fs::copy(src, dst).map(|_| ())
    }

    fn symlink(&self, src: &Path, dst: &Path) -> io::Result<()> {
        create_file_symlink(src, dst)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn rename(&self, src: &Path, dst: &Path) -> io::Result<()> {
        fs::rename(src, dst)
    }

    fn ensure_writable(&self, path: &Path) -> io::Result<()> {
        let meta = fs::symlink_metadata(path)?;
        if meta.file_type().is_symlink() {
            // chmod would follow the link into the package tree.
            return Ok(());
        }
        let mut perms = meta.permissions();
        if !make_owner_writable(&mut perms) {
            return Ok(());
        }
        fs::set_permissions(path, perms)
    }

    fn host_copy(&self, src: &Path, dst: &Path) -> Result<()> {
        self.host.host_copy(src, dst)
    }

    fn host_remove(&self, path: &Path) -> Result<()> {
        self.host.host_remove(path)
    }

    fn host_move(&self, src: &Path, dst: &Path) -> Result<()> {
        self.host.host_move(src, dst)
    }
}

/// Returns false when the permissions were already writable.
#[cfg(unix)]
fn make_owner_writable(perms: &mut fs::Permissions) -> bool {
    use std::os::unix::fs::PermissionsExt;

    let mode = perms.mode();
    if mode & 0o200 != 0 {
        return false;
    }
    perms.set_mode(mode | 0o200);
    true
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn make_owner_writable(perms: &mut fs::Permissions) -> bool {
    if !perms.readonly() {
        return false;
    }
    perms.set_readonly(false);
    true
}

#[cfg(unix)]
fn create_file_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn create_file_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

#[cfg(not(any(unix, windows)))]
fn create_file_symlink(_src: &Path, _dst: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Symlinks are not supported on this platform",
    ))
}
