//! Host capability probing for sandboxed execution.
//!
//! When the process runs inside a Flatpak sandbox, paths outside the
//! sandbox namespace may be read-only from within it. The host side can
//! still mutate them through `flatpak-spawn --host`. Probing happens once,
//! at startup; the resulting [`HostEnvironment`] is passed to the file
//! operations provider instead of being queried per call.

use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{FileOpError, Result};

const FLATPAK_INFO: &str = "/.flatpak-info";
const HOST_SPAWN_PROGRAM: &str = "flatpak-spawn";
const CP_CANDIDATES: &[&str] = &["/usr/bin/cp", "/bin/cp"];
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Timeout for host-side copies.
pub const HOST_COPY_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for host-side removals and moves.
pub const HOST_MUTATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Capabilities of the environment the engine runs in.
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
    host_spawn: Option<PathBuf>,
    reflink_cp: Option<PathBuf>,
}

impl HostEnvironment {
    /// Probe the running environment.
    pub fn detect() -> Self {
        let sandboxed = Path::new(FLATPAK_INFO).exists();
        let reflink_cp = if cfg!(target_os = "linux") {
            CP_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.is_file())
        } else {
            None
        };

        let env = Self {
            host_spawn: sandboxed.then(|| PathBuf::from(HOST_SPAWN_PROGRAM)),
            reflink_cp,
        };
        debug!(
            sandboxed = env.is_sandboxed(),
            reflink_cp = ?env.reflink_cp,
            "Probed host environment"
        );
        env
    }

    /// Environment with no sandbox and no external copy tool.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Route host fallbacks through `program` (normally `flatpak-spawn`).
    pub fn with_host_spawn(mut self, program: impl Into<PathBuf>) -> Self {
        self.host_spawn = Some(program.into());
        self
    }

    /// Use `cp` at `program` for reflink-aware copies.
    pub fn with_reflink_cp(mut self, program: impl Into<PathBuf>) -> Self {
        self.reflink_cp = Some(program.into());
        self
    }

    pub fn is_sandboxed(&self) -> bool {
        self.host_spawn.is_some()
    }

    pub fn reflink_cp(&self) -> Option<&Path> {
        self.reflink_cp.as_deref()
    }

    /// Copy `src` to `dst` on the host, CoW where the filesystem allows.
    pub fn host_copy(&self, src: &Path, dst: &Path) -> Result<()> {
        self.run_on_host(
            &[
                OsStr::new("cp"),
                OsStr::new("-f"),
                OsStr::new("--reflink=auto"),
                OsStr::new("--"),
                src.as_os_str(),
                dst.as_os_str(),
            ],
            HOST_COPY_TIMEOUT,
        )
    }

    pub fn host_remove(&self, path: &Path) -> Result<()> {
        self.run_on_host(
            &[
                OsStr::new("rm"),
                OsStr::new("-f"),
                OsStr::new("--"),
                path.as_os_str(),
            ],
            HOST_MUTATE_TIMEOUT,
        )
    }

    pub fn host_move(&self, src: &Path, dst: &Path) -> Result<()> {
        self.run_on_host(
            &[
                OsStr::new("mv"),
                OsStr::new("-f"),
                OsStr::new("--"),
                src.as_os_str(),
                dst.as_os_str(),
            ],
            HOST_MUTATE_TIMEOUT,
        )
    }

    fn run_on_host(&self, args: &[&OsStr], timeout: Duration) -> Result<()> {
        let spawn = self.host_spawn.as_ref().ok_or(FileOpError::NoHostFallback)?;
        let mut cmd = Command::new(spawn);
        cmd.arg("--host").args(args);
        run_with_timeout(cmd, timeout)
    }
}

/// Run `cmd` to completion, killing it once `timeout` elapses.
pub(crate) fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<()> {
    let label = describe(&cmd);
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| FileOpError::HostCommand {
            command: label.clone(),
            detail: err.to_string(),
        })?;

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(FileOpError::HostTimeout {
                    command: label,
                    secs: timeout.as_secs(),
                });
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(err) => {
                return Err(FileOpError::HostCommand {
                    command: label,
                    detail: err.to_string(),
                });
            }
        }
    };

    if status.success() {
        return Ok(());
    }

    let mut stderr = String::new();
    if let Some(mut pipe) = child.stderr.take() {
        let _ = pipe.read_to_string(&mut stderr);
    }
    Err(FileOpError::HostCommand {
        command: label,
        detail: format!("{} {}", status, stderr.trim()).trim().to_string(),
    })
}

fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
