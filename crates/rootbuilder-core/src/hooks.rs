//! Lifecycle hooks around a managed program's execution.

use std::ffi::OsStr;
use std::process::{Command, ExitStatus};

use anyhow::Context;
use tracing::info;

use crate::context::RootBuilder;

impl RootBuilder {
    /// Called before the managed program starts. Deploys when enabled.
    ///
    /// Always returns true: a failed deployment never blocks the launch.
    pub fn on_about_to_run(&self, program: &str) -> bool {
        if self.settings().enabled {
            let placed = self.deploy();
            info!(program, placed, "Deployed before launch");
        }
        true
    }

    /// Called after the managed program exits. Clears when enabled.
    pub fn on_finished_run(&self, program: &str, exit_code: i32) {
        if self.settings().enabled {
            let removed = self.clear();
            info!(program, exit_code, removed, "Cleared after exit");
        }
    }

    /// Run `program` wrapped in [`Self::on_about_to_run`] and
    /// [`Self::on_finished_run`].
    pub fn run_managed<I, S>(&self, program: &str, args: I) -> anyhow::Result<ExitStatus>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.on_about_to_run(program);

        let result = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("Failed to run {program}"));

        let exit_code = match &result {
            Ok(status) => status.code().unwrap_or(-1),
            Err(_) => -1,
        };
        self.on_finished_run(program, exit_code);
        result
    }
}
