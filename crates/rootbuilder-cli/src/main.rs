//! Root Builder - deploy mod Root folders into a game directory
//!
//! Usage:
//!   rootbuilder deploy            # Deploy active packages
//!   rootbuilder clear             # Undo the current deployment
//!   rootbuilder status            # Show deployment state
//!   rootbuilder run -- <cmd>...   # Deploy, run a program, clear

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rootbuilder_core::config::parse_instance_toml;
use rootbuilder_core::context::RootBuilder;
use rootbuilder_core::fs::{DeployMode, HostEnvironment};
use rootbuilder_core::manifest::DeploymentState;
use rootbuilder_core::status::DeploymentStatus;

#[derive(Parser)]
#[command(name = "rootbuilder")]
#[command(about = "Deploy mod Root folders into a game directory", long_about = None)]
struct Cli {
    /// Instance config file
    #[arg(long, short, global = true, default_value = "rootbuilder.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy all active packages, clearing any previous deployment first
    Deploy,

    /// Remove deployed files and restore the originals they replaced
    Clear,

    /// Show deployment state
    Status {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show or change settings
    Settings {
        /// Deploy and clear automatically around `run`
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        #[arg(long)]
        disable: bool,

        /// Placement mode for non-executable files
        #[arg(long)]
        mode: Option<ModeArg>,
    },

    /// Run a program with packages deployed for its lifetime
    Run {
        /// Program and arguments (after --)
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// Only show issues (non-zero exit if problems)
    Quiet,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Copy,
    Link,
}

impl From<ModeArg> for DeployMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Copy => DeployMode::Copy,
            ModeArg::Link => DeployMode::Link,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rootbuilder=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let builder = load_builder(&cli.config)?;

    match cli.command {
        Commands::Deploy => run_deploy(&builder),
        Commands::Clear => run_clear(&builder),
        Commands::Status { format } => run_status(&builder, format)?,
        Commands::Settings {
            enable,
            disable,
            mode,
        } => run_settings(&builder, enable, disable, mode)?,
        Commands::Run { command } => {
            let code = run_program(&builder, &command)?;
            if code != 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}

fn load_builder(config_path: &std::path::Path) -> Result<RootBuilder> {
    let config = parse_instance_toml(config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;
    let host = HostEnvironment::detect();
    if host.is_sandboxed() {
        tracing::debug!("Running inside a sandbox, host fallbacks enabled");
    }
    RootBuilder::from_config(&config, host)
}

fn run_deploy(builder: &RootBuilder) {
    let report = builder.deploy_with_report();
    println!(
        "{} {} files into {}",
        style("Deployed").green().bold(),
        report.placed,
        builder.target_dir().display()
    );
    if report.backed_up > 0 {
        println!("  {} originals backed up", report.backed_up);
    }
    if !report.skipped.is_empty() {
        println!("  {} files skipped:", style(report.skipped.len()).yellow());
        for path in &report.skipped {
            println!("    {}", path.display());
        }
    }
}

fn run_clear(builder: &RootBuilder) {
    let report = builder.clear_with_report();
    println!(
        "{} {} files, restored {} originals",
        style("Removed").green().bold(),
        report.removed,
        report.restored
    );
    if !report.failed.is_empty() {
        println!(
            "  {} files could not be removed and will be retried on the next clear:",
            style(report.failed.len()).red()
        );
        for path in &report.failed {
            println!("    {}", path.display());
        }
    }
    if !report.restore_failures.is_empty() {
        println!(
            "  {} originals could not be restored; their backups were kept:",
            style(report.restore_failures.len()).red()
        );
        for path in &report.restore_failures {
            println!("    {}", path.display());
        }
    }
}

fn run_status(builder: &RootBuilder, format: OutputFormat) -> Result<()> {
    let status = builder.status();
    match format {
        OutputFormat::Table => print_table(&status),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Quiet => {
            let exit_code = print_quiet(&status);
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
    }
    Ok(())
}

fn print_table(status: &DeploymentStatus) {
    println!("Target:  {}", status.target_dir.display());
    println!("Storage: {}", status.storage_dir.display());
    println!(
        "Enabled: {}  Mode: {}",
        if status.settings.enabled { "yes" } else { "no" },
        status.settings.mode.as_str()
    );
    println!("State:   {}", state_label(status.state));
    println!();

    if status.state == DeploymentState::Clean {
        println!("Nothing deployed.");
    } else {
        println!("Deployed files: {}", status.deployed);
        println!("Backed up originals: {}", status.backups);
    }

    if !status.missing.is_empty() {
        println!();
        println!("Missing from target ({}):", status.missing.len());
        for path in &status.missing {
            println!("  {} {}", style("!").yellow(), path.display());
        }
    }
    if !status.orphaned_backups.is_empty() {
        println!();
        println!("Unreferenced backups ({}):", status.orphaned_backups.len());
        for path in &status.orphaned_backups {
            println!("  {} {}", style("?").yellow(), path.display());
        }
    }
}

fn print_quiet(status: &DeploymentStatus) -> i32 {
    if !status.has_issues() {
        return 0;
    }
    if status.state == DeploymentState::PartiallyCleared {
        println!("partially cleared: {} files left", status.deployed);
    }
    for path in &status.missing {
        println!("missing: {}", path.display());
    }
    for path in &status.orphaned_backups {
        println!("orphaned backup: {}", path.display());
    }
    1
}

fn state_label(state: DeploymentState) -> String {
    match state {
        DeploymentState::Clean => style(state.as_str()).dim().to_string(),
        DeploymentState::Deployed => style(state.as_str()).green().to_string(),
        DeploymentState::PartiallyCleared => style(state.as_str()).red().to_string(),
    }
}

fn run_settings(
    builder: &RootBuilder,
    enable: bool,
    disable: bool,
    mode: Option<ModeArg>,
) -> Result<()> {
    let store = builder.settings_store();
    let mut settings = store.load();

    let changed = enable || disable || mode.is_some();
    if enable {
        settings.enabled = true;
    }
    if disable {
        settings.enabled = false;
    }
    if let Some(mode) = mode {
        settings.mode = mode.into();
    }
    if changed {
        store.save(&settings)?;
    }

    println!("enabled = {}", settings.enabled);
    println!("mode    = {}", settings.mode.as_str());
    Ok(())
}

fn run_program(builder: &RootBuilder, command: &[String]) -> Result<i32> {
    let Some((program, args)) = command.split_first() else {
        anyhow::bail!("Missing program to run");
    };
    let status = builder.run_managed(program, args)?;
    Ok(status.code().unwrap_or(1))
}
