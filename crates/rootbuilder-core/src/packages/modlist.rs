//! Package source backed by a Mod Organizer style `modlist.txt`.
//!
//! Format, one package per line, highest priority first:
//! - `+Name` active, `-Name` inactive, `*Name` foreign (unmanaged content)
//! - `#` starts a comment line
//!
//! `Name_separator` entries are separators; names ending in `backup` with
//! optional trailing digits are backups.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{debug, warn};

use super::{PackageSource, ScanMemo};
use crate::config::InstanceConfig;
use crate::config::schema::DEFAULT_OVERRIDE_DIR;
use crate::types::{Package, PackageKind};

const SEPARATOR_SUFFIX: &str = "_separator";

#[derive(Debug, Clone)]
pub struct ModListSource {
    modlist: PathBuf,
    mods_dir: PathBuf,
    override_dir: String,
}

impl ModListSource {
    pub fn new(modlist: impl Into<PathBuf>, mods_dir: impl Into<PathBuf>) -> Self {
        Self {
            modlist: modlist.into(),
            mods_dir: mods_dir.into(),
            override_dir: DEFAULT_OVERRIDE_DIR.to_string(),
        }
    }

    pub fn from_config(config: &InstanceConfig) -> Self {
        Self::new(&config.modlist, &config.mods_dir).with_override_dir(&config.override_dir)
    }

    pub fn with_override_dir(mut self, name: impl Into<String>) -> Self {
        self.override_dir = name.into();
        self
    }
}

impl PackageSource for ModListSource {
    fn packages(&self, memo: &mut ScanMemo) -> anyhow::Result<Vec<Package>> {
        let content = std::fs::read_to_string(&self.modlist)
            .with_context(|| format!("Failed to read mod list: {}", self.modlist.display()))?;
        let entries = parse_modlist(&content);
        let count = entries.len();

        let mut packages: Vec<Package> = entries
            .into_iter()
            .enumerate()
            .map(|(line_rank, entry)| {
                let priority = count - 1 - line_rank;
                let kind = entry.kind();
                let mut package = Package::new(entry.name, priority)
                    .with_active(entry.active)
                    .with_kind(kind);
                if entry.active && kind == PackageKind::Regular {
                    package.override_dir =
                        memo.override_dir(&self.mods_dir.join(&package.name), &self.override_dir);
                }
                package
            })
            .collect();
        packages.reverse();

        debug!(
            modlist = %self.modlist.display(),
            packages = packages.len(),
            deployable = packages.iter().filter(|p| p.is_deployable()).count(),
            "Loaded mod list"
        );
        Ok(packages)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModListEntry {
    pub name: String,
    pub active: bool,
    pub foreign: bool,
}

impl ModListEntry {
    pub fn kind(&self) -> PackageKind {
        if self.foreign {
            PackageKind::Foreign
        } else if self.name.ends_with(SEPARATOR_SUFFIX) {
            PackageKind::Separator
        } else if is_backup_name(&self.name) {
            PackageKind::Backup
        } else {
            PackageKind::Regular
        }
    }
}

/// Parse mod list lines, preserving file order (highest priority first).
pub fn parse_modlist(content: &str) -> Vec<ModListEntry> {
    let mut entries = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim_end();
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut chars = line.chars();
        let marker = chars.next();
        let name = chars.as_str().trim();
        if name.is_empty() {
            warn!(line = index + 1, "Skipping mod list entry without a name");
            continue;
        }
        let (active, foreign) = match marker {
            Some('+') => (true, false),
            Some('-') => (false, false),
            Some('*') => (true, true),
            _ => {
                warn!(line = index + 1, entry = line, "Skipping mod list entry without a state marker");
                continue;
            }
        };
        entries.push(ModListEntry {
            name: name.to_string(),
            active,
            foreign,
        });
    }
    entries
}

fn is_backup_name(name: &str) -> bool {
    name.to_ascii_lowercase()
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .ends_with("backup")
}
