//! Package discovery.
//!
//! The engine does not decide which packages are active or in what order;
//! it asks a [`PackageSource`] on every deploy.

pub mod modlist;
pub mod scan;

pub use modlist::ModListSource;
pub use scan::{ScanMemo, find_override_dir};

use crate::types::Package;

/// Supplies packages in priority order, lowest priority first.
pub trait PackageSource {
    fn packages(&self, memo: &mut ScanMemo) -> anyhow::Result<Vec<Package>>;
}

/// A fixed package list.
impl PackageSource for Vec<Package> {
    fn packages(&self, _memo: &mut ScanMemo) -> anyhow::Result<Vec<Package>> {
        Ok(self.clone())
    }
}
