//! Tests for reversing a deployment.

mod support;

use std::fs;

use rootbuilder_core::manifest::DeploymentState;
use support::{BlockingOps, Fixture, read};

#[test]
fn clear_without_manifest_is_a_no_op() {
    let fx = Fixture::new();
    let original = fx.target_file("keep.txt", "keep");

    assert_eq!(fx.builder(Vec::new()).clear(), 0);
    assert_eq!(read(&original), "keep");
}

#[test]
fn round_trip_restores_original_content() {
    let fx = Fixture::new();
    fx.target_file("SkyrimPrefs.ini", "original");
    fx.target_file("Data/Skyrim.esm", "master");
    fs::create_dir_all(fx.target.join("Empty")).expect("create_dir_all should succeed");

    let pkg = fx.package("pkg", 0);
    fx.package_file(&pkg, "SkyrimPrefs.ini", "modded");
    fx.package_file(&pkg, "Data/SKSE/Plugins/plugin.dll", "dll");
    fx.package_file(&pkg, "reshade-shaders/Shaders/Bloom.fx", "fx");

    let builder = fx.builder(vec![pkg]);
    assert_eq!(builder.deploy(), 3);

    let report = builder.clear_with_report();
    assert_eq!(report.removed, 3);
    assert_eq!(report.restored, 1);
    assert!(report.is_clean());

    assert_eq!(read(&fx.target.join("SkyrimPrefs.ini")), "original");
    assert_eq!(read(&fx.target.join("Data/Skyrim.esm")), "master");
    assert!(!fx.target.join("Data/SKSE").exists());
    assert!(!fx.target.join("reshade-shaders").exists());
    // Pre-existing directories are never pruned.
    assert!(fx.target.join("Data").is_dir());
    assert!(fx.target.join("Empty").is_dir());
    assert!(fx.target.is_dir());

    assert!(!fx.manifest_store().exists());
    assert!(!fx.layout().backup_dir().exists());
}

#[test]
fn second_clear_returns_zero() {
    let fx = Fixture::new();
    let pkg = fx.package("pkg", 0);
    fx.package_file(&pkg, "a.txt", "a");

    let builder = fx.builder(vec![pkg]);
    builder.deploy();

    assert_eq!(builder.clear(), 1);
    assert_eq!(builder.clear(), 0);
}

#[test]
fn entries_already_gone_are_not_counted() {
    let fx = Fixture::new();
    let pkg = fx.package("pkg", 0);
    fx.package_file(&pkg, "a.txt", "a");
    fx.package_file(&pkg, "b.txt", "b");

    let builder = fx.builder(vec![pkg]);
    builder.deploy();
    fs::remove_file(fx.target.join("a.txt")).expect("remove_file should succeed");

    let report = builder.clear_with_report();
    assert_eq!(report.removed, 1);
    assert!(report.failed.is_empty());
    assert!(!fx.manifest_store().exists());
}

#[test]
fn partial_failure_converges_after_unblocking() {
    let fx = Fixture::new();
    let pkg = fx.package("pkg", 0);
    fx.package_file(&pkg, "a.txt", "a");
    fx.package_file(&pkg, "nested/b.txt", "b");
    let stuck = fx.target.join("nested/b.txt");

    let ops = BlockingOps::new();
    let builder = fx.builder_with_ops(vec![pkg], ops.clone());
    assert_eq!(builder.deploy(), 2);

    ops.pin(&stuck);
    let report = builder.clear_with_report();
    assert_eq!(report.removed, 1);
    assert_eq!(report.failed, vec![stuck.clone()]);

    let manifest = fx.manifest_store().read().expect("read").expect("manifest");
    assert_eq!(manifest.deployed, vec![stuck.clone()]);
    assert_eq!(manifest.state(), DeploymentState::PartiallyCleared);
    // The parent of a failing path survives pruning.
    assert!(fx.target.join("nested").is_dir());

    ops.unblock(&stuck);
    assert_eq!(builder.clear(), 1);
    assert!(!fx.manifest_store().exists());
    assert!(!fx.target.join("nested").exists());
}

#[test]
fn backup_of_stuck_target_is_restored_once_removal_succeeds() {
    let fx = Fixture::new();
    let original = fx.target_file("enb.ini", "original");
    let pkg = fx.package("pkg", 0);
    fx.package_file(&pkg, "enb.ini", "modded");

    let ops = BlockingOps::new();
    let builder = fx.builder_with_ops(vec![pkg], ops.clone());
    builder.deploy();

    ops.pin(&original);
    let report = builder.clear_with_report();
    assert_eq!(report.restored, 0);
    assert_eq!(read(&original), "modded");

    let manifest = fx.manifest_store().read().expect("read").expect("manifest");
    let backup = manifest.backups.get(&original).expect("backup carried over");
    assert_eq!(read(backup), "original");

    ops.unblock(&original);
    let report = builder.clear_with_report();
    assert_eq!(report.removed, 1);
    assert_eq!(report.restored, 1);
    assert_eq!(read(&original), "original");
    assert!(!fx.manifest_store().exists());
    assert!(!fx.layout().backup_dir().exists());
}

#[test]
fn failed_restore_keeps_backup_and_later_deploys_do_not_overwrite_it() {
    let fx = Fixture::new();
    let original = fx.target_file("enb.ini", "original");
    let pkg = fx.package("pkg", 0);
    fx.package_file(&pkg, "enb.ini", "modded");
    let stale = fx.layout().backup_dir().join("enb.ini");

    let ops = BlockingOps::new();
    let builder = fx.builder_with_ops(vec![pkg], ops.clone());
    builder.deploy();

    ops.block(&stale);
    let report = builder.clear_with_report();
    assert_eq!(report.removed, 1);
    assert_eq!(report.restore_failures, vec![original.clone()]);
    assert_eq!(read(&stale), "original");
    assert!(!fx.manifest_store().exists());

    // The user puts something back and deploys again.
    ops.unblock(&stale);
    fx.target_file("enb.ini", "replacement");
    builder.deploy();

    let manifest = fx.manifest_store().read().expect("read").expect("manifest");
    let fresh = manifest.backups.get(&original).expect("fresh backup");
    assert_ne!(fresh, &stale);
    assert_eq!(read(fresh), "replacement");
    assert_eq!(read(&stale), "original");
}

#[test]
fn corrupt_manifest_is_treated_as_clean() {
    let fx = Fixture::new();
    let path = fx.layout().manifest_path();
    support::write_file(&path, "{ not json");

    let builder = fx.builder(Vec::new());
    assert_eq!(builder.clear(), 0);
    assert_eq!(builder.status().state, DeploymentState::Clean);

    let pkg = fx.package("pkg", 0);
    fx.package_file(&pkg, "a.txt", "a");
    assert_eq!(fx.builder(vec![pkg]).deploy(), 1);
    assert!(fx.manifest_store().read().expect("read").is_some());
}
