//! Tests for the permission-fix and host fallback rungs of file operations.

mod support;

use rootbuilder_core::manifest::DeploymentState;
use support::{BlockingOps, Fixture, read};

#[test]
fn placement_fixes_read_only_target_directory() {
    let fx = Fixture::new();
    let pkg = fx.package("pkg", 0);
    let source = fx.package_file(&pkg, "new.txt", "new");

    let ops = BlockingOps::new();
    ops.lock(&fx.target);
    let builder = fx.builder_with_ops(vec![pkg], ops.clone());

    assert_eq!(builder.deploy(), 1);
    assert_eq!(read(&fx.target.join("new.txt")), "new");

    let made_writable = ops.made_writable();
    assert!(made_writable.contains(&fx.target));
    assert!(
        !made_writable.contains(&source),
        "package files must never be modified"
    );
}

#[test]
fn deploy_fixes_read_only_file_it_replaces() {
    let fx = Fixture::new();
    let original = fx.target_file("enb.ini", "original");
    let pkg = fx.package("pkg", 0);
    fx.package_file(&pkg, "enb.ini", "modded");

    let ops = BlockingOps::new();
    ops.lock(&original);
    let builder = fx.builder_with_ops(vec![pkg], ops.clone());

    assert_eq!(builder.deploy(), 1);
    assert_eq!(read(&fx.target.join("enb.ini")), "modded");

    builder.clear();
    assert_eq!(read(&original), "original");
    assert_eq!(builder.status().state, DeploymentState::Clean);
}

#[test]
fn clear_recovers_once_permissions_are_fixed() {
    let fx = Fixture::new();
    let pkg = fx.package("pkg", 0);
    fx.package_file(&pkg, "a.txt", "a");
    fx.package_file(&pkg, "nested/b.txt", "b");

    let ops = BlockingOps::new();
    let builder = fx.builder_with_ops(vec![pkg], ops.clone());
    assert_eq!(builder.deploy(), 2);

    // One read-only file, one file inside a read-only directory.
    ops.lock(&fx.target.join("a.txt"));
    ops.lock(&fx.target.join("nested"));

    let report = builder.clear_with_report();
    assert_eq!(report.removed, 2);
    assert!(report.failed.is_empty());
    assert!(ops.host_calls().is_empty());
    assert_eq!(builder.status().state, DeploymentState::Clean);
    assert!(!fx.target.join("nested").exists());
}

#[test]
fn host_removal_clears_entries_the_sandbox_cannot_remove() {
    let fx = Fixture::new();
    let pkg = fx.package("pkg", 0);
    fx.package_file(&pkg, "a.txt", "a");
    let deployed = fx.target.join("a.txt");

    let ops = BlockingOps::new().with_host_fallback(&["remove"]);
    let builder = fx.builder_with_ops(vec![pkg], ops.clone());
    builder.deploy();

    ops.pin(&deployed);
    assert_eq!(builder.clear(), 1);

    assert!(!deployed.exists());
    assert_eq!(ops.host_calls(), ["remove"]);
    assert_eq!(builder.status().state, DeploymentState::Clean);
    assert!(!fx.manifest_store().exists());
}

#[test]
fn host_move_restores_backup_the_sandbox_cannot_move() {
    let fx = Fixture::new();
    let original = fx.target_file("enb.ini", "original");
    let pkg = fx.package("pkg", 0);
    fx.package_file(&pkg, "enb.ini", "modded");
    let backup = fx.layout().backup_dir().join("enb.ini");

    let ops = BlockingOps::new().with_host_fallback(&["move"]);
    let builder = fx.builder_with_ops(vec![pkg], ops.clone());
    builder.deploy();

    ops.block(&backup);
    let report = builder.clear_with_report();

    assert_eq!(report.restored, 1);
    assert!(report.restore_failures.is_empty());
    assert_eq!(ops.host_calls(), ["move"]);
    assert_eq!(read(&original), "original");
    assert_eq!(builder.status().state, DeploymentState::Clean);
    assert!(!fx.layout().backup_dir().exists());
}

#[test]
fn host_copy_places_files_the_sandbox_cannot_read() {
    let fx = Fixture::new();
    let pkg = fx.package("pkg", 0);
    let source = fx.package_file(&pkg, "a.txt", "a");

    let ops = BlockingOps::new().with_host_fallback(&["copy"]);
    ops.block(&source);
    let builder = fx.builder_with_ops(vec![pkg], ops.clone());

    assert_eq!(builder.deploy(), 1);
    assert_eq!(read(&fx.target.join("a.txt")), "a");
    assert_eq!(ops.host_calls(), ["copy"]);

    assert_eq!(builder.clear(), 1);
    assert_eq!(builder.status().state, DeploymentState::Clean);
}
