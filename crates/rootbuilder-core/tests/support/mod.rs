#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rootbuilder_core::config::{Settings, SettingsStore, StorageLayout};
use rootbuilder_core::context::RootBuilder;
use rootbuilder_core::error::FileOpError;
use rootbuilder_core::fs::{FileOps, HostEnvironment, LocalFileOps};
use rootbuilder_core::manifest::ManifestStore;
use rootbuilder_core::types::Package;
use tempfile::TempDir;

/// Target, package and storage directories under one temp dir.
pub struct Fixture {
    _temp: TempDir,
    pub target: PathBuf,
    pub mods: PathBuf,
    pub storage: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("tempdir should succeed");
        let target = temp.path().join("game");
        let mods = temp.path().join("mods");
        let storage = temp.path().join("storage");
        fs::create_dir_all(&target).expect("create_dir_all should succeed");
        fs::create_dir_all(&mods).expect("create_dir_all should succeed");
        Self {
            _temp: temp,
            target,
            mods,
            storage,
        }
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.storage)
    }

    pub fn manifest_store(&self) -> ManifestStore {
        ManifestStore::from_layout(&self.layout())
    }

    /// An active package whose override dir is `mods/<name>/Root`.
    pub fn package(&self, name: &str, priority: usize) -> Package {
        let root = self.mods.join(name).join("Root");
        fs::create_dir_all(&root).expect("create_dir_all should succeed");
        Package::new(name, priority).with_override_dir(root)
    }

    /// Write `content` to `relative` inside a package's override dir.
    pub fn package_file(&self, package: &Package, relative: &str, content: &str) -> PathBuf {
        let root = package
            .override_dir
            .as_ref()
            .expect("package should have an override dir");
        write_file(&root.join(relative), content)
    }

    pub fn target_file(&self, relative: &str, content: &str) -> PathBuf {
        write_file(&self.target.join(relative), content)
    }

    pub fn set_settings(&self, settings: Settings) {
        SettingsStore::new(self.layout().settings_path())
            .save(&settings)
            .expect("save settings should succeed");
    }

    pub fn builder(&self, packages: Vec<Package>) -> RootBuilder {
        self.builder_with_ops(packages, LocalFileOps::new(HostEnvironment::plain()))
    }

    pub fn builder_with_ops(&self, packages: Vec<Package>, ops: impl FileOps + 'static) -> RootBuilder {
        RootBuilder::new(
            self.target.clone(),
            self.layout(),
            Box::new(ops),
            Box::new(packages),
        )
    }
}

pub fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create_dir_all should succeed");
    }
    fs::write(path, content).expect("write should succeed");
    path.to_path_buf()
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("read should succeed")
}

/// Local file operations with injectable failures.
///
/// - `block`: every operation touching the path fails, at every rung.
/// - `pin`: only removal of the path fails, at every direct rung.
/// - `lock`: writes at the path, or directly inside it, fail until
///   `ensure_writable` is called on it.
/// - `with_host_fallback`: the named host operations (`copy`, `remove`,
///   `move`) succeed and bypass all of the above.
///
/// Clones share state, so a test can keep one handle while the engine owns
/// another.
#[derive(Clone, Default)]
pub struct BlockingOps {
    inner: LocalFileOps,
    state: Rc<RefCell<BlockState>>,
}

#[derive(Default)]
struct BlockState {
    blocked: HashSet<PathBuf>,
    pinned: HashSet<PathBuf>,
    locked: HashSet<PathBuf>,
    made_writable: Vec<PathBuf>,
    host_enabled: HashSet<&'static str>,
    host_calls: Vec<&'static str>,
}

fn denied(reason: &str, path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("{reason}: {}", path.display()),
    )
}

impl BlockingOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host_fallback(self, operations: &[&'static str]) -> Self {
        self.state
            .borrow_mut()
            .host_enabled
            .extend(operations.iter().copied());
        self
    }

    pub fn block(&self, path: &Path) {
        self.state.borrow_mut().blocked.insert(path.to_path_buf());
    }

    /// Refuse only removal of `path`; it can still be read and copied.
    pub fn pin(&self, path: &Path) {
        self.state.borrow_mut().pinned.insert(path.to_path_buf());
    }

    pub fn lock(&self, path: &Path) {
        self.state.borrow_mut().locked.insert(path.to_path_buf());
    }

    pub fn unblock(&self, path: &Path) {
        let mut state = self.state.borrow_mut();
        state.blocked.remove(path);
        state.pinned.remove(path);
        state.locked.remove(path);
    }

    /// Paths passed to `ensure_writable`, in call order.
    pub fn made_writable(&self) -> Vec<PathBuf> {
        self.state.borrow().made_writable.clone()
    }

    /// Host operations that ran, in call order.
    pub fn host_calls(&self) -> Vec<&'static str> {
        self.state.borrow().host_calls.clone()
    }

    fn check(&self, paths: &[&Path]) -> io::Result<()> {
        let state = self.state.borrow();
        match paths.iter().find(|path| state.blocked.contains(**path)) {
            Some(path) => Err(denied("blocked", path)),
            None => Ok(()),
        }
    }

    fn check_lock(&self, path: &Path) -> io::Result<()> {
        let state = self.state.borrow();
        let parent_locked = path.parent().is_some_and(|parent| state.locked.contains(parent));
        if state.locked.contains(path) || parent_locked {
            return Err(denied("locked", path));
        }
        Ok(())
    }

    fn host(&self, name: &'static str) -> Result<(), FileOpError> {
        let mut state = self.state.borrow_mut();
        if !state.host_enabled.contains(name) {
            return Err(FileOpError::NoHostFallback);
        }
        state.host_calls.push(name);
        Ok(())
    }
}

impl FileOps for BlockingOps {
    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        self.check(&[src, dst])?;
        self.check_lock(dst)?;
        self.inner.copy_file(src, dst)
    }

    fn symlink(&self, src: &Path, dst: &Path) -> io::Result<()> {
        self.check(&[dst])?;
        self.check_lock(dst)?;
        self.inner.symlink(src, dst)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.check(&[path])?;
        self.check_lock(path)?;
        if self.state.borrow().pinned.contains(path) {
            return Err(denied("pinned", path));
        }
        self.inner.remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.check(&[path])?;
        self.inner.remove_dir(path)
    }

    fn rename(&self, src: &Path, dst: &Path) -> io::Result<()> {
        self.check(&[src, dst])?;
        self.check_lock(dst)?;
        self.inner.rename(src, dst)
    }

    fn ensure_writable(&self, path: &Path) -> io::Result<()> {
        {
            let mut state = self.state.borrow_mut();
            state.made_writable.push(path.to_path_buf());
            state.locked.remove(path);
        }
        self.inner.ensure_writable(path)
    }

    fn host_copy(&self, src: &Path, dst: &Path) -> Result<(), FileOpError> {
        self.host("copy")?;
        fs::copy(src, dst)
            .map(|_| ())
            .map_err(|err| FileOpError::io(dst, err))
    }

    fn host_remove(&self, path: &Path) -> Result<(), FileOpError> {
        self.host("remove")?;
        fs::remove_file(path).map_err(|err| FileOpError::io(path, err))
    }

    fn host_move(&self, src: &Path, dst: &Path) -> Result<(), FileOpError> {
        self.host("move")?;
        fs::rename(src, dst).map_err(|err| FileOpError::io(dst, err))
    }
}
