//! Mapping from watch handles to the directories they observe.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::DirectoryConfig;
use crate::error::Result;
use crate::event::WatchHandle;
use crate::source::NotificationSource;

/// Every currently watched directory, keyed by its live handle.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    dirs: HashMap<WatchHandle, PathBuf>,
}

impl WatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk every directory under the configured root (inclusive) and
    /// register it with `source`.
    ///
    /// Fails on the first entry the walk cannot read. Directories matching an
    /// exclude pattern are skipped together with their subtrees; the root is
    /// always registered.
    pub fn register_tree<S>(&mut self, source: &mut S, config: &DirectoryConfig) -> Result<usize>
    where
        S: NotificationSource + ?Sized,
    {
        let root = config.path.as_path();
        let walker = WalkDir::new(root)
            .follow_links(config.follow_symlinks)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !config.should_exclude(entry.path()));

        let mut registered = 0;
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }

            self.register(source, entry.path())?;
            registered += 1;
        }

        info!(
            "Registered {registered} directories under {}",
            root.display()
        );
        Ok(registered)
    }

    /// Register a single directory.
    pub fn register<S>(&mut self, source: &mut S, dir: &Path) -> Result<WatchHandle>
    where
        S: NotificationSource + ?Sized,
    {
        let handle = source.register(dir)?;
        debug!("Watching {} as {handle}", dir.display());
        self.dirs.insert(handle, dir.to_path_buf());
        Ok(handle)
    }

    /// Directory observed by `handle`, if it is still registered.
    pub fn resolve(&self, handle: WatchHandle) -> Option<&Path> {
        self.dirs.get(&handle).map(PathBuf::as_path)
    }

    /// Drop a handle that has become invalid.
    pub fn invalidate(&mut self, handle: WatchHandle) -> Option<PathBuf> {
        let removed = self.dirs.remove(&handle);
        if let Some(ref dir) = removed {
            debug!("Stopped watching {} ({handle})", dir.display());
        }
        removed
    }

    /// Whether no directory is watched anymore.
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Number of watched directories.
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// All live handles.
    pub fn handles(&self) -> Vec<WatchHandle> {
        self.dirs.keys().copied().collect()
    }

    /// Whether `dir` has a live handle.
    pub fn contains_dir(&self, dir: &Path) -> bool {
        self.dirs.values().any(|d| d == dir)
    }
}
