//! Notification source backed by the platform watcher.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::error::{Result, WatcherError};
use crate::event::{WatchEvent, WatchEventKind, WatchHandle};
use crate::source::NotificationSource;

/// Raw backend results buffered between the watcher thread and `poll`.
const EVENT_BUFFER: usize = 1000;

/// Watches each registered directory non-recursively and groups the
/// backend's events by the handle of the directory they happened in.
pub struct NotifySource {
    /// Internal notify watcher.
    watcher: RecommendedWatcher,

    /// Raw results from the watcher thread.
    raw_rx: mpsc::Receiver<notify::Result<notify::Event>>,

    /// Directory → handle, for attributing events.
    handles: HashMap<PathBuf, WatchHandle>,

    /// Handle → directory.
    dirs: HashMap<WatchHandle, PathBuf>,

    /// Events not yet taken, per handle.
    queued: HashMap<WatchHandle, Vec<WatchEvent>>,

    /// Signaled handles in the order they were first signaled.
    ready: VecDeque<WatchHandle>,

    /// Handles whose directory was removed.
    invalid: HashSet<WatchHandle>,

    next_id: u64,
}

impl NotifySource {
    /// Create a source with no registered directories.
    pub fn new() -> Result<Self> {
        let (raw_tx, raw_rx) = mpsc::channel(EVENT_BUFFER);

        let watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| {
                if let Err(e) = raw_tx.blocking_send(res) {
                    error!("Failed to forward watch event: {e}");
                }
            },
        )?;

        Ok(Self {
            watcher,
            raw_rx,
            handles: HashMap::new(),
            dirs: HashMap::new(),
            queued: HashMap::new(),
            ready: VecDeque::new(),
            invalid: HashSet::new(),
            next_id: 0,
        })
    }

    /// Number of directories with a live watch.
    pub fn watched_count(&self) -> usize {
        self.dirs.len()
    }

    fn signal(&mut self, handle: WatchHandle) {
        if !self.ready.contains(&handle) {
            self.ready.push_back(handle);
        }
    }

    /// Queue `event` for `handle`, folding it into the last queued event
    /// when it repeats it. A save split across several writes queues once.
    fn enqueue(&mut self, handle: WatchHandle, event: WatchEvent) {
        let queue = self.queued.entry(handle).or_default();
        if queue.last().is_some_and(|last| last.repeats(&event)) {
            return;
        }
        queue.push(event);
        self.signal(handle);
    }

    /// Ingest whatever the watcher thread has already delivered.
    fn ingest_pending(&mut self) {
        while let Ok(res) = self.raw_rx.try_recv() {
            self.ingest(res);
        }
    }

    /// Handle of the directory `path` is, or is directly inside of.
    fn owner_of(&self, path: &Path) -> Option<WatchHandle> {
        self.handles
            .get(path)
            .or_else(|| path.parent().and_then(|parent| self.handles.get(parent)))
            .copied()
    }

    fn ingest(&mut self, res: notify::Result<notify::Event>) {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!("Watch error: {e}");
                return;
            }
        };

        if event.need_rescan() {
            let owners: Vec<WatchHandle> = event
                .paths
                .iter()
                .filter_map(|path| self.owner_of(path))
                .collect();
            if owners.is_empty() {
                warn!("Notification backend dropped events");
            }
            for handle in owners {
                self.enqueue(handle, WatchEvent::overflow());
            }
            return;
        }

        match event.kind {
            EventKind::Remove(_) => {
                for path in &event.paths {
                    if let Some(&handle) = self.handles.get(path) {
                        debug!("Watched directory removed: {}", path.display());
                        self.invalid.insert(handle);
                        self.signal(handle);
                    }
                }
            }
            EventKind::Modify(notify::event::ModifyKind::Name(_)) => {
                // A renamed directory is checked for existence on reset.
                for path in &event.paths {
                    if let Some(&handle) = self.handles.get(path) {
                        self.signal(handle);
                    }
                }
            }
            ref kind => {
                let Some(kind) = WatchEventKind::from_notify(kind) else {
                    return;
                };
                for path in &event.paths {
                    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                        continue;
                    };
                    if let Some(&handle) = self.handles.get(parent) {
                        self.enqueue(
                            handle,
                            WatchEvent {
                                kind,
                                name: PathBuf::from(name),
                                timestamp: Utc::now(),
                            },
                        );
                    }
                }
            }
        }
    }

    fn forget(&mut self, handle: WatchHandle) {
        self.invalid.remove(&handle);
        self.queued.remove(&handle);
        self.ready.retain(|h| *h != handle);

        if let Some(dir) = self.dirs.remove(&handle) {
            self.handles.remove(&dir);
            // The backend usually drops the watch itself once the directory is gone.
            if let Err(e) = self.watcher.unwatch(&dir) {
                debug!("Unwatch {} failed: {e}", dir.display());
            }
        }
    }
}

#[async_trait]
impl NotificationSource for NotifySource {
    fn register(&mut self, dir: &Path) -> Result<WatchHandle> {
        if let Some(&handle) = self.handles.get(dir) {
            return Ok(handle);
        }

        self.watcher.watch(dir, RecursiveMode::NonRecursive)?;

        self.next_id += 1;
        let handle = WatchHandle::new(self.next_id);
        self.handles.insert(dir.to_path_buf(), handle);
        self.dirs.insert(handle, dir.to_path_buf());
        Ok(handle)
    }

    async fn poll(&mut self, timeout: Duration) -> Result<Option<WatchHandle>> {
        let deadline = Instant::now() + timeout;

        loop {
            self.ingest_pending();

            if let Some(handle) = self.ready.pop_front() {
                return Ok(Some(handle));
            }

            match tokio::time::timeout_at(deadline, self.raw_rx.recv()).await {
                Err(_) => return Ok(None),
                Ok(None) => return Err(WatcherError::ChannelClosed),
                Ok(Some(res)) => self.ingest(res),
            }
        }
    }

    fn take_events(&mut self, handle: WatchHandle) -> Vec<WatchEvent> {
        self.ingest_pending();
        // Everything queued is handed over, so the handle need not fire again.
        self.ready.retain(|h| *h != handle);
        self.queued.remove(&handle).unwrap_or_default()
    }

    fn reset(&mut self, handle: WatchHandle) -> bool {
        let valid = !self.invalid.contains(&handle)
            && self.dirs.get(&handle).is_some_and(|dir| dir.is_dir());

        if !valid {
            self.forget(handle);
        }
        valid
    }
}
