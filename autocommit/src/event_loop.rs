//! The main watch loop: wait for a signaled directory, drain its events,
//! commit what qualifies, re-arm.

use std::collections::HashSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use gitwatch_directory_watcher::{
    DirectoryConfig, NotificationSource, WatchEvent, WatchHandle, WatchRegistry,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::commit::CommitStrategy;
use crate::config::WatchConfig;
use crate::error::Result;

/// Suffix editors use for backup files.
const BACKUP_SUFFIX: char = '~';

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Every watched directory went away.
    WatchSetExhausted,

    /// Shutdown was requested while waiting.
    Interrupted,
}

/// Whether a changed path should be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Commit it.
    Eligible,

    /// Name ends in the backup suffix.
    BackupFile,

    /// Matches an exclude pattern.
    Excluded,

    /// No longer exists.
    Missing,

    /// Is a directory.
    Directory,

    /// Zero bytes, probably not written yet.
    Empty,
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Eligible => "eligible",
            Self::BackupFile => "backup file",
            Self::Excluded => "excluded",
            Self::Missing => "missing",
            Self::Directory => "directory",
            Self::Empty => "empty",
        };
        f.write_str(reason)
    }
}

/// Decide whether `path` qualifies for a commit.
pub async fn classify(path: &Path, directory: &DirectoryConfig) -> Result<Eligibility> {
    let is_backup = path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(BACKUP_SUFFIX));
    if is_backup {
        return Ok(Eligibility::BackupFile);
    }

    if directory.should_exclude(path) {
        return Ok(Eligibility::Excluded);
    }

    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Eligibility::Missing),
        Err(e) => return Err(e.into()),
    };

    Ok(if metadata.is_dir() {
        Eligibility::Directory
    } else if metadata.len() == 0 {
        Eligibility::Empty
    } else {
        Eligibility::Eligible
    })
}

/// Drives one notification source until its watch set is exhausted or a
/// shutdown is requested.
pub struct EventLoop<S> {
    source: S,
    registry: WatchRegistry,
    directory: DirectoryConfig,
    strategy: CommitStrategy,
    poll_timeout: Duration,
}

impl<S: NotificationSource> EventLoop<S> {
    /// Create a loop over directories already registered with `source`.
    pub fn new(
        source: S,
        registry: WatchRegistry,
        strategy: CommitStrategy,
        config: &WatchConfig,
    ) -> Self {
        Self {
            source,
            registry,
            directory: config.directory.clone(),
            strategy,
            poll_timeout: config.poll_timeout,
        }
    }

    /// Directories currently watched.
    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    /// Commit policy in use.
    pub fn strategy(&self) -> &CommitStrategy {
        &self.strategy
    }

    /// Run until the watch set is empty or `shutdown` is cancelled.
    ///
    /// Per-event failures are logged and never end the loop; only a broken
    /// notification source does.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<LoopExit> {
        loop {
            if self.registry.is_empty() {
                info!("No watched directories remain");
                return Ok(LoopExit::WatchSetExhausted);
            }

            let polled = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, leaving watch loop");
                    return Ok(LoopExit::Interrupted);
                }
                polled = self.source.poll(self.poll_timeout) => polled?,
            };

            match polled {
                Some(handle) => self.drain(handle).await,
                None => self.sweep(),
            }
        }
    }

    /// Process everything queued for `handle`, then re-arm it.
    ///
    /// In immediate mode the settle delay is waited once per batch, and
    /// changes that arrive meanwhile join the batch. Each entry is acted on
    /// at most once per batch.
    async fn drain(&mut self, handle: WatchHandle) {
        let mut events = self.source.take_events(handle);

        let Some(dir) = self.registry.resolve(handle).map(Path::to_path_buf) else {
            debug!("Ignoring {} events for unknown {handle}", events.len());
            return;
        };

        if let Some(delay) = self.strategy.settle_delay() {
            if events.iter().any(|e| !e.is_overflow()) {
                tokio::time::sleep(delay).await;
                events.extend(self.source.take_events(handle));
            }
        }

        let mut seen = HashSet::new();
        events.retain(|e| seen.insert((e.kind, e.name.clone())));

        for event in &events {
            if let Err(e) = Self::handle_event(&self.directory, &self.strategy, &dir, event).await {
                error!(
                    "Failed to process {} in {}: {e}",
                    event.name.display(),
                    dir.display()
                );
            }
        }

        if !self.source.reset(handle) {
            self.registry.invalidate(handle);
        }
    }

    async fn handle_event(
        directory: &DirectoryConfig,
        strategy: &CommitStrategy,
        dir: &Path,
        event: &WatchEvent,
    ) -> Result<()> {
        // Dropped events are not recovered.
        if event.is_overflow() {
            debug!("Notifications overflowed in {}", dir.display());
            return Ok(());
        }

        let path = dir.join(&event.name);
        match classify(&path, directory).await? {
            Eligibility::Eligible => strategy.on_change(&path).await,
            reason => {
                debug!(
                    "Skipping {} changed at {} ({reason})",
                    path.display(),
                    event.timestamp.to_rfc3339()
                );
                Ok(())
            }
        }
    }

    /// Drop every handle that is no longer valid.
    fn sweep(&mut self) {
        for handle in self.registry.handles() {
            if !self.source.reset(handle) {
                self.registry.invalidate(handle);
            }
        }
    }
}
