//! Wiring of registry, event loop, commit strategy and inactivity scan.

use std::sync::Arc;

use gitwatch_directory_watcher::{NotificationSource, NotifySource, WatchRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commit::{CommitStrategy, Committer};
use crate::config::WatchConfig;
use crate::error::Result;
use crate::event_loop::{EventLoop, LoopExit};
use crate::runner::{CommandRunner, SystemRunner};

/// A configured watch over one directory tree.
pub struct GitWatch<S = NotifySource> {
    config: WatchConfig,
    event_loop: EventLoop<S>,
}

impl GitWatch<NotifySource> {
    /// Watch with the platform notifier and real processes.
    pub fn new(config: WatchConfig) -> Result<Self> {
        Self::with_parts(config, NotifySource::new()?, Arc::new(SystemRunner))
    }
}

impl<S: NotificationSource> GitWatch<S> {
    /// Watch with the given notification source and command runner.
    ///
    /// Validates the configuration and registers the whole tree; any failure
    /// here is fatal and nothing has been started yet.
    pub fn with_parts(
        config: WatchConfig,
        mut source: S,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        let config = config.resolved()?;
        debug!("Effective configuration: {}", serde_json::to_string(&config)?);

        let mut registry = WatchRegistry::new();
        registry.register_tree(&mut source, &config.directory)?;

        let committer = Arc::new(Committer::from_config(runner, &config));
        let strategy = CommitStrategy::from_config(committer, &config);
        let event_loop = EventLoop::new(source, registry, strategy, &config);

        Ok(Self { config, event_loop })
    }

    /// The resolved configuration.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Number of directories currently watched.
    pub fn watched_directories(&self) -> usize {
        self.event_loop.registry().len()
    }

    /// Run until the watch set is exhausted or `shutdown` is cancelled.
    ///
    /// In deferred mode the inactivity scan runs alongside the loop and is
    /// stopped when the loop returns; pending files are not committed on the
    /// way out.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<LoopExit> {
        info!(
            "Watching directory: {} ({:?} mode)",
            self.config.directory.path.display(),
            self.config.mode
        );

        let scan_shutdown = shutdown.child_token();
        let scan = self
            .event_loop
            .strategy()
            .tracker()
            .map(|tracker| tracker.spawn(self.config.tick_period, scan_shutdown.clone()));

        let exit = self.event_loop.run(shutdown).await;

        scan_shutdown.cancel();
        if let Some(scan) = scan {
            if let Err(e) = scan.await {
                warn!("Inactivity scan task failed: {e}");
            }
        }
        if let Some(tracker) = self.event_loop.strategy().tracker() {
            let abandoned = tracker.len().await;
            if abandoned > 0 {
                warn!("{abandoned} deferred commits were not made before exit");
            }
        }

        exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitWatchError;
    use crate::runner::testing::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_new_registers_whole_tree() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("a/b")).unwrap();
        fs::create_dir_all(temp_dir.path().join("c")).unwrap();

        let watch = GitWatch::with_parts(
            WatchConfig::new(temp_dir.path()),
            NotifySource::new().unwrap(),
            Arc::new(RecordingRunner::default()),
        )
        .unwrap();

        assert_eq!(watch.watched_directories(), 4);
        assert_eq!(
            watch.config().directory.path,
            temp_dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_new_rejects_non_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        let result = GitWatch::new(WatchConfig::new(&file));

        assert!(matches!(result, Err(GitWatchError::Watcher(_))));
    }

    #[tokio::test]
    async fn test_run_returns_when_cancelled() {
        let temp_dir = TempDir::new().unwrap();
        let watch = GitWatch::with_parts(
            WatchConfig::new(temp_dir.path()).with_mode(crate::config::CommitMode::Deferred),
            NotifySource::new().unwrap(),
            Arc::new(RecordingRunner::default()),
        )
        .unwrap();

        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let exit = watch.run(shutdown).await.unwrap();
        assert_eq!(exit, LoopExit::Interrupted);
    }
}
