//! Deferred commits for files that have stopped changing.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commit::Committer;
use crate::error::Result;

/// Whether a file last modified at `modified` has been quiet for `threshold`
/// as of `now`. A modification time in the future is never quiescent.
pub fn is_quiescent(modified: SystemTime, now: SystemTime, threshold: Duration) -> bool {
    now.duration_since(modified)
        .is_ok_and(|elapsed| elapsed >= threshold)
}

/// Summary of one scan over the pending set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Paths committed and removed.
    pub committed: Vec<PathBuf>,

    /// Paths still changing.
    pub waiting: usize,

    /// Paths that could not be evaluated or committed; kept for the next tick.
    pub failed: usize,
}

/// Pending paths awaiting an inactivity-based commit.
///
/// Cloning shares the same pending set, so the event loop can insert while a
/// spawned scan task evaluates.
#[derive(Clone)]
pub struct InactivityTracker {
    pending: Arc<Mutex<BTreeSet<PathBuf>>>,
    committer: Arc<Committer>,
    threshold: Duration,
}

impl InactivityTracker {
    /// Create a tracker committing through `committer` once a file has been
    /// quiet for `threshold`.
    pub fn new(committer: Arc<Committer>, threshold: Duration) -> Self {
        Self {
            pending: Arc::new(Mutex::new(BTreeSet::new())),
            committer,
            threshold,
        }
    }

    /// Quiescence required before committing.
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Queue `path`. Returns `false` if it was already pending.
    pub async fn insert(&self, path: &Path) -> bool {
        let inserted = self.pending.lock().await.insert(path.to_path_buf());
        if inserted {
            debug!("Deferred commit queued for {}", path.display());
        }
        inserted
    }

    /// Snapshot of the pending paths, sorted.
    pub async fn pending(&self) -> Vec<PathBuf> {
        self.pending.lock().await.iter().cloned().collect()
    }

    /// Number of pending paths.
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Whether nothing is pending.
    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }

    /// Scan the pending set against the current time.
    pub async fn tick(&self) -> TickReport {
        self.tick_at(SystemTime::now()).await
    }

    /// Scan the pending set as of `now`.
    ///
    /// Each path is evaluated on its own; a path that cannot be read or
    /// committed is logged and kept so it is retried next tick. The lock is
    /// not held while commands run.
    pub async fn tick_at(&self, now: SystemTime) -> TickReport {
        let snapshot = self.pending().await;
        let mut report = TickReport::default();

        for path in snapshot {
            match self.evaluate(&path, now).await {
                Ok(Some(modified)) => {
                    // Changed again while committing: keep it for the next round.
                    let touched = tokio::fs::metadata(&path)
                        .await
                        .and_then(|metadata| metadata.modified())
                        .is_ok_and(|current| current > modified);
                    if !touched {
                        self.pending.lock().await.remove(&path);
                    }
                    report.committed.push(path);
                }
                Ok(None) => report.waiting += 1,
                Err(e) => {
                    warn!("Deferred commit of {} failed: {e}", path.display());
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Commit `path` if it is quiescent. Returns the modification time the
    /// decision was based on.
    async fn evaluate(&self, path: &Path, now: SystemTime) -> Result<Option<SystemTime>> {
        let modified = tokio::fs::metadata(path).await?.modified()?;
        if !is_quiescent(modified, now, self.threshold) {
            return Ok(None);
        }

        self.committer.commit(path).await?;
        Ok(Some(modified))
    }

    /// Scan every `period`, starting immediately, until `shutdown` fires.
    pub fn spawn(&self, period: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let tracker = self.clone();
        let period = period.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                "Inactivity scan every {period:?}, threshold {:?}",
                tracker.threshold
            );
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let report = tracker.tick().await;
                        if !report.committed.is_empty() || report.failed > 0 {
                            debug!(
                                "Inactivity scan: {} committed, {} waiting, {} failed",
                                report.committed.len(),
                                report.waiting,
                                report.failed
                            );
                        }
                    }
                }
            }
            debug!("Inactivity scan stopped");
        })
    }
}
