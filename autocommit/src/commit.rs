//! The add + commit sequence and the two policies for when to run it.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{CommitMode, WatchConfig};
use crate::error::{GitWatchError, Result};
use crate::runner::{CommandOutcome, CommandRunner};
use crate::tracker::InactivityTracker;

/// Outcomes of the two commands that make up one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// The `add <path>` invocation.
    pub add: CommandOutcome,

    /// The `commit -m <message>` invocation, if it ran.
    pub commit: Option<CommandOutcome>,
}

impl CommitReceipt {
    /// Whether both commands ran and exited successfully.
    pub fn succeeded(&self) -> bool {
        self.add.success() && self.commit.as_ref().is_some_and(CommandOutcome::success)
    }
}

/// Stages and commits single files.
pub struct Committer {
    runner: Arc<dyn CommandRunner>,
    program: String,
    message: String,
    verify: bool,
}

impl Committer {
    /// Create a committer running `program` through `runner`.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            message: message.into(),
            verify: false,
        }
    }

    /// Build a committer from the run configuration.
    pub fn from_config(runner: Arc<dyn CommandRunner>, config: &WatchConfig) -> Self {
        let committer = Self::new(runner, &config.vcs_program, &config.commit_message);
        if config.verify_exit_status {
            committer.verifying()
        } else {
            committer
        }
    }

    /// Fail on non-zero exit statuses instead of logging them.
    pub fn verifying(mut self) -> Self {
        self.verify = true;
        self
    }

    /// Run `add <path>` then `commit -m <message>`, both in the file's parent
    /// directory, each to completion.
    ///
    /// Exit statuses are best-effort unless verification is on: failures are
    /// logged and reported in the receipt. In verifying mode a failed add
    /// skips the commit and either failure is returned as an error.
    pub async fn commit(&self, path: &Path) -> Result<CommitReceipt> {
        let cwd = path
            .parent()
            .ok_or_else(|| GitWatchError::NoParent(path.to_path_buf()))?;

        info!("File modified: {}", path.display());

        let add_args = vec!["add".to_string(), path.display().to_string()];
        let add = self.runner.run(&self.program, &add_args, cwd).await?;
        if !add.success() {
            warn!(
                "{} add {} exited with {}: {}",
                self.program,
                path.display(),
                add.status(),
                add.stderr.trim()
            );
            if self.verify {
                return Err(add.into_error());
            }
        }

        let commit_args = vec!["commit".to_string(), "-m".to_string(), self.message.clone()];
        let commit = self.runner.run(&self.program, &commit_args, cwd).await?;
        if !commit.success() {
            warn!(
                "{} commit for {} exited with {}: {}",
                self.program,
                path.display(),
                commit.status(),
                commit.stderr.trim()
            );
            if self.verify {
                return Err(commit.into_error());
            }
        }

        Ok(CommitReceipt {
            add,
            commit: Some(commit),
        })
    }
}

/// When a qualifying change is committed.
pub enum CommitStrategy {
    /// Wait for the writer to settle, then commit right away.
    Immediate {
        /// Commits the file.
        committer: Arc<Committer>,
        /// Pause before committing.
        settle_delay: Duration,
    },

    /// Hand the file to the inactivity tracker.
    Deferred {
        /// Tracker owning the pending set.
        tracker: InactivityTracker,
    },
}

impl CommitStrategy {
    /// Pick the strategy configured for this run.
    pub fn from_config(committer: Arc<Committer>, config: &WatchConfig) -> Self {
        match config.mode {
            CommitMode::Immediate => Self::Immediate {
                committer,
                settle_delay: config.settle_delay,
            },
            CommitMode::Deferred => Self::Deferred {
                tracker: InactivityTracker::new(committer, config.inactivity_threshold),
            },
        }
    }

    /// Pause to take before acting on a batch of changes, in immediate mode.
    pub fn settle_delay(&self) -> Option<Duration> {
        match self {
            Self::Immediate { settle_delay, .. } => Some(*settle_delay),
            Self::Deferred { .. } => None,
        }
    }

    /// Act on a qualifying change to `path`. The caller has already waited
    /// out the settle delay.
    pub async fn on_change(&self, path: &Path) -> Result<()> {
        match self {
            Self::Immediate { committer, .. } => {
                committer.commit(path).await?;
            }
            Self::Deferred { tracker } => {
                tracker.insert(path).await;
            }
        }
        Ok(())
    }

    /// The tracker, in deferred mode.
    pub fn tracker(&self) -> Option<&InactivityTracker> {
        match self {
            Self::Immediate { .. } => None,
            Self::Deferred { tracker } => Some(tracker),
        }
    }
}
