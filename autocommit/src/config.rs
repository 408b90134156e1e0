//! Runtime configuration, fixed for the life of the process.

use std::path::PathBuf;
use std::time::Duration;

use gitwatch_directory_watcher::DirectoryConfig;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How long a file must go unmodified before a deferred commit.
pub const DEFAULT_INACTIVITY_THRESHOLD: Duration = Duration::from_secs(10 * 60);

/// Pause between noticing a change and committing it in immediate mode.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// Upper bound on a single wait for notifications.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// Period of the inactivity scan.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(60);

/// Message used for every commit. Passed as one argument, so it carries no
/// surrounding quotes.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Cleanup";

/// Version-control program invoked for add and commit.
pub const DEFAULT_VCS_PROGRAM: &str = "git";

/// When a qualifying change gets committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Commit each change after the settle delay.
    #[default]
    Immediate,

    /// Commit a file once it has been quiescent for the inactivity threshold.
    Deferred,
}

/// Configuration for a gitwatch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Tree to watch.
    pub directory: DirectoryConfig,

    /// Commit policy.
    pub mode: CommitMode,

    /// Quiescence required before a deferred commit.
    pub inactivity_threshold: Duration,

    /// Pause before an immediate commit.
    pub settle_delay: Duration,

    /// Commit message.
    pub commit_message: String,

    /// Version-control program.
    pub vcs_program: String,

    /// Bounded wait for notifications; timeouts trigger a liveness sweep.
    pub poll_timeout: Duration,

    /// Period of the inactivity scan.
    pub tick_period: Duration,

    /// Treat non-zero exit statuses as commit failures.
    pub verify_exit_status: bool,
}

impl WatchConfig {
    /// Create a config for `root` with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            directory: DirectoryConfig::new(root),
            mode: CommitMode::default(),
            inactivity_threshold: DEFAULT_INACTIVITY_THRESHOLD,
            settle_delay: DEFAULT_SETTLE_DELAY,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            vcs_program: DEFAULT_VCS_PROGRAM.to_string(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            tick_period: DEFAULT_TICK_PERIOD,
            verify_exit_status: false,
        }
    }

    /// Set the commit mode.
    pub fn with_mode(mut self, mode: CommitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the inactivity threshold.
    pub fn with_inactivity_threshold(mut self, threshold: Duration) -> Self {
        self.inactivity_threshold = threshold;
        self
    }

    /// Set the settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the commit message.
    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    /// Set the version-control program.
    pub fn with_vcs_program(mut self, program: impl Into<String>) -> Self {
        self.vcs_program = program.into();
        self
    }

    /// Set the notification poll timeout.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the inactivity scan period.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Fail commits whose commands exit unsuccessfully.
    pub fn strict(mut self) -> Self {
        self.verify_exit_status = true;
        self
    }

    /// Add an exclude pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.directory = self.directory.exclude(pattern);
        self
    }

    /// Validate and canonicalize the root so that notification paths and
    /// registered paths agree.
    pub fn resolved(mut self) -> Result<Self> {
        self.directory.validate()?;
        self.directory.path = self.directory.path.canonicalize()?;
        Ok(self)
    }
}
