//! Command-line arguments.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use gitwatch_autocommit::config::{
    DEFAULT_COMMIT_MESSAGE, DEFAULT_INACTIVITY_THRESHOLD, DEFAULT_POLL_TIMEOUT,
    DEFAULT_SETTLE_DELAY, DEFAULT_TICK_PERIOD, DEFAULT_VCS_PROGRAM,
};
use gitwatch_autocommit::{CommitMode, WatchConfig};
use tracing::warn;

/// Commit files to version control as they change.
#[derive(Debug, Parser)]
#[command(name = "gitwatch", version)]
pub struct Cli {
    /// Directory tree to watch.
    pub directory: Option<PathBuf>,

    /// Commit a file only after it has stopped changing for the inactivity period.
    #[arg(long)]
    pub delayed: bool,

    /// Inactivity period for delayed commits, in seconds.
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_INACTIVITY_THRESHOLD.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub inactivity_secs: u64,

    /// Pause after a change before committing it, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_SETTLE_DELAY.as_millis() as u64)]
    pub settle_ms: u64,

    /// Commit message.
    #[arg(short = 'm', long, default_value = DEFAULT_COMMIT_MESSAGE)]
    pub message: String,

    /// Version-control program to invoke.
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_VCS_PROGRAM)]
    pub vcs: String,

    /// Longest single wait for file notifications, in seconds.
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_POLL_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_timeout_secs: u64,

    /// How often pending delayed commits are checked, in seconds.
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_TICK_PERIOD.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub tick_secs: u64,

    /// Treat a non-zero exit status from add or commit as a failure.
    #[arg(long)]
    pub strict: bool,

    /// Glob of paths to ignore; repeatable.
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Follow symbolic links when registering directories.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Extra positional arguments, accepted and ignored.
    #[arg(hide = true)]
    pub ignored: Vec<String>,
}

impl Cli {
    /// Parse process arguments, accepting the single-dash `-delayed` spelling.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_legacy_flags(std::env::args_os()))
    }

    /// Build the run configuration. `None` when no directory was given.
    pub fn into_config(self) -> Option<WatchConfig> {
        let directory = self.directory?;
        if !self.ignored.is_empty() {
            warn!("Ignoring extra arguments: {}", self.ignored.join(" "));
        }

        let mut config = WatchConfig::new(directory)
            .with_mode(if self.delayed {
                CommitMode::Deferred
            } else {
                CommitMode::Immediate
            })
            .with_inactivity_threshold(Duration::from_secs(self.inactivity_secs))
            .with_settle_delay(Duration::from_millis(self.settle_ms))
            .with_commit_message(self.message)
            .with_vcs_program(self.vcs)
            .with_poll_timeout(Duration::from_secs(self.poll_timeout_secs))
            .with_tick_period(Duration::from_secs(self.tick_secs));

        for pattern in self.exclude {
            config = config.exclude(pattern);
        }
        if self.strict {
            config = config.strict();
        }
        if self.follow_symlinks {
            config.directory = config.directory.follow_symlinks();
        }

        Some(config)
    }
}

/// Rewrite `-delayed` to `--delayed`.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            if arg == "-delayed" {
                OsString::from("--delayed")
            } else {
                arg
            }
        })
        .collect()
}
