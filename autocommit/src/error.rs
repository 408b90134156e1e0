//! Error types for automatic commits.

use std::path::PathBuf;

use gitwatch_directory_watcher::WatcherError;
use thiserror::Error;

/// Result type alias for autocommit operations.
pub type Result<T> = std::result::Result<T, GitWatchError>;

/// Errors that can occur while watching and committing.
#[derive(Error, Debug)]
pub enum GitWatchError {
    /// Watcher error.
    #[error(transparent)]
    Watcher(#[from] WatcherError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The external command could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The external command exited unsuccessfully (strict mode only).
    #[error("{program} {args} exited with {code}")]
    CommandFailed {
        /// Program that was run.
        program: String,
        /// Space-joined arguments.
        args: String,
        /// Exit code, or "signal" when terminated by one.
        code: String,
    },

    /// A changed path has no parent directory to run commands in.
    #[error("path has no parent directory: {0}")]
    NoParent(PathBuf),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
