//! # Autocommit
//!
//! Stages and commits files under a watched directory tree as they change.
//!
//! ## Commit modes
//!
//! - **Immediate**: after each qualifying change, wait a short settle delay
//!   for the writer to finish, then run `add` and `commit` for that file.
//! - **Deferred**: queue the file; a periodic scan commits it once it has not
//!   been modified for the inactivity threshold.
//!
//! A change qualifies when the file still exists, is not a directory, is not
//! empty, does not end in `~` and matches no exclude pattern.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         GitWatch                                │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  NotificationSource ──► EventLoop ──► CommitStrategy            │
//! │         ▲                  │             │          │           │
//! │         │                  ▼             ▼          ▼           │
//! │   WatchRegistry        classify      Committer ◄─ Inactivity    │
//! │                                          │          Tracker     │
//! │                                          ▼                      │
//! │                                    CommandRunner                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gitwatch_autocommit::{CommitMode, GitWatch, WatchConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = WatchConfig::new("/srv/notes").with_mode(CommitMode::Deferred);
//! let exit = GitWatch::new(config)?.run(CancellationToken::new()).await?;
//! ```

pub mod commit;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod runner;
pub mod service;
pub mod tracker;

pub use commit::{CommitReceipt, CommitStrategy, Committer};
pub use config::{CommitMode, WatchConfig};
pub use error::{GitWatchError, Result};
pub use event_loop::{Eligibility, EventLoop, LoopExit, classify};
pub use runner::{CommandOutcome, CommandRunner, SystemRunner};
pub use service::GitWatch;
pub use tracker::{InactivityTracker, TickReport, is_quiescent};
