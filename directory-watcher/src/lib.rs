//! # Directory Watcher
//!
//! Per-directory change notifications for gitwatch. Every directory in a tree
//! is registered individually and identified by a [`WatchHandle`]; the
//! consumer polls for a signaled handle, drains its events and re-arms it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  DirectoryConfig ──► WatchRegistry ──► NotificationSource      │
//! │       │                   │                   │                 │
//! │       ▼                   ▼                   ▼                 │
//! │  ExcludePatterns    handle → dir map      WatchEvent            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod registry;
pub mod source;
pub mod watcher;

pub use config::DirectoryConfig;
pub use error::{Result, WatcherError};
pub use event::{WatchEvent, WatchEventKind, WatchHandle};
pub use registry::WatchRegistry;
pub use source::NotificationSource;
pub use watcher::NotifySource;
