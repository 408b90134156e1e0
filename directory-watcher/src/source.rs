//! The notification collaborator the event loop is written against.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::event::{WatchEvent, WatchHandle};

/// A source of per-directory change notifications.
///
/// The protocol mirrors a classic watch service: a directory is registered
/// and yields a handle, `poll` waits (bounded) for a handle to be signaled,
/// `take_events` drains what was queued for it, and `reset` re-arms it while
/// reporting whether the handle is still valid.
#[async_trait]
pub trait NotificationSource: Send {
    /// Register a directory for modification notifications.
    fn register(&mut self, dir: &Path) -> Result<WatchHandle>;

    /// Wait up to `timeout` for a signaled handle. `None` on timeout.
    async fn poll(&mut self, timeout: Duration) -> Result<Option<WatchHandle>>;

    /// Drain the events queued for `handle`, in arrival order. Back-to-back
    /// repeats of the same change may be folded into one.
    fn take_events(&mut self, handle: WatchHandle) -> Vec<WatchEvent>;

    /// Re-arm `handle`. Returns `false` once the handle is permanently invalid.
    fn reset(&mut self, handle: WatchHandle) -> bool;
}
