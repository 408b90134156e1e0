//! Watch handles and the events delivered for them.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use notify::event::ModifyKind;
use serde::{Deserialize, Serialize};

/// Opaque token identifying one registered directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WatchHandle(u64);

impl WatchHandle {
    /// Create a handle from a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id of the handle.
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// An event observed in a watched directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEvent {
    /// The kind of event.
    pub kind: WatchEventKind,

    /// Name of the entry relative to the watched directory. Empty for overflow.
    pub name: PathBuf,

    /// When the event was observed.
    pub timestamp: DateTime<Utc>,
}

impl WatchEvent {
    /// A modification of `name` inside the watched directory.
    pub fn modified(name: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Modify,
            name: name.into(),
            timestamp: Utc::now(),
        }
    }

    /// Events were dropped by the backend.
    pub fn overflow() -> Self {
        Self {
            kind: WatchEventKind::Overflow,
            name: PathBuf::new(),
            timestamp: Utc::now(),
        }
    }

    /// Check if this event signals dropped notifications.
    pub fn is_overflow(&self) -> bool {
        self.kind == WatchEventKind::Overflow
    }

    /// Same kind of change to the same entry, whenever it was observed.
    pub fn repeats(&self, other: &WatchEvent) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

/// Kind of watch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchEventKind {
    /// Entry contents or attributes changed.
    Modify,

    /// The backend dropped events.
    Overflow,
}

impl WatchEventKind {
    /// Map a backend event kind onto the kinds we watch for.
    ///
    /// Renames are reported by backends as creations and removals of names,
    /// not as modifications, so they are not watched.
    pub fn from_notify(kind: &notify::EventKind) -> Option<Self> {
        match kind {
            notify::EventKind::Modify(ModifyKind::Name(_)) => None,
            notify::EventKind::Modify(_) => Some(Self::Modify),
            _ => None,
        }
    }
}
