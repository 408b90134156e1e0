//! Configuration types for directory watching.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WatcherError};

/// Configuration for a watched directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Root of the tree.
    pub path: PathBuf,

    /// Patterns to exclude (glob patterns, matched against absolute paths).
    pub exclude_patterns: Vec<String>,

    /// Whether to follow symbolic links while walking the tree.
    pub follow_symlinks: bool,
}

impl DirectoryConfig {
    /// Create a new directory config with no exclusions.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exclude_patterns: Vec::new(),
            follow_symlinks: false,
        }
    }

    /// Add an exclude pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Enable following symbolic links.
    pub fn follow_symlinks(mut self) -> Self {
        self.follow_symlinks = true;
        self
    }

    /// Check that the root is a directory and every pattern compiles.
    pub fn validate(&self) -> Result<()> {
        if !self.path.exists() {
            return Err(WatcherError::DirectoryNotFound(
                self.path.display().to_string(),
            ));
        }
        if !self.path.is_dir() {
            return Err(WatcherError::NotADirectory(self.path.display().to_string()));
        }

        for pattern in &self.exclude_patterns {
            glob::Pattern::new(pattern)
                .map_err(|e| WatcherError::InvalidPattern(format!("{pattern}: {e}")))?;
        }

        Ok(())
    }

    /// Check if a path should be excluded.
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        self.exclude_patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern).is_ok_and(|glob| glob.matches(&path_str))
        })
    }
}
