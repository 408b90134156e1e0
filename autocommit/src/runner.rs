//! Synchronous-to-completion execution of external commands.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::{GitWatchError, Result};

/// What happened when a command ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Program that was run.
    pub program: String,

    /// Arguments passed to it.
    pub args: Vec<String>,

    /// Working directory.
    pub cwd: PathBuf,

    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,

    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutcome {
    /// Whether the command exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Printable exit status.
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        }
    }

    /// Strict-mode error for an unsuccessful outcome.
    pub fn into_error(self) -> GitWatchError {
        GitWatchError::CommandFailed {
            code: self.status(),
            args: self.args.join(" "),
            program: self.program,
        }
    }
}

/// Runs an external command in a directory and waits for it to exit.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `cwd`. Errors only when the process
    /// cannot be started; exit statuses are reported in the outcome.
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<CommandOutcome>;
}

/// Spawns real processes. No timeout is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<CommandOutcome> {
        debug!("Running {program} {} in {}", args.join(" "), cwd.display());

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| GitWatchError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutcome {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let temp_dir = TempDir::new().unwrap();
        let args = vec!["-c".to_string(), "pwd -P".to_string()];

        let outcome = SystemRunner.run("sh", &args, temp_dir.path()).await.unwrap();

        assert!(outcome.success());
        assert_eq!(
            PathBuf::from(outcome.stdout.trim()),
            temp_dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_reports_exit_status() {
        let temp_dir = TempDir::new().unwrap();
        let args = vec!["-c".to_string(), "echo nope >&2; exit 3".to_string()];

        let outcome = SystemRunner.run("sh", &args, temp_dir.path()).await.unwrap();

        assert!(!outcome.success());
        assert_eq!(outcome.code, Some(3));
        assert_eq!(outcome.stderr.trim(), "nope");

        let err = outcome.into_error();
        assert_eq!(err.to_string(), "sh -c echo nope >&2; exit 3 exited with 3");
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let temp_dir = TempDir::new().unwrap();

        let err = SystemRunner
            .run("gitwatch-no-such-program", &[], temp_dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, GitWatchError::Spawn { .. }));
    }
}
