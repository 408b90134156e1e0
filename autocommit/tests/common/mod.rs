//! Shared helpers for the end-to-end tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use gitwatch_autocommit::{CommandOutcome, CommandRunner, Result};

/// Records every invocation and reports success without running anything.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandOutcome>>,
}

impl RecordingRunner {
    /// `(args, cwd)` of every invocation so far.
    pub fn invocations(&self) -> Vec<(Vec<String>, PathBuf)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|outcome| (outcome.args.clone(), outcome.cwd.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<CommandOutcome> {
        let outcome = CommandOutcome {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        };
        self.calls.lock().unwrap().push(outcome.clone());
        Ok(outcome)
    }
}

/// Poll `condition` every 20ms until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// The expected add + commit pair for `file`.
pub fn commit_pair(file: &Path, message: &str) -> Vec<(Vec<String>, PathBuf)> {
    let parent = file.parent().unwrap().to_path_buf();
    vec![
        (
            vec!["add".to_string(), file.display().to_string()],
            parent.clone(),
        ),
        (
            vec!["commit".to_string(), "-m".to_string(), message.to_string()],
            parent,
        ),
    ]
}
