//! End-to-end tests against the platform file watcher.
//!
//! Commands are recorded instead of executed, so no version-control tool is
//! needed.

mod common;

use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use gitwatch_autocommit::{CommitMode, GitWatch, LoopExit, WatchConfig};
use gitwatch_directory_watcher::NotifySource;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use common::{RecordingRunner, commit_pair, wait_until};

fn start(
    config: WatchConfig,
    runner: &Arc<RecordingRunner>,
) -> (
    CancellationToken,
    tokio::task::JoinHandle<gitwatch_autocommit::Result<LoopExit>>,
) {
    let watch = GitWatch::with_parts(config, NotifySource::new().unwrap(), runner.clone()).unwrap();
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(watch.run(shutdown.clone()));
    (shutdown, task)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_immediate_mode_commits_new_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    let runner = Arc::new(RecordingRunner::default());

    let config = WatchConfig::new(&root).with_settle_delay(Duration::from_millis(100));
    let (shutdown, task) = start(config, &runner);

    let file = root.join("a.txt");
    fs::write(&file, "content").unwrap();

    assert!(
        wait_until(Duration::from_secs(10), || runner.count() >= 2).await,
        "no commit observed"
    );
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(runner.invocations(), commit_pair(&file, "Cleanup"));

    shutdown.cancel();
    assert_eq!(task.await.unwrap().unwrap(), LoopExit::Interrupted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_immediate_mode_commits_in_subdirectory() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("docs/drafts")).unwrap();
    let runner = Arc::new(RecordingRunner::default());

    let config = WatchConfig::new(&root).with_settle_delay(Duration::from_millis(50));
    let (shutdown, task) = start(config, &runner);

    let file = root.join("docs/drafts/plan.md");
    fs::write(&file, "# plan").unwrap();

    assert!(wait_until(Duration::from_secs(10), || runner.count() >= 2).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(runner.invocations(), commit_pair(&file, "Cleanup"));

    shutdown.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_backup_and_empty_files_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    let placeholder = root.join("placeholder.txt");
    fs::write(&placeholder, "old contents").unwrap();
    let runner = Arc::new(RecordingRunner::default());

    let config = WatchConfig::new(&root).with_settle_delay(Duration::from_millis(10));
    let (shutdown, task) = start(config, &runner);

    fs::write(root.join("notes.md~"), "backup").unwrap();
    // Truncation reports a modification of a now zero-byte file.
    fs::File::create(&placeholder).unwrap();
    // A real change afterwards proves the loop was listening.
    let file = root.join("real.txt");
    fs::write(&file, "content").unwrap();

    assert!(wait_until(Duration::from_secs(10), || runner.count() >= 2).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(runner.invocations(), commit_pair(&file, "Cleanup"));
    assert_eq!(fs::metadata(&placeholder).unwrap().len(), 0);

    shutdown.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_save_written_in_chunks_commits_once() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    let file = root.join("a.txt");
    fs::write(&file, "start ").unwrap();
    let runner = Arc::new(RecordingRunner::default());

    let config = WatchConfig::new(&root).with_settle_delay(Duration::from_millis(300));
    let (shutdown, task) = start(config, &runner);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut out = fs::OpenOptions::new().append(true).open(&file).unwrap();
    for chunk in ["one ", "two ", "three"] {
        out.write_all(chunk.as_bytes()).unwrap();
        out.flush().unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    drop(out);

    assert!(wait_until(Duration::from_secs(10), || runner.count() >= 2).await);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(runner.invocations(), commit_pair(&file, "Cleanup"));

    shutdown.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deferred_mode_commits_once_after_changes_stop() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    let runner = Arc::new(RecordingRunner::default());

    let config = WatchConfig::new(&root)
        .with_mode(CommitMode::Deferred)
        .with_inactivity_threshold(Duration::from_millis(800))
        .with_tick_period(Duration::from_millis(50));
    let (shutdown, task) = start(config, &runner);

    let file = root.join("b.txt");
    for revision in 1..=3 {
        fs::write(&file, format!("revision {revision}")).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(runner.count(), 0, "committed while still changing");
    }

    assert!(wait_until(Duration::from_secs(10), || runner.count() >= 2).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(runner.invocations(), commit_pair(&file, "Cleanup"));

    shutdown.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deleting_root_ends_the_loop() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap().join("watched");
    fs::create_dir_all(root.join("nested")).unwrap();
    let runner = Arc::new(RecordingRunner::default());

    let config = WatchConfig::new(&root).with_poll_timeout(Duration::from_millis(100));
    let (_shutdown, task) = start(config, &runner);

    tokio::time::sleep(Duration::from_millis(100)).await;
    fs::remove_dir_all(&root).unwrap();

    let exit = tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("loop did not terminate")
        .unwrap()
        .unwrap();
    assert_eq!(exit, LoopExit::WatchSetExhausted);
    assert_eq!(runner.count(), 0);
}
