/*!
 * Tests for the per-file batch runner
 */

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use subsieve::batch::{self, BatchRunner};

fn paths(k: usize) -> Vec<PathBuf> {
    (0..k).map(|i| PathBuf::from(format!("/corpus/file_{:03}.srt", i))).collect()
}

/// Test that every path is processed exactly once for any concurrency
#[tokio::test]
async fn test_run_withVariousConcurrency_shouldReturnEachPathOnce() -> Result<()> {
    let k = 12;
    for n in [1, 3, k] {
        let runner = BatchRunner::new(n, false);

        let results = runner
            .run("collect", paths(k), |path| Ok(path.to_path_buf()))
            .await?;

        assert_eq!(results.len(), k, "concurrency {}", n);
        let unique: HashSet<_> = results.iter().cloned().collect();
        let expected: HashSet<_> = paths(k).into_iter().collect();
        assert_eq!(unique, expected, "concurrency {}", n);
    }
    Ok(())
}

/// Test that no more than the configured number of workers run at once
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_withTwoThreads_shouldBoundInFlightWorkers() -> Result<()> {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let runner = BatchRunner::new(2, false);

    let (running_w, peak_w) = (Arc::clone(&running), Arc::clone(&peak));
    let results = runner
        .run("bounded", paths(8), move |_| {
            let now = running_w.fetch_add(1, Ordering::SeqCst) + 1;
            peak_w.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            running_w.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
        .await?;

    assert_eq!(results.len(), 8);
    assert!(peak.load(Ordering::SeqCst) <= 2);
    Ok(())
}

/// Test that a failure aborts the batch and names the failing path
#[tokio::test]
async fn test_run_withFailingWorker_shouldSkipRemainingPaths() {
    let calls = Arc::new(AtomicUsize::new(0));
    let runner = BatchRunner::new(1, false);

    let counter = Arc::clone(&calls);
    let result = runner
        .run("failing", paths(10), move |path| {
            counter.fetch_add(1, Ordering::SeqCst);
            if path.ends_with("file_002.srt") {
                Err(anyhow!("broken subtitle"))
            } else {
                Ok(())
            }
        })
        .await;

    let err = result.err().expect("batch should fail");
    let message = format!("{:#}", err);
    assert!(message.contains("file_002.srt"), "{}", message);
    assert!(message.contains("broken subtitle"), "{}", message);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

/// Test that per-file path lists are flattened
#[tokio::test]
async fn test_run_flat_withSeveralOutputsPerFile_shouldFlatten() -> Result<()> {
    let runner = BatchRunner::new(2, false);

    let outputs = batch::run_flat(&runner, "extract", paths(3), |path| {
        Ok(vec![path.with_extension("en.srt"), path.with_extension("fr.srt")])
    })
    .await?;

    assert_eq!(outputs.len(), 6);
    Ok(())
}

/// Test that an empty input yields an empty result
#[tokio::test]
async fn test_run_withNoPaths_shouldReturnEmpty() -> Result<()> {
    let runner = BatchRunner::new(4, true);
    let results: Vec<()> = runner.run("empty", Vec::new(), |_| Ok(())).await?;
    assert!(results.is_empty());
    Ok(())
}
