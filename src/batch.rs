/*!
 * Bounded-concurrency batch driver.
 *
 * Runs a per-file worker over a list of paths with at most `threads`
 * invocations in flight. Workers are synchronous and run on tokio's blocking
 * pool. The first failure aborts the batch: paths not yet started are
 * skipped, running ones finish, then the error is returned.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Context, Result, anyhow};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};

/// Per-file batch runner
#[derive(Debug, Clone)]
pub struct BatchRunner {
    threads: usize,
    show_progress: bool,
}

impl BatchRunner {
    /// A runner with `threads` workers (at least one)
    pub fn new(threads: usize, show_progress: bool) -> Self {
        Self {
            threads: threads.max(1),
            show_progress,
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    fn progress_bar(&self, label: &str, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style.progress_chars("█▓▒░"));
        pb.set_message(label.to_string());
        pb
    }

    /// Run `worker` once per path and collect the results in completion order
    pub async fn run<T, F>(&self, label: &str, paths: Vec<PathBuf>, worker: F) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(&Path) -> Result<T> + Send + Sync + 'static,
    {
        let total = paths.len();
        let pb = self.progress_bar(label, total);
        let worker = Arc::new(worker);
        let aborted = Arc::new(AtomicBool::new(false));
        let skipped = Arc::new(AtomicUsize::new(0));

        debug!("{}: {} files on {} threads", label, total, self.threads);

        let outcomes = stream::iter(paths)
            .map(|path| {
                let worker = Arc::clone(&worker);
                let aborted = Arc::clone(&aborted);
                let skipped = Arc::clone(&skipped);
                let pb = pb.clone();

                async move {
                    if aborted.load(Ordering::SeqCst) {
                        skipped.fetch_add(1, Ordering::SeqCst);
                        return None;
                    }

                    let task_path = path.clone();
                    let joined = tokio::task::spawn_blocking(move || (*worker)(&task_path)).await;
                    pb.inc(1);

                    let result = match joined {
                        Ok(result) => result,
                        Err(e) => Err(anyhow!("Worker panicked: {}", e)),
                    };

                    if result.is_err() {
                        aborted.store(true, Ordering::SeqCst);
                    }
                    Some((path, result))
                }
            })
            .buffer_unordered(self.threads)
            .collect::<Vec<_>>()
            .await;

        pb.finish_and_clear();

        let mut results = Vec::with_capacity(total);
        let mut first_error = None;

        for (path, result) in outcomes.into_iter().flatten() {
            match result {
                Ok(value) => results.push(value),
                Err(e) => {
                    error!("{} failed for {:?}: {}", label, path, e);
                    if first_error.is_none() {
                        first_error = Some(e.context(format!("{} failed for {:?}", label, path)));
                    }
                }
            }
        }

        if let Some(e) = first_error {
            let skipped = skipped.load(Ordering::SeqCst);
            if skipped > 0 {
                info!("{}: {} files not started after the failure", label, skipped);
            }
            return Err(e);
        }

        info!("{}: {} of {} files done", label, results.len(), total);
        Ok(results)
    }
}

/// Run `worker` over `paths` and flatten the per-file path lists
pub async fn run_flat<F>(runner: &BatchRunner, label: &str, paths: Vec<PathBuf>, worker: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> Result<Vec<PathBuf>> + Send + Sync + 'static,
{
    let nested = runner
        .run(label, paths, worker)
        .await
        .with_context(|| format!("{} batch aborted", label))?;
    Ok(nested.into_iter().flatten().collect())
}
