use anyhow::{Context, Result, anyhow};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::batch::{self, BatchRunner};
use crate::extractor::{ExtractorOptions, SubtitleExtractor};
use crate::pipeline::SubtitleFormatter;
use crate::scanner::{self, CorpusScanner, ExclusionList};

// @module: Application controller for extraction and post-processing passes

/// Per-media-file extraction step, returning the subtitle files it wrote
pub type ExtractFn = Arc<dyn Fn(&Path) -> Result<Vec<PathBuf>> + Send + Sync>;

/// What a single pass did
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PassSummary {
    /// Files picked up by the scan
    pub scanned: Vec<PathBuf>,
    /// Subtitle files written by extraction
    pub extracted: Vec<PathBuf>,
    /// Subtitle files rewritten by the pipeline
    pub postprocessed: Vec<PathBuf>,
}

/// What an interrupt (Ctrl-C) does to a running controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Let the current pass finish, then stop instead of waiting for the next scan
    FinishPass,
    /// Stop the process now
    Exit,
}

impl InterruptAction {
    /// Exit code used when the process stops on an interrupt
    pub const EXIT_CODE: i32 = 130;

    /// Decide on the `received`-th interrupt (1-based).
    ///
    /// A single pass has nothing to wait for, so the first interrupt exits.
    /// Periodic runs stop gracefully on the first one and exit on any later one.
    pub fn after(received: usize, scan_interval: u64) -> Self {
        if scan_interval == 0 || received > 1 {
            Self::Exit
        } else {
            Self::FinishPass
        }
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    formatter: Option<Arc<SubtitleFormatter>>,
    extract: ExtractFn,
    runner: BatchRunner,
}

impl Controller {
    // @method: Create a controller extracting with ffprobe/ffmpeg
    pub fn with_config(config: Config) -> Result<Self> {
        let extractor = SubtitleExtractor::new(ExtractorOptions {
            formats: config.subtitle_formats(),
            languages: config.languages.clone(),
            unknown_language_as: config.unknown_language_as.clone(),
            overwrite: config.overwrite,
            disable_bitmap_extraction: config.disable_bitmap_extraction,
        });

        Self::with_extractor(config, move |path: &Path| Ok(extractor.extract(path)?))
    }

    // @method: Create a controller around any extraction step, resolving the pipeline before any file is touched
    pub fn with_extractor<F>(config: Config, extract: F) -> Result<Self>
    where
        F: Fn(&Path) -> Result<Vec<PathBuf>> + Send + Sync + 'static,
    {
        let formatter = match &config.postprocessing {
            Some(path) => {
                let formatter = SubtitleFormatter::from_file(path)
                    .with_context(|| format!("Failed to load post-processing configuration {:?}", path))?;
                info!("Loaded post-processing pipeline with {} steps", formatter.step_count());
                Some(Arc::new(formatter))
            }
            None => None,
        };

        let runner = BatchRunner::new(config.threads, !config.disable_progress_bar);

        Ok(Self {
            config,
            formatter,
            extract: Arc::new(extract),
            runner,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn load_exclusions(file: Option<&Path>) -> Result<ExclusionList> {
        match file {
            Some(path) => ExclusionList::load(path),
            None => Ok(ExclusionList::new()),
        }
    }

    fn record_processed(&self, file: Option<&Path>, processed: &[PathBuf]) -> Result<()> {
        if !self.config.exclude_mode.appends() {
            return Ok(());
        }
        match file {
            Some(path) => ExclusionList::append(path, processed),
            None => Ok(()),
        }
    }

    async fn postprocess(&self, paths: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
        let formatter = self
            .formatter
            .clone()
            .ok_or_else(|| anyhow!("No post-processing configuration loaded"))?;

        batch::run_flat(&self.runner, "Post-processing", paths, move |path| {
            Ok(formatter.format(path)?)
        })
        .await
    }

    /// One scan → process → record cycle
    pub async fn run_pass(&self) -> Result<PassSummary> {
        let mut summary = PassSummary::default();

        if self.config.postprocess_only {
            let exclude_file = self.config.exclude_subtitles.as_deref();
            let exclusions = Self::load_exclusions(exclude_file)?;
            let pattern = scanner::subtitle_pattern(&self.config.languages, &self.config.subtitle_formats())?;

            summary.scanned = CorpusScanner::scan(&self.config.path, &pattern, &exclusions)?;
            if summary.scanned.is_empty() {
                info!("No subtitle files to post-process");
                return Ok(summary);
            }

            summary.postprocessed = self.postprocess(summary.scanned.clone()).await?;
            self.record_processed(exclude_file, &summary.postprocessed)?;
            return Ok(summary);
        }

        let exclude_file = self.config.exclude_videos.as_deref();
        let exclusions = Self::load_exclusions(exclude_file)?;
        let pattern = scanner::media_pattern()?;

        summary.scanned = CorpusScanner::scan(&self.config.path, &pattern, &exclusions)?;
        if summary.scanned.is_empty() {
            info!("No media files to extract from");
            return Ok(summary);
        }

        let extract = Arc::clone(&self.extract);
        summary.extracted =
            batch::run_flat(&self.runner, "Extraction", summary.scanned.clone(), move |path| (*extract)(path)).await?;

        if self.formatter.is_some() && !summary.extracted.is_empty() {
            summary.postprocessed = self.postprocess(summary.extracted.clone()).await?;
        }

        self.record_processed(exclude_file, &summary.scanned)?;
        Ok(summary)
    }

    /// Run passes until done: once without an interval, otherwise until cancelled
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let interval = self.config.scan_interval;

        loop {
            match self.run_pass().await {
                Ok(summary) => info!(
                    "Pass finished: {} scanned, {} extracted, {} post-processed",
                    summary.scanned.len(),
                    summary.extracted.len(),
                    summary.postprocessed.len()
                ),
                Err(e) if interval == 0 => return Err(e),
                Err(e) => error!("Pass failed: {:#}", e),
            }

            if interval == 0 {
                return Ok(());
            }

            let next = chrono::Local::now() + chrono::Duration::minutes(interval as i64);
            info!("Next scan at {}", next.format("%Y-%m-%d %H:%M:%S"));

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(interval * 60)) => {}
                _ = cancel.cancelled() => {
                    warn!("Stopping before the next scan");
                    return Ok(());
                }
            }
        }
    }
}
