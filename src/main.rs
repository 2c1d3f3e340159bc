// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use subsieve::app_config::{self, Config, ExcludeMode, OutputFormat};
use subsieve::app_controller::{Controller, InterruptAction};

/// CLI Wrapper for OutputFormat to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    Srt,
    Ass,
    Ssa,
}

impl From<CliFormat> for OutputFormat {
    fn from(cli_format: CliFormat) -> Self {
        match cli_format {
            CliFormat::Srt => OutputFormat::Srt,
            CliFormat::Ass => OutputFormat::Ass,
            CliFormat::Ssa => OutputFormat::Ssa,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for ExcludeMode to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliExcludeMode {
    #[value(name = "e")]
    Exclude,
    #[value(name = "e+a")]
    ExcludeAndAppend,
}

impl From<CliExcludeMode> for ExcludeMode {
    fn from(cli_mode: CliExcludeMode) -> Self {
        match cli_mode {
            CliExcludeMode::Exclude => ExcludeMode::Exclude,
            CliExcludeMode::ExcludeAndAppend => ExcludeMode::ExcludeAndAppend,
        }
    }
}

/// subsieve - subtitle extraction and post-processing
///
/// Scans a media library, extracts text subtitle tracks next to each media
/// file and reworks the resulting subtitles with a configurable pipeline.
#[derive(Parser, Debug)]
#[command(name = "subsieve")]
#[command(version)]
#[command(about = "Extract and post-process subtitles of a media library")]
#[command(long_about = "subsieve extracts text subtitle tracks from media files and post-processes subtitle files.

EXAMPLES:
    subsieve /movies                                        # Extract every language as SRT
    subsieve --languages en fr --formats srt ass /movies    # English and French, SRT and ASS
    subsieve --postprocessing steps.json /movies            # Extract, then post-process
    subsieve --postprocess_only --postprocessing steps.json --languages en /movies
    subsieve --scan_interval 30 --exclude_videos seen.txt --exclude_mode e+a /movies")]
struct CommandLineOptions {
    /// Media file, subtitle file or directory to process
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Output subtitle formats
    #[arg(long, value_enum, num_args = 1.., default_values_t = [CliFormat::Srt])]
    formats: Vec<CliFormat>,

    /// Languages to extract, 'all' for every language
    #[arg(long, num_args = 1.., default_values_t = [String::from("all")])]
    languages: Vec<String>,

    /// Language assigned to tracks without one
    #[arg(long = "unknown_language_as")]
    unknown_language_as: Option<String>,

    /// Overwrite existing subtitle files
    #[arg(long)]
    overwrite: bool,

    /// Do not report image based subtitle tracks
    #[arg(long = "disable_bitmap_extraction")]
    disable_bitmap_extraction: bool,

    /// Only post-process existing subtitle files
    #[arg(long = "postprocess_only")]
    postprocess_only: bool,

    /// Post-processing pipeline file (JSON)
    #[arg(long, value_name = "FILE")]
    postprocessing: Option<PathBuf>,

    /// Minutes between scans, 0 for a single pass
    #[arg(long = "scan_interval", default_value_t = 0)]
    scan_interval: u64,

    /// Set logging level
    #[arg(long = "log_level", value_enum, default_value_t = CliLogLevel::Info)]
    log_level: CliLogLevel,

    /// Also write log lines to this file
    #[arg(long = "log_file", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Hide progress bars
    #[arg(long = "disable_progress_bar")]
    disable_progress_bar: bool,

    /// Exclusion file for media paths
    #[arg(long = "exclude_videos", value_name = "FILE")]
    exclude_videos: Option<PathBuf>,

    /// Exclusion file for subtitle paths
    #[arg(long = "exclude_subtitles", value_name = "FILE")]
    exclude_subtitles: Option<PathBuf>,

    /// 'e' reads exclusion files, 'e+a' also appends processed paths
    #[arg(long = "exclude_mode", value_enum, default_value_t = CliExcludeMode::Exclude)]
    exclude_mode: CliExcludeMode,

    /// Number of files processed at once
    #[arg(long, default_value_t = 4)]
    threads: usize,
}

impl From<CommandLineOptions> for Config {
    fn from(cli: CommandLineOptions) -> Self {
        Config {
            path: cli.path,
            formats: cli.formats.into_iter().map(Into::into).collect(),
            languages: cli.languages,
            unknown_language_as: cli.unknown_language_as,
            overwrite: cli.overwrite,
            disable_bitmap_extraction: cli.disable_bitmap_extraction,
            postprocess_only: cli.postprocess_only,
            postprocessing: cli.postprocessing,
            scan_interval: cli.scan_interval,
            log_level: cli.log_level.into(),
            log_file: cli.log_file,
            disable_progress_bar: cli.disable_progress_bar,
            exclude_videos: cli.exclude_videos,
            exclude_subtitles: cli.exclude_subtitles,
            exclude_mode: cli.exclude_mode.into(),
            threads: cli.threads,
        }
    }
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl CustomLogger {
    // @initializes: Global logger, optionally teeing plain lines to a file
    fn init(level: LevelFilter, log_file: Option<&PathBuf>) -> Result<()> {
        let file = match log_file {
            Some(path) => Some(Mutex::new(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file: {:?}", path))?,
            )),
            None => None,
        };

        log::set_boxed_logger(Box::new(CustomLogger { level, file }))
            .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now();
        let emoji = Self::get_emoji_for_level(record.level());
        let color = Self::get_color_for_level(record.level());

        let _ = writeln!(
            std::io::stderr(),
            "{}{} {} {}\x1B[0m",
            color,
            now.format("%H:%M:%S.%3f"),
            emoji,
            record.args()
        );

        if let Some(file) = &self.file {
            let _ = writeln!(
                file.lock(),
                "{} {:<5} {}",
                now.format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
        if let Some(file) = &self.file {
            let _ = file.lock().flush();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CommandLineOptions::parse();
    let config: Config = cli.into();

    CustomLogger::init(config.log_level.to_level_filter(), config.log_file.as_ref())?;

    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    let scan_interval = controller.config().scan_interval;
    tokio::spawn(async move {
        let mut received = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            received += 1;
            match InterruptAction::after(received, scan_interval) {
                InterruptAction::FinishPass => {
                    info!("Interrupt received, finishing the current pass (press Ctrl-C again to stop now)");
                    signal_token.cancel();
                }
                InterruptAction::Exit => {
                    warn!("Interrupted");
                    log::logger().flush();
                    std::process::exit(InterruptAction::EXIT_CODE);
                }
            }
        }
    });

    if let Err(e) = controller.run(cancel).await {
        error!("{:#}", e);
        return Err(e);
    }

    Ok(())
}
