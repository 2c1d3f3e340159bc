use anyhow::{anyhow, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::language_utils;
use crate::subtitle::SubtitleFormat;

/// Application configuration module
/// Settings for one subsieve run, built from the command line.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Media file, subtitle file or directory to process
    pub path: PathBuf,

    /// Output subtitle formats
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,

    /// Language codes to extract or post-process; `all` accepts every language
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Language assigned to tracks without one
    #[serde(default)]
    pub unknown_language_as: Option<String>,

    /// Replace subtitle files that already exist
    #[serde(default)]
    pub overwrite: bool,

    /// Do not report bitmap tracks that cannot be extracted
    #[serde(default)]
    pub disable_bitmap_extraction: bool,

    /// Skip extraction and post-process existing subtitle files
    #[serde(default)]
    pub postprocess_only: bool,

    /// Post-processing pipeline file
    #[serde(default)]
    pub postprocessing: Option<PathBuf>,

    /// Minutes between scans; 0 runs a single pass
    #[serde(default)]
    pub scan_interval: u64,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Also write log lines to this file
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub disable_progress_bar: bool,

    /// Exclusion file for media paths
    #[serde(default)]
    pub exclude_videos: Option<PathBuf>,

    /// Exclusion file for subtitle paths
    #[serde(default)]
    pub exclude_subtitles: Option<PathBuf>,

    #[serde(default)]
    pub exclude_mode: ExcludeMode,

    /// Number of files processed at once
    #[serde(default = "default_threads")]
    pub threads: usize,
}

/// Subtitle output format
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Srt,
    Ass,
    Ssa,
}

impl From<OutputFormat> for SubtitleFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Srt => SubtitleFormat::Srt,
            OutputFormat::Ass => SubtitleFormat::Ass,
            OutputFormat::Ssa => SubtitleFormat::Ssa,
        }
    }
}

/// How exclusion files are used
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExcludeMode {
    /// Read the exclusion files only
    #[default]
    #[serde(rename = "e")]
    Exclude,
    /// Read them, then append the paths processed by each pass
    #[serde(rename = "e+a")]
    ExcludeAndAppend,
}

impl ExcludeMode {
    pub fn appends(&self) -> bool {
        matches!(self, Self::ExcludeAndAppend)
    }
}

impl fmt::Display for ExcludeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exclude => write!(f, "e"),
            Self::ExcludeAndAppend => write!(f, "e+a"),
        }
    }
}

impl FromStr for ExcludeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "e" => Ok(Self::Exclude),
            "e+a" => Ok(Self::ExcludeAndAppend),
            _ => Err(anyhow!("Invalid exclude mode: {} (expected 'e' or 'e+a')", s)),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Srt]
}

fn default_languages() -> Vec<String> {
    vec!["all".to_string()]
}

fn default_threads() -> usize {
    4
}

impl Config {
    /// Configuration for `path` with every option at its default
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn subtitle_formats(&self) -> Vec<SubtitleFormat> {
        self.formats.iter().map(|f| (*f).into()).collect()
    }

    pub fn all_languages(&self) -> bool {
        self.languages.iter().any(|l| l.eq_ignore_ascii_case("all"))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !self.path.exists() {
            return Err(anyhow!("Path does not exist: {:?}", self.path));
        }

        if self.formats.is_empty() {
            return Err(anyhow!("At least one output format is required"));
        }

        if self.languages.is_empty() {
            return Err(anyhow!("At least one language (or 'all') is required"));
        }

        if self.threads == 0 {
            return Err(anyhow!("Thread count must be at least 1"));
        }

        if self.postprocess_only && self.postprocessing.is_none() {
            return Err(anyhow!("--postprocess_only requires a --postprocessing configuration"));
        }

        if let Some(pipeline) = &self.postprocessing {
            if !pipeline.is_file() {
                return Err(anyhow!("Post-processing configuration not found: {:?}", pipeline));
            }
        }

        if !self.all_languages() {
            for code in self.languages.iter().filter(|c| !language_utils::is_valid_code(c)) {
                warn!("'{}' is not a known ISO 639 language code, matching it literally", code);
            }
        }

        if let Some(code) = &self.unknown_language_as {
            if !language_utils::is_valid_code(code) {
                warn!("--unknown_language_as '{}' is not a known ISO 639 language code", code);
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            path: PathBuf::from("."),
            formats: default_formats(),
            languages: default_languages(),
            unknown_language_as: None,
            overwrite: false,
            disable_bitmap_extraction: false,
            postprocess_only: false,
            postprocessing: None,
            scan_interval: 0,
            log_level: LogLevel::default(),
            log_file: None,
            disable_progress_bar: false,
            exclude_videos: None,
            exclude_subtitles: None,
            exclude_mode: ExcludeMode::default(),
            threads: default_threads(),
        }
    }
}
