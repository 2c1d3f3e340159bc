/*!
 * Subtitle track extraction from media containers.
 *
 * Tracks are listed with `ffprobe` and each selected text track is written
 * next to the media file with `ffmpeg`, once per requested output format,
 * as `<stem>.<language>.<format>`.
 *
 * Extraction runs inside blocking batch workers, so the external tools are
 * driven through `std::process::Command`.
 */

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::errors::ExtractionError;
use crate::language_utils;
use crate::subtitle::SubtitleFormat;

/// One subtitle stream of a media container
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleTrack {
    /// Absolute stream index inside the container
    pub index: usize,
    pub codec_name: String,
    pub language: Option<String>,
    pub title: Option<String>,
}

impl SubtitleTrack {
    /// Image based tracks cannot be converted without OCR
    pub fn is_bitmap(&self) -> bool {
        matches!(
            self.codec_name.as_str(),
            "hdmv_pgs_subtitle" | "dvd_subtitle" | "dvb_subtitle" | "xsub"
        )
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    index: usize,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    tags: ProbeTags,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Parse `ffprobe -print_format json -show_streams` output
pub fn parse_probe_output(stdout: &str) -> Result<Vec<SubtitleTrack>, ExtractionError> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    let probe: ProbeOutput = serde_json::from_str(stdout)?;
    Ok(probe
        .streams
        .into_iter()
        .map(|s| SubtitleTrack {
            index: s.index,
            codec_name: s.codec_name.unwrap_or_else(|| "unknown".to_string()),
            language: s.tags.language,
            title: s.tags.title,
        })
        .collect())
}

/// Keep only the lines of ffmpeg's stderr that describe the failure
fn filter_ffmpeg_stderr(stderr: &str) -> String {
    const NOISE: &[&str] = &[
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "title",
        "BPS",
        "DURATION",
        "NUMBER_OF",
        "_STATISTICS",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !NOISE.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// Track selection and output options
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub formats: Vec<SubtitleFormat>,
    /// Requested language codes; `all` accepts every language
    pub languages: Vec<String>,
    /// Language assigned to tracks without one; such tracks are skipped when unset
    pub unknown_language_as: Option<String>,
    pub overwrite: bool,
    pub disable_bitmap_extraction: bool,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            formats: vec![SubtitleFormat::Srt],
            languages: vec!["all".to_string()],
            unknown_language_as: None,
            overwrite: false,
            disable_bitmap_extraction: false,
        }
    }
}

/// One ffmpeg invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionJob {
    pub track_index: usize,
    pub format: SubtitleFormat,
    pub output: PathBuf,
}

/// Extracts text subtitle tracks from media files
#[derive(Debug, Clone)]
pub struct SubtitleExtractor {
    options: ExtractorOptions,
}

impl SubtitleExtractor {
    pub fn new(options: ExtractorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    fn accepts_all_languages(&self) -> bool {
        self.options
            .languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case("all"))
    }

    /// Language label used in the output name, or None when the track is not wanted
    fn output_language(&self, track: &SubtitleTrack) -> Option<String> {
        let tag = if language_utils::is_undetermined(track.language.as_deref()) {
            self.options.unknown_language_as.clone()?
        } else {
            track.language.clone()?
        };

        if self.accepts_all_languages() {
            return Some(language_utils::normalize(&tag).unwrap_or_else(|_| tag.to_lowercase()));
        }

        self.options
            .languages
            .iter()
            .find(|wanted| wanted.eq_ignore_ascii_case(&tag) || language_utils::codes_match(wanted, &tag))
            .cloned()
    }

    /// Decide which tracks to extract and where to write them
    pub fn plan(&self, media: &Path, tracks: &[SubtitleTrack]) -> Vec<ExtractionJob> {
        let stem = media
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let dir = media.parent().unwrap_or_else(|| Path::new(""));

        let mut seen_languages = HashSet::new();
        let mut jobs = Vec::new();

        for track in tracks {
            if track.is_bitmap() {
                if !self.options.disable_bitmap_extraction {
                    warn!(
                        "Skipping bitmap track {} ({}) in {:?}: no OCR engine available",
                        track.index, track.codec_name, media
                    );
                }
                continue;
            }

            let Some(language) = self.output_language(track) else {
                debug!("Skipping track {} of {:?}: language {:?} not requested", track.index, media, track.language);
                continue;
            };

            if !seen_languages.insert(language.clone()) {
                debug!("Skipping track {} of {:?}: '{}' already extracted", track.index, media, language);
                continue;
            }

            for format in &self.options.formats {
                let output = dir.join(format!("{}.{}.{}", stem, language, format.extension()));
                if output.exists() && !self.options.overwrite {
                    debug!("Keeping existing {:?}", output);
                    continue;
                }
                jobs.push(ExtractionJob {
                    track_index: track.index,
                    format: *format,
                    output,
                });
            }
        }

        jobs
    }

    /// List subtitle tracks with ffprobe
    pub fn list_tracks(&self, media: &Path) -> Result<Vec<SubtitleTrack>, ExtractionError> {
        if !media.exists() {
            return Err(ExtractionError::MissingFile(media.to_path_buf()));
        }

        let output = Command::new("ffprobe")
            .args(["-v", "quiet", "-print_format", "json", "-show_streams", "-select_streams", "s"])
            .arg(media)
            .output()
            .map_err(|source| ExtractionError::Spawn { tool: "ffprobe", source })?;

        if !output.status.success() {
            return Err(ExtractionError::ToolFailed {
                tool: "ffprobe",
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn run_ffmpeg(&self, media: &Path, job: &ExtractionJob) -> Result<(), ExtractionError> {
        let map = format!("0:{}", job.track_index);
        let output = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(media)
            .args(["-map", map.as_str(), "-c:s", job.format.extension()])
            .arg(&job.output)
            .output()
            .map_err(|source| ExtractionError::Spawn { tool: "ffmpeg", source })?;

        if !output.status.success() {
            return Err(ExtractionError::ToolFailed {
                tool: "ffmpeg",
                message: filter_ffmpeg_stderr(&String::from_utf8_lossy(&output.stderr)),
            });
        }
        Ok(())
    }

    /// Extract every wanted track of one media file, returning the written paths
    pub fn extract(&self, media: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        let tracks = self.list_tracks(media)?;
        let jobs = self.plan(media, &tracks);

        let mut written = Vec::with_capacity(jobs.len());
        for job in &jobs {
            self.run_ffmpeg(media, job)?;
            written.push(job.output.clone());
        }

        if !written.is_empty() {
            info!("Extracted {} subtitle file(s) from {:?}", written.len(), media);
        }
        Ok(written)
    }
}
