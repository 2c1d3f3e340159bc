/*!
 * Corpus scanning and exclusion lists.
 *
 * A scan turns a root path into the list of files to process: a file root is
 * taken as-is, a directory is walked recursively and filtered by a path
 * pattern and an exclusion set of previously processed paths.
 */

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use regex::Regex;
use walkdir::WalkDir;

use crate::subtitle::SubtitleFormat;

// @const: Media containers probed for subtitle tracks
const MEDIA_EXTENSIONS: &[&str] = &["mkv", "mp4", "webm", "ts", "ogg"];

fn alternation<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| regex::escape(t.as_ref()))
        .collect::<Vec<_>>()
        .join("|")
}

/// Pattern matching `<name>.<language>.<format>` subtitle files
///
/// When the languages contain `all` only the format suffix is checked.
pub fn subtitle_pattern(languages: &[String], formats: &[SubtitleFormat]) -> Result<Regex> {
    let formats: Vec<&str> = formats.iter().map(|f| f.extension()).collect();
    let pattern = if languages.iter().any(|l| l.eq_ignore_ascii_case("all")) {
        format!(r"(?i)\.({})$", alternation(&formats))
    } else {
        format!(r"(?i)\.({})\.({})$", alternation(languages), alternation(&formats))
    };
    Regex::new(&pattern).with_context(|| format!("Invalid subtitle pattern: {}", pattern))
}

/// Pattern matching supported media containers
pub fn media_pattern() -> Result<Regex> {
    let pattern = format!(r"(?i)\.({})$", alternation(MEDIA_EXTENSIONS));
    Regex::new(&pattern).with_context(|| format!("Invalid media pattern: {}", pattern))
}

// @struct: Previously processed paths
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionList {
    paths: HashSet<String>,
}

impl ExclusionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one path per line; a missing file is an empty list
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Exclusion file {:?} does not exist yet", path);
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read exclusion file: {:?}", path))?;

        let paths = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self { paths })
    }

    /// Append paths to the exclusion file, one per line
    pub fn append<P: AsRef<Path>>(path: P, processed: &[PathBuf]) -> Result<()> {
        let path = path.as_ref();
        if processed.is_empty() {
            return Ok(());
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open exclusion file: {:?}", path))?;

        for entry in processed {
            writeln!(file, "{}", entry.display())
                .with_context(|| format!("Failed to write exclusion file: {:?}", path))?;
        }

        debug!("Appended {} paths to {:?}", processed.len(), path);
        Ok(())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path.to_string_lossy().as_ref())
    }

    pub fn insert(&mut self, path: &Path) {
        self.paths.insert(path.to_string_lossy().to_string());
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Finds candidate files under a root path
pub struct CorpusScanner;

impl CorpusScanner {
    /// Files under `root` matching `pattern` that are not excluded, each listed once
    pub fn scan<P: AsRef<Path>>(root: P, pattern: &Regex, exclusions: &ExclusionList) -> Result<Vec<PathBuf>> {
        let root = root.as_ref();

        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let mut found = Vec::new();
        let mut seen = HashSet::new();
        let mut excluded = 0usize;

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.with_context(|| format!("Failed to read directory entry under {:?}", root))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !pattern.is_match(&path.to_string_lossy()) {
                continue;
            }

            if exclusions.contains(path) {
                excluded += 1;
                continue;
            }

            if seen.insert(path.to_path_buf()) {
                found.push(path.to_path_buf());
            }
        }

        info!("Found {} files in {:?} ({} excluded)", found.len(), root, excluded);
        Ok(found)
    }
}
