/*!
 * Error types for the subsieve application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the action library while selecting, filtering or acting
#[derive(Error, Debug)]
pub enum ActionError {
    /// A scaling operation received a zero reference dimension
    #[error("Division by zero: parameter '{parameter}' must not be zero")]
    DivisionByZero {
        /// Name of the offending parameter
        parameter: String,
    },

    /// A regular expression in a step could not be compiled
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A required parameter was not supplied
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// A parameter was supplied with an unusable value
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// An override tag in event text could not be interpreted
    #[error("Malformed override tag: {0}")]
    MalformedTag(String),

    /// The candidate no longer exists in the document
    #[error("Candidate not found in document: {0}")]
    UnknownCandidate(String),
}

/// Errors raised while loading or running a post-processing pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Step names a target domain that does not exist
    #[error("Unknown target '{0}' (expected info, styles, events or misc)")]
    UnknownTarget(String),

    /// Step names a select function unknown for its target
    #[error("Unknown select '{name}' for target '{target}'")]
    UnknownSelect { target: String, name: String },

    /// Step names a filter function unknown for its target
    #[error("Unknown filter '{name}' for target '{target}'")]
    UnknownFilter { target: String, name: String },

    /// Step names an action unknown for its target
    #[error("Unknown action '{name}' for target '{target}'")]
    UnknownAction { target: String, name: String },

    /// The configuration file itself is unusable
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// A step failed while being applied to a document
    #[error("Step {step} ({target}.{action}) failed: {source}")]
    Step {
        step: usize,
        target: String,
        action: String,
        #[source]
        source: ActionError,
    },

    /// Reading or writing the document failed
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),
}

/// Errors that can occur while parsing or writing subtitle documents
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The file extension does not map to a supported format
    #[error("Unsupported subtitle format: {0:?}")]
    UnsupportedFormat(PathBuf),

    /// The content could not be parsed
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Underlying I/O failure
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while extracting subtitle tracks from media files
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The media file does not exist
    #[error("Media file not found: {0:?}")]
    MissingFile(PathBuf),

    /// A media tool could not be started
    #[error("Failed to execute {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A media tool exited with a failure status
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: &'static str, message: String },

    /// ffprobe output could not be understood
    #[error("Failed to parse ffprobe output: {0}")]
    Probe(#[from] serde_json::Error),
}
