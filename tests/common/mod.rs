/*!
 * Common test utilities for the subsieve test suite
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::Value;
use subsieve::actions::Params;
use tempfile::TempDir;

/// Route library logs to the test output, honouring `RUST_LOG`
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Parameter map from a JSON object literal
pub fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

/// ASS script with a `Main` style used by three events and a `Sign` style used by one
pub const SAMPLE_ASS: &str = r#"[Script Info]
Title: Sample
ScriptType: v4.00+
PlayResX: 1920
PlayResY: 1080

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Main,Arial,60,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,2,2,30,30,60,1
Style: Sign,Arial,48,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,-1,0,0,0,100,100,0,0,1,2,2,8,15,15,45,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:01.00,0:00:03.00,Main,,0,0,0,,foo bar foo
Dialogue: 0,0:00:04.00,0:00:06.00,Main,,0,0,0,,Second line
Dialogue: 0,0:00:07.00,0:00:09.00,Sign,,0,0,0,,{\pos(960,540)}foo sign
Dialogue: 0,0:00:10.00,0:00:12.00,Main,,0,0,0,,Last, with commas
"#;

/// Three-cue SRT file
pub const SAMPLE_SRT: &str = r#"1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains <i>multiple</i>
entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
"#;
