use std::fmt::Write;

use log::warn;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::errors::SubtitleError;
use super::document::{Document, Event, SubtitleFormat};

// @module: SubRip reading and writing

// @const: SRT timing line regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+):(\d{2}):(\d{2})[,.](\d{1,3})\s*-->\s*(\d+):(\d{2}):(\d{2})[,.](\d{1,3})").unwrap()
});

// @const: Basic HTML formatting tags
static HTML_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(/?)([ibu])>").unwrap()
});

// @const: Override block
static OVERRIDE_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([^}]*)\}").unwrap()
});

// @const: Formatting tags inside an override block that SRT can express
static FORMAT_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\([ibu])([01])").unwrap()
});

/// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
pub fn format_timestamp(ms: i64) -> String {
    let ms = ms.max(0);
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

fn parse_timestamp_to_ms(caps: &Captures, start_idx: usize) -> i64 {
    let field = |i: usize| -> i64 {
        caps.get(start_idx + i)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0))
    };
    // "5" after the comma means 500ms, not 5ms
    let millis = caps.get(start_idx + 3).map_or(0, |m| {
        let digits = m.as_str();
        let value: i64 = digits.parse().unwrap_or(0);
        value * 10_i64.pow(3 - digits.len() as u32)
    });
    (field(0) * 3600 + field(1) * 60 + field(2)) * 1000 + millis
}

/// SRT cue text to ASS text: newlines become `\N`, `<i>` becomes `{\i1}`
fn to_ass_text(text: &str) -> String {
    let text = HTML_TAG_REGEX.replace_all(text, |caps: &Captures| {
        let on = if caps[1].is_empty() { "1" } else { "0" };
        format!("{{\\{}{}}}", caps[2].to_lowercase(), on)
    });
    text.replace('\n', "\\N")
}

/// ASS text to SRT cue text, keeping only italic/bold/underline
fn to_srt_text(text: &str) -> String {
    let text = OVERRIDE_BLOCK_REGEX.replace_all(text, |caps: &Captures| {
        FORMAT_TAG_REGEX
            .captures_iter(&caps[1])
            .map(|tag| {
                let close = if &tag[2] == "0" { "/" } else { "" };
                format!("<{}{}>", close, &tag[1])
            })
            .collect::<String>()
    });
    text.replace("\\N", "\n").replace("\\n", "\n").replace("\\h", " ")
}

/// Parse SRT content into a document carrying the default header and style
pub fn parse(content: &str) -> Result<Document, SubtitleError> {
    let mut doc = Document::with_defaults(SubtitleFormat::Srt);

    let mut current_times: Option<(i64, i64)> = None;
    let mut current_text = String::new();
    let mut expecting_index = true;

    let flush = |times: &mut Option<(i64, i64)>, text: &mut String, doc: &mut Document| {
        if let Some((start, end)) = times.take() {
            doc.push_event(Event::new(start, end, to_ass_text(text.trim_end())));
        }
        text.clear();
    };

    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if current_times.is_some() {
                flush(&mut current_times, &mut current_text, &mut doc);
            }
            expecting_index = true;
            continue;
        }

        if current_times.is_none() {
            if expecting_index && trimmed.parse::<usize>().is_ok() {
                expecting_index = false;
                continue;
            }
            if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                current_times = Some((parse_timestamp_to_ms(&caps, 1), parse_timestamp_to_ms(&caps, 5)));
                continue;
            }
            warn!("Unexpected text at line {} before a timestamp: {}", idx + 1, trimmed);
            continue;
        }

        if !current_text.is_empty() {
            current_text.push('\n');
        }
        current_text.push_str(line);
    }

    flush(&mut current_times, &mut current_text, &mut doc);

    if doc.event_count() == 0 && !content.trim().is_empty() {
        return Err(SubtitleError::Parse {
            line: 1,
            message: "no valid subtitle entries found".to_string(),
        });
    }

    Ok(doc)
}

/// Serialize visible events as SRT, renumbered from 1
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    let visible = doc
        .events()
        .map(|(_, e)| e)
        .filter(|e| !e.is_comment() && !e.is_drawing());

    for (i, event) in visible.enumerate() {
        let _ = writeln!(out, "{}", i + 1);
        let _ = writeln!(out, "{} --> {}", format_timestamp(event.start), format_timestamp(event.end));
        let _ = writeln!(out, "{}", to_srt_text(&event.text));
        out.push('\n');
    }

    out
}
