/*!
 * SubStation Alpha (ASS / SSA) reading and writing.
 *
 * Columns are mapped through each section's `Format:` line, so files with
 * reordered or legacy columns load into the same `Document` model.
 */

use std::fmt::Write;

use log::{debug, warn};

use crate::errors::SubtitleError;
use super::document::{Document, Event, EventKind, Style, SubtitleFormat};

const ASS_STYLE_FORMAT: &str = "Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const SSA_STYLE_FORMAT: &str = "Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, TertiaryColour, BackColour, Bold, Italic, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, AlphaLevel, Encoding";
const ASS_EVENT_FORMAT: &str = "Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";
const SSA_EVENT_FORMAT: &str = "Marked, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    Info,
    Styles,
    Events,
    Other(usize),
}

fn parse_format(line: &str) -> Vec<String> {
    line.split(',').map(|c| c.trim().to_lowercase()).collect()
}

/// Split a `Key: a, b, c` body into exactly `columns` fields; the last one keeps its commas
fn split_fields(body: &str, columns: usize) -> Vec<&str> {
    body.splitn(columns.max(1), ',').collect()
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "-1" | "1")
}

fn parse_num<T: std::str::FromStr>(value: &str, line: usize, column: &str) -> Result<T, SubtitleError> {
    value.trim().parse().map_err(|_| SubtitleError::Parse {
        line,
        message: format!("invalid {} value '{}'", column, value.trim()),
    })
}

/// Parse `H:MM:SS.cc` into milliseconds
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let mut parts = value.trim().splitn(3, ':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let rest = parts.next()?;
    let (secs, frac) = rest.split_once('.').unwrap_or((rest, "0"));
    let seconds: i64 = secs.parse().ok()?;
    let frac_ms = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 100,
        2 => frac.parse::<i64>().ok()? * 10,
        _ => frac.get(..3)?.parse::<i64>().ok()?,
    };
    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + frac_ms)
}

/// Format milliseconds as `H:MM:SS.cc`
pub fn format_timestamp(ms: i64) -> String {
    let cs = (ms.max(0) + 5) / 10;
    let hours = cs / 360_000;
    let minutes = (cs % 360_000) / 6_000;
    let seconds = (cs % 6_000) / 100;
    let centis = cs % 100;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}

/// Render a number the way ASS files carry it: integers without a fraction
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn format_bool(value: bool) -> &'static str {
    if value { "-1" } else { "0" }
}

fn parse_style(columns: &[String], body: &str, line: usize) -> Result<Style, SubtitleError> {
    let mut style = Style::default();
    for (column, value) in columns.iter().zip(split_fields(body, columns.len())) {
        let raw = value.trim();
        match column.as_str() {
            "name" => style.name = raw.to_string(),
            "fontname" => style.fontname = raw.to_string(),
            "fontsize" => style.fontsize = parse_num(raw, line, column)?,
            "primarycolour" => style.primary_color = raw.to_string(),
            "secondarycolour" => style.secondary_color = raw.to_string(),
            "outlinecolour" | "tertiarycolour" => style.outline_color = raw.to_string(),
            "backcolour" => style.back_color = raw.to_string(),
            "bold" => style.bold = parse_bool(raw),
            "italic" => style.italic = parse_bool(raw),
            "underline" => style.underline = parse_bool(raw),
            "strikeout" => style.strikeout = parse_bool(raw),
            "scalex" => style.scale_x = parse_num(raw, line, column)?,
            "scaley" => style.scale_y = parse_num(raw, line, column)?,
            "spacing" => style.spacing = parse_num(raw, line, column)?,
            "angle" => style.angle = parse_num(raw, line, column)?,
            "borderstyle" => style.border_style = parse_num(raw, line, column)?,
            "outline" => style.outline = parse_num(raw, line, column)?,
            "shadow" => style.shadow = parse_num(raw, line, column)?,
            "alignment" => style.alignment = parse_num(raw, line, column)?,
            "marginl" => style.margin_l = parse_num(raw, line, column)?,
            "marginr" => style.margin_r = parse_num(raw, line, column)?,
            "marginv" => style.margin_v = parse_num(raw, line, column)?,
            "encoding" => style.encoding = parse_num(raw, line, column)?,
            other => {
                style.extra.insert(other.to_string(), raw.to_string());
            }
        }
    }
    Ok(style)
}

fn parse_event(kind: EventKind, columns: &[String], body: &str, line: usize) -> Result<Event, SubtitleError> {
    let mut event = Event { kind, ..Event::default() };
    for (column, value) in columns.iter().zip(split_fields(body, columns.len())) {
        let raw = value.trim();
        match column.as_str() {
            "layer" => event.layer = parse_num(raw, line, column)?,
            "marked" => {}
            "start" | "end" => {
                let ms = parse_timestamp(raw).ok_or_else(|| SubtitleError::Parse {
                    line,
                    message: format!("invalid timestamp '{}'", raw),
                })?;
                if column == "start" { event.start = ms } else { event.end = ms }
            }
            "style" => event.style = raw.to_string(),
            "name" | "actor" => event.name = raw.to_string(),
            "marginl" => event.margin_l = parse_num(raw, line, column)?,
            "marginr" => event.margin_r = parse_num(raw, line, column)?,
            "marginv" => event.margin_v = parse_num(raw, line, column)?,
            "effect" => event.effect = raw.to_string(),
            "text" => event.text = value.to_string(),
            other => {
                event.extra.insert(other.to_string(), raw.to_string());
            }
        }
    }
    Ok(event)
}

/// Parse ASS or SSA content
pub fn parse(content: &str, format: SubtitleFormat) -> Result<Document, SubtitleError> {
    let mut doc = Document::new(format);
    let mut section = Section::None;
    let mut style_columns = parse_format(ASS_STYLE_FORMAT);
    let mut event_columns = parse_format(ASS_EVENT_FORMAT);
    let mut saw_header = false;

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end_matches('\r');
        let trimmed = line.trim();

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let name = &trimmed[1..trimmed.len() - 1];
            section = match name.to_lowercase().as_str() {
                "script info" => {
                    saw_header = true;
                    Section::Info
                }
                "v4+ styles" | "v4 styles" | "v4 styles+" => Section::Styles,
                "events" => Section::Events,
                _ => {
                    doc.extra_sections.push((name.to_string(), Vec::new()));
                    Section::Other(doc.extra_sections.len() - 1)
                }
            };
            continue;
        }

        if let Section::Other(i) = section {
            if !trimmed.is_empty() {
                doc.extra_sections[i].1.push(line.to_string());
            }
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        let Some((key, body)) = trimmed.split_once(':') else {
            debug!("Ignoring line {} without key: {}", line_no, trimmed);
            continue;
        };
        let key = key.trim();

        match section {
            Section::Info => doc.metadata.insert(key, body.trim()),
            Section::Styles => match key.to_lowercase().as_str() {
                "format" => style_columns = parse_format(body),
                "style" => {
                    doc.insert_style(parse_style(&style_columns, body, line_no)?);
                }
                _ => debug!("Ignoring style line {}: {}", line_no, trimmed),
            },
            Section::Events => {
                // keep the untrimmed body so leading text spaces survive
                let body = line.split_once(':').map(|(_, b)| b).unwrap_or(body);
                match key.to_lowercase().as_str() {
                    "format" => event_columns = parse_format(body),
                    "dialogue" => {
                        doc.push_event(parse_event(EventKind::Dialogue, &event_columns, body, line_no)?);
                    }
                    "comment" => {
                        doc.push_event(parse_event(EventKind::Comment, &event_columns, body, line_no)?);
                    }
                    _ => debug!("Ignoring event line {}: {}", line_no, trimmed),
                }
            }
            Section::None | Section::Other(_) => {
                warn!("Line {} outside of any section: {}", line_no, trimmed);
            }
        }
    }

    if !saw_header {
        return Err(SubtitleError::Parse {
            line: 1,
            message: "missing [Script Info] section".to_string(),
        });
    }

    Ok(doc)
}

fn write_style(out: &mut String, style: &Style, format: SubtitleFormat) {
    let fontsize = format_number(style.fontsize);
    let _ = match format {
        SubtitleFormat::Ssa => writeln!(
            out,
            "Style: {},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},0,{}",
            style.name, style.fontname, fontsize,
            style.primary_color, style.secondary_color, style.outline_color, style.back_color,
            format_bool(style.bold), format_bool(style.italic),
            style.border_style, format_number(style.outline), format_number(style.shadow),
            style.alignment, style.margin_l, style.margin_r, style.margin_v, style.encoding
        ),
        _ => writeln!(
            out,
            "Style: {},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            style.name, style.fontname, fontsize,
            style.primary_color, style.secondary_color, style.outline_color, style.back_color,
            format_bool(style.bold), format_bool(style.italic),
            format_bool(style.underline), format_bool(style.strikeout),
            format_number(style.scale_x), format_number(style.scale_y),
            format_number(style.spacing), format_number(style.angle),
            style.border_style, format_number(style.outline), format_number(style.shadow),
            style.alignment, style.margin_l, style.margin_r, style.margin_v, style.encoding
        ),
    };
}

fn write_event(out: &mut String, event: &Event, format: SubtitleFormat) {
    let kind = match event.kind {
        EventKind::Dialogue => "Dialogue",
        EventKind::Comment => "Comment",
    };
    let first = match format {
        SubtitleFormat::Ssa => "Marked=0".to_string(),
        _ => event.layer.to_string(),
    };
    let _ = writeln!(
        out,
        "{}: {},{},{},{},{},{},{},{},{},{}",
        kind,
        first,
        format_timestamp(event.start),
        format_timestamp(event.end),
        event.style,
        event.name,
        event.margin_l,
        event.margin_r,
        event.margin_v,
        event.effect,
        event.text
    );
}

/// Serialize a document as ASS or SSA
pub fn serialize(doc: &Document, format: SubtitleFormat) -> String {
    let is_ssa = format == SubtitleFormat::Ssa;
    let mut out = String::new();

    out.push_str("[Script Info]\n");
    let script_type = if is_ssa { "v4.00" } else { "v4.00+" };
    let _ = writeln!(out, "ScriptType: {}", script_type);
    for (key, value) in doc.metadata.iter().filter(|(k, _)| *k != "ScriptType") {
        let _ = writeln!(out, "{}: {}", key, value);
    }

    out.push_str(if is_ssa { "\n[V4 Styles]\n" } else { "\n[V4+ Styles]\n" });
    let _ = writeln!(out, "Format: {}", if is_ssa { SSA_STYLE_FORMAT } else { ASS_STYLE_FORMAT });
    for (_, style) in doc.styles() {
        write_style(&mut out, style, format);
    }

    out.push_str("\n[Events]\n");
    let _ = writeln!(out, "Format: {}", if is_ssa { SSA_EVENT_FORMAT } else { ASS_EVENT_FORMAT });
    for (_, event) in doc.events() {
        write_event(&mut out, event, format);
    }

    for (name, lines) in &doc.extra_sections {
        let _ = writeln!(out, "\n[{}]", name);
        for line in lines {
            let _ = writeln!(out, "{}", line);
        }
    }

    out
}
