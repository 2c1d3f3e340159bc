use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;
use super::{ass, srt};

// @module: In-memory subtitle document

// @const: Override block containing a drawing-mode tag (\p1, \p2, ...)
static DRAWING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^}]*\\p[1-9][^}]*\}").unwrap()
});

// @const: Any override block
static OVERRIDE_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^}]*\}").unwrap()
});

/// Stable identifier of a style inside one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(u64);

/// Stable identifier of an event inside one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "style#{}", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// On-disk subtitle format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// Advanced SubStation Alpha (v4.00+)
    Ass,
    /// SubStation Alpha (v4.00)
    Ssa,
    /// SubRip
    Srt,
}

impl SubtitleFormat {
    /// Detect the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "ass" => Some(Self::Ass),
            "ssa" => Some(Self::Ssa),
            "srt" => Some(Self::Srt),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ass => "ass",
            Self::Ssa => "ssa",
            Self::Srt => "srt",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Ordered key/value header of a document (the `[Script Info]` section)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Insert or overwrite a key, keeping the position of existing keys
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Named formatting template referenced by events
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub name: String,
    pub fontname: String,
    pub fontsize: f64,
    pub primary_color: String,
    pub secondary_color: String,
    pub outline_color: String,
    pub back_color: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub scale_x: f64,
    pub scale_y: f64,
    pub spacing: f64,
    pub angle: f64,
    pub border_style: i32,
    pub outline: f64,
    pub shadow: f64,
    pub alignment: i32,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub encoding: i32,
    /// Attributes this model has no typed field for
    pub extra: BTreeMap<String, String>,
}

impl Style {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            fontname: "Arial".to_string(),
            fontsize: 20.0,
            primary_color: "&H00FFFFFF".to_string(),
            secondary_color: "&H000000FF".to_string(),
            outline_color: "&H00000000".to_string(),
            back_color: "&H00000000".to_string(),
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            scale_x: 100.0,
            scale_y: 100.0,
            spacing: 0.0,
            angle: 0.0,
            border_style: 1,
            outline: 2.0,
            shadow: 2.0,
            alignment: 2,
            margin_l: 10,
            margin_r: 10,
            margin_v: 10,
            encoding: 1,
            extra: BTreeMap::new(),
        }
    }
}

/// Line type of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventKind {
    #[default]
    Dialogue,
    Comment,
}

/// One subtitle cue
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub kind: EventKind,
    pub layer: i32,
    /// Start time in ms
    pub start: i64,
    /// End time in ms
    pub end: i64,
    pub style: String,
    pub name: String,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub effect: String,
    pub text: String,
    pub extra: BTreeMap<String, String>,
}

impl Event {
    /// Dialogue event on the `Default` style
    pub fn new(start: i64, end: i64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            style: "Default".to_string(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn is_comment(&self) -> bool {
        self.kind == EventKind::Comment
    }

    /// True when the text switches into vector drawing mode
    pub fn is_drawing(&self) -> bool {
        DRAWING_REGEX.is_match(&self.text)
    }

    /// Text with override blocks stripped and ASS escapes resolved
    pub fn plaintext(&self) -> String {
        OVERRIDE_BLOCK_REGEX
            .replace_all(&self.text, "")
            .replace("\\N", "\n")
            .replace("\\n", "\n")
            .replace("\\h", " ")
    }
}

/// One parsed subtitle file: metadata, styles keyed by name and ordered events
#[derive(Debug, Clone)]
pub struct Document {
    pub format: SubtitleFormat,
    pub metadata: Metadata,
    styles: Vec<(StyleId, Style)>,
    events: Vec<(EventId, Event)>,
    /// Sections this model does not interpret, kept verbatim (name, raw lines)
    pub extra_sections: Vec<(String, Vec<String>)>,
    next_id: u64,
}

impl Document {
    /// Empty document
    pub fn new(format: SubtitleFormat) -> Self {
        Self {
            format,
            metadata: Metadata::new(),
            styles: Vec::new(),
            events: Vec::new(),
            extra_sections: Vec::new(),
            next_id: 0,
        }
    }

    /// Document with the default header and a `Default` style, as used for SRT input
    pub fn with_defaults(format: SubtitleFormat) -> Self {
        let mut doc = Self::new(format);
        doc.metadata.insert("WrapStyle", "0");
        doc.metadata.insert("ScaledBorderAndShadow", "yes");
        doc.metadata.insert("Collisions", "Normal");
        doc.insert_style(Style::default());
        doc
    }

    fn next_raw_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // --- styles ---

    /// Styles in enumeration order
    pub fn styles(&self) -> impl Iterator<Item = (StyleId, &Style)> {
        self.styles.iter().map(|(id, s)| (*id, s))
    }

    pub fn style_ids(&self) -> Vec<StyleId> {
        self.styles.iter().map(|(id, _)| *id).collect()
    }

    pub fn style(&self, id: StyleId) -> Option<&Style> {
        self.styles.iter().find(|(sid, _)| *sid == id).map(|(_, s)| s)
    }

    pub fn style_mut(&mut self, id: StyleId) -> Option<&mut Style> {
        self.styles.iter_mut().find(|(sid, _)| *sid == id).map(|(_, s)| s)
    }

    pub fn style_by_name(&self, name: &str) -> Option<(StyleId, &Style)> {
        self.styles
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, s)| (*id, s))
    }

    /// Insert a style; a style with the same name is replaced in place and keeps its id
    pub fn insert_style(&mut self, style: Style) -> StyleId {
        if let Some((id, existing)) = self.styles.iter_mut().find(|(_, s)| s.name == style.name) {
            *existing = style;
            return *id;
        }
        let id = StyleId(self.next_raw_id());
        self.styles.push((id, style));
        id
    }

    /// Remove a style by id. Events that reference it by name are left untouched.
    pub fn remove_style(&mut self, id: StyleId) -> Option<Style> {
        let pos = self.styles.iter().position(|(sid, _)| *sid == id)?;
        Some(self.styles.remove(pos).1)
    }

    pub fn style_count(&self) -> usize {
        self.styles.len()
    }

    /// Style names referenced by events but not defined, in first-seen order
    pub fn dangling_style_references(&self) -> Vec<String> {
        let defined: HashSet<&str> = self.styles.iter().map(|(_, s)| s.name.as_str()).collect();
        let mut seen = HashSet::new();
        self.events
            .iter()
            .map(|(_, e)| e.style.as_str())
            .filter(|name| !defined.contains(name) && seen.insert(*name))
            .map(str::to_string)
            .collect()
    }

    // --- events ---

    /// Events in presentation order
    pub fn events(&self) -> impl Iterator<Item = (EventId, &Event)> {
        self.events.iter().map(|(id, e)| (*id, e))
    }

    pub fn event_ids(&self) -> Vec<EventId> {
        self.events.iter().map(|(id, _)| *id).collect()
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|(eid, _)| *eid == id).map(|(_, e)| e)
    }

    pub fn event_mut(&mut self, id: EventId) -> Option<&mut Event> {
        self.events.iter_mut().find(|(eid, _)| *eid == id).map(|(_, e)| e)
    }

    pub fn push_event(&mut self, event: Event) -> EventId {
        let id = EventId(self.next_raw_id());
        self.events.push((id, event));
        id
    }

    /// Remove an event by id, preserving the order of the rest
    pub fn remove_event(&mut self, id: EventId) -> Option<Event> {
        let pos = self.events.iter().position(|(eid, _)| *eid == id)?;
        Some(self.events.remove(pos).1)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Drop drawings, blank lines and repeated lines sharing timing and text
    pub fn remove_miscellaneous_events(&mut self) -> usize {
        let mut times_to_texts: HashMap<(i64, i64), Vec<String>> = HashMap::new();
        let mut duplicates = HashSet::new();

        for (id, event) in &self.events {
            let texts = times_to_texts.entry((event.start, event.end)).or_default();
            let plain = event.plaintext();
            if texts.contains(&plain) {
                duplicates.insert(*id);
            }
            texts.push(plain);
        }

        let before = self.events.len();
        self.events.retain(|(id, e)| {
            !(e.is_drawing() || duplicates.contains(id) || e.plaintext().trim().is_empty())
        });
        let removed = before - self.events.len();
        debug!("Removed {} miscellaneous events", removed);
        removed
    }

    // --- I/O ---

    /// Parse a document from text in the given format
    pub fn parse_str(content: &str, format: SubtitleFormat) -> Result<Self, SubtitleError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        match format {
            SubtitleFormat::Ass | SubtitleFormat::Ssa => ass::parse(content, format),
            SubtitleFormat::Srt => srt::parse(content),
        }
    }

    /// Serialize the document in the given format
    pub fn to_string_as(&self, format: SubtitleFormat) -> String {
        match format {
            SubtitleFormat::Ass | SubtitleFormat::Ssa => ass::serialize(self, format),
            SubtitleFormat::Srt => srt::serialize(self),
        }
    }

    /// Load a document, detecting the format from the extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let format = SubtitleFormat::from_path(path)
            .ok_or_else(|| SubtitleError::UnsupportedFormat(path.to_path_buf()))?;
        let content = fs::read_to_string(path).map_err(|source| SubtitleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content, format)
    }

    /// Save the document, choosing the format from the extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SubtitleError> {
        let path = path.as_ref();
        let format = SubtitleFormat::from_path(path)
            .ok_or_else(|| SubtitleError::UnsupportedFormat(path.to_path_buf()))?;
        fs::write(path, self.to_string_as(format)).map_err(|source| SubtitleError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
