use std::borrow::Cow;
use std::fmt::Write;

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::errors::ActionError;
use crate::subtitle::{Document, Event, EventId, EventKind};

use super::{
    compiled_regex, field_key, param_bool, param_str, scale_int, typed, value_to_string, Params,
    ScaleRatios,
};

// @module: Event actions

// @const: Absolute position override tag
static POS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\pos\(([0-9.]+),([0-9.]+)\)").unwrap()
});

// @const: Backslash group references (`\1`, `\g<name>`) in replacement templates
static BACKSLASH_GROUP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:(\d{1,2})|g<(\w+)>)").unwrap()
});

fn event_mut(doc: &mut Document, id: EventId) -> Result<&mut Event, ActionError> {
    doc.event_mut(id)
        .ok_or_else(|| ActionError::UnknownCandidate(id.to_string()))
}

fn event_ref(doc: &Document, id: EventId) -> Result<&Event, ActionError> {
    doc.event(id)
        .ok_or_else(|| ActionError::UnknownCandidate(id.to_string()))
}

/// Every event in presentation order
pub fn select_all(doc: &Document, _params: &Params) -> Result<Vec<EventId>, ActionError> {
    Ok(doc.event_ids())
}

/// Keep events whose text matches `regex` starting at position zero
pub fn filter_regex(doc: &Document, id: EventId, params: &Params) -> Result<bool, ActionError> {
    let pattern = param_str(params, "regex")?.unwrap_or("");
    let re = compiled_regex(&format!("^(?:{})", pattern))?;
    Ok(re.is_match(&event_ref(doc, id)?.text))
}

/// Keep events whose `is_comment` / `is_drawing` flags equal the supplied values
pub fn filter_properties(doc: &Document, id: EventId, params: &Params) -> Result<bool, ActionError> {
    let event = event_ref(doc, id)?;

    if let Some(wanted) = param_bool(params, "is_comment")? {
        if event.is_comment() != wanted {
            return Ok(false);
        }
    }

    if let Some(wanted) = param_bool(params, "is_drawing")? {
        if event.is_drawing() != wanted {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Rewrite `text` with every `\pos(x,y)` scaled by its own coordinates
pub fn scale_positions(text: &str, ratios: ScaleRatios) -> Result<String, ActionError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in POS_REGEX.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let coordinate = |i: usize| -> Result<f64, ActionError> {
            caps[i]
                .parse::<f64>()
                .map_err(|_| ActionError::MalformedTag(whole.as_str().to_string()))
        };
        let x = coordinate(1)? * ratios.x;
        let y = coordinate(2)? * ratios.y;

        out.push_str(&text[last..whole.start()]);
        let _ = write!(out, "\\pos({:.1},{:.1})", x, y);
        last = whole.end();
    }

    out.push_str(&text[last..]);
    Ok(out)
}

/// Scale every absolute position tag in the event text
pub fn action_scale_position(doc: &mut Document, id: EventId, params: &Params) -> Result<Event, ActionError> {
    let ratios = ScaleRatios::from_params(params)?;
    let event = event_mut(doc, id)?;
    event.text = scale_positions(&event.text, ratios)?;
    Ok(event.clone())
}

/// Scale the event's own margins: vertical by y, left/right by x
pub fn action_scale_margins(doc: &mut Document, id: EventId, params: &Params) -> Result<Event, ActionError> {
    let ratios = ScaleRatios::from_params(params)?;
    let event = event_mut(doc, id)?;

    event.margin_v = scale_int(event.margin_v, ratios.y);
    event.margin_l = scale_int(event.margin_l, ratios.x);
    event.margin_r = scale_int(event.margin_r, ratios.x);

    Ok(event.clone())
}

/// Margins first, then positions
pub fn action_scale(doc: &mut Document, id: EventId, params: &Params) -> Result<Event, ActionError> {
    action_scale_margins(doc, id, params)?;
    action_scale_position(doc, id, params)
}

/// Rewrite `\1` and `\g<name>` references to groups of `re` as `${1}` / `${name}`.
///
/// References to groups the pattern does not define stay literal, so override
/// tags such as `\1c&H0000FF&` in the replacement survive.
pub fn replacement_template<'a>(re: &Regex, replace: &'a str) -> Cow<'a, str> {
    BACKSLASH_GROUP_REGEX.replace_all(replace, |caps: &Captures| {
        let Some(group) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
            return caps[0].to_string();
        };
        let defined = match group.parse::<usize>() {
            Ok(index) => index < re.captures_len(),
            Err(_) => re.capture_names().flatten().any(|name| name == group),
        };
        if defined {
            format!("${{{}}}", group)
        } else {
            caps[0].to_string()
        }
    })
}

/// Replace every match of `regex` with `replace`.
///
/// Group references may be written `$1` / `${name}` or `\1` / `\g<name>`.
pub fn action_regex_substitution(doc: &mut Document, id: EventId, params: &Params) -> Result<Event, ActionError> {
    let pattern = param_str(params, "regex")?.unwrap_or("");
    let replace = param_str(params, "replace")?.unwrap_or("");
    let re = compiled_regex(pattern)?;
    let replacement = replacement_template(&re, replace);

    let event = event_mut(doc, id)?;
    event.text = re.replace_all(&event.text, replacement.as_ref()).into_owned();
    Ok(event.clone())
}

/// Remove the event from the document
pub fn action_delete(doc: &mut Document, id: EventId, _params: &Params) -> Result<Event, ActionError> {
    doc.remove_event(id)
        .ok_or_else(|| ActionError::UnknownCandidate(id.to_string()))
}

/// Merge parameters into the event: known attributes are typed, the rest go to `extra`
pub fn action_update_properties(doc: &mut Document, id: EventId, params: &Params) -> Result<Event, ActionError> {
    let event = event_mut(doc, id)?;

    for (key, value) in params {
        match field_key(key).as_str() {
            "layer" => event.layer = typed::int(key, value)?,
            "start" => event.start = typed::long(key, value)?,
            "end" => event.end = typed::long(key, value)?,
            "style" => event.style = typed::string(key, value)?,
            "name" | "actor" => event.name = typed::string(key, value)?,
            "marginl" => event.margin_l = typed::int(key, value)?,
            "marginr" => event.margin_r = typed::int(key, value)?,
            "marginv" => event.margin_v = typed::int(key, value)?,
            "effect" => event.effect = typed::string(key, value)?,
            "text" => event.text = typed::string(key, value)?,
            "iscomment" => {
                event.kind = if typed::boolean(key, value)? {
                    EventKind::Comment
                } else {
                    EventKind::Dialogue
                }
            }
            "type" | "kind" => {
                event.kind = match typed::string(key, value)?.to_lowercase().as_str() {
                    "dialogue" => EventKind::Dialogue,
                    "comment" => EventKind::Comment,
                    other => {
                        return Err(ActionError::InvalidParameter {
                            name: key.clone(),
                            reason: format!("unknown event type '{}'", other),
                        })
                    }
                }
            }
            "isdrawing" => {
                return Err(ActionError::InvalidParameter {
                    name: key.clone(),
                    reason: "derived from the text, set a \\p tag instead".to_string(),
                })
            }
            _ => {
                debug!("Storing unknown event attribute '{}' as extra", key);
                event.extra.insert(key.clone(), value_to_string(value));
            }
        }
    }

    Ok(event.clone())
}

/// Drop drawings, blank lines and duplicated lines through the document's own cleanup
pub fn misc_remove_miscellaneous_events(doc: &mut Document, _params: &Params) -> Result<(), ActionError> {
    doc.remove_miscellaneous_events();
    Ok(())
}
