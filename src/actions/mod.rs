/*!
 * Transformation action library.
 *
 * Every function works on exactly one target domain of a `Document`
 * (metadata, styles or events) and plays exactly one role:
 * - select: produce the ordered candidate set, never mutates
 * - filter: keep/drop one candidate, never mutates
 * - act: transform one candidate, may mutate the document's containers
 *
 * Candidates are stable ids (`StyleId`, `EventId`) or the `MetadataRef`
 * handle, so an act that deletes entities never invalidates the others.
 * The pipeline resolves functions by name through the `Domain` trait.
 *
 * Functions never do I/O and never swallow their own errors.
 */

pub mod events;
pub mod info;
pub mod styles;

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::{Map, Value};

use crate::errors::ActionError;
use crate::subtitle::{Document, EventId, StyleId};

/// Named parameters of a pipeline step
pub type Params = Map<String, Value>;

/// Select role: candidates of one domain, in order
pub type SelectFn<C> = fn(&Document, &Params) -> Result<Vec<C>, ActionError>;

/// Filter role: keep (true) or drop (false) one candidate
pub type FilterFn<C> = fn(&Document, C, &Params) -> Result<bool, ActionError>;

/// Act role: transform one candidate, returning its resulting state
pub type ActFn<C, O> = fn(&mut Document, C, &Params) -> Result<O, ActionError>;

/// Document-wide operation outside the select/filter/act scheme
pub type MiscFn = fn(&mut Document, &Params) -> Result<(), ActionError>;

/// Handle on the single metadata mapping of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataRef;

impl fmt::Display for MetadataRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "info")
    }
}

/// One target domain of the action library
pub trait Domain {
    /// Candidate handed from select to filter and act
    type Candidate: Copy + fmt::Display + Send;
    /// What an act returns for its candidate
    type Output: fmt::Debug;

    /// Name used in pipeline configuration
    const NAME: &'static str;

    /// Whether the candidate still exists in the document
    fn contains(doc: &Document, candidate: Self::Candidate) -> bool;

    fn select(name: &str) -> Option<SelectFn<Self::Candidate>>;

    fn filter(name: &str) -> Option<FilterFn<Self::Candidate>>;

    fn action(name: &str) -> Option<ActFn<Self::Candidate, Self::Output>>;
}

/// Metadata domain (`info` in configuration)
pub struct InfoDomain;

/// Style domain
pub struct StyleDomain;

/// Event domain
pub struct EventDomain;

impl Domain for InfoDomain {
    type Candidate = MetadataRef;
    type Output = crate::subtitle::Metadata;
    const NAME: &'static str = "info";

    fn contains(_doc: &Document, _candidate: MetadataRef) -> bool {
        true
    }

    fn select(name: &str) -> Option<SelectFn<MetadataRef>> {
        match name {
            "all" | "current_info" => Some(info::select_current_info),
            _ => None,
        }
    }

    fn filter(_name: &str) -> Option<FilterFn<MetadataRef>> {
        None
    }

    fn action(name: &str) -> Option<ActFn<MetadataRef, Self::Output>> {
        match name {
            "save" => Some(info::action_save),
            "update" => Some(info::action_update),
            _ => None,
        }
    }
}

impl Domain for StyleDomain {
    type Candidate = StyleId;
    type Output = crate::subtitle::Style;
    const NAME: &'static str = "styles";

    fn contains(doc: &Document, candidate: StyleId) -> bool {
        doc.style(candidate).is_some()
    }

    fn select(name: &str) -> Option<SelectFn<StyleId>> {
        match name {
            "all" => Some(styles::select_all),
            "top" => Some(styles::select_top),
            _ => None,
        }
    }

    fn filter(_name: &str) -> Option<FilterFn<StyleId>> {
        None
    }

    fn action(name: &str) -> Option<ActFn<StyleId, Self::Output>> {
        match name {
            "scale" => Some(styles::action_scale),
            "scale_margins" => Some(styles::action_scale_margins),
            "update_properties" => Some(styles::action_update_properties),
            "remove" => Some(styles::action_remove),
            _ => None,
        }
    }
}

impl Domain for EventDomain {
    type Candidate = EventId;
    type Output = crate::subtitle::Event;
    const NAME: &'static str = "events";

    fn contains(doc: &Document, candidate: EventId) -> bool {
        doc.event(candidate).is_some()
    }

    fn select(name: &str) -> Option<SelectFn<EventId>> {
        match name {
            "all" => Some(events::select_all),
            _ => None,
        }
    }

    fn filter(name: &str) -> Option<FilterFn<EventId>> {
        match name {
            "regex" => Some(events::filter_regex),
            "properties" => Some(events::filter_properties),
            _ => None,
        }
    }

    fn action(name: &str) -> Option<ActFn<EventId, Self::Output>> {
        match name {
            "scale" => Some(events::action_scale),
            "scale_margins" => Some(events::action_scale_margins),
            "scale_position" => Some(events::action_scale_position),
            "regex_substitution" => Some(events::action_regex_substitution),
            "delete" => Some(events::action_delete),
            "update_properties" => Some(events::action_update_properties),
            _ => None,
        }
    }
}

/// Resolve a document-wide operation (`misc` target)
pub fn misc(name: &str) -> Option<MiscFn> {
    match name {
        "remove_miscellaneous_events" => Some(events::misc_remove_miscellaneous_events),
        _ => None,
    }
}

// --- parameter helpers ---

fn invalid(name: &str, reason: impl Into<String>) -> ActionError {
    ActionError::InvalidParameter {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Numeric parameter; numeric strings are accepted
pub fn param_f64(params: &Params, name: &str) -> Result<f64, ActionError> {
    let value = params
        .get(name)
        .ok_or_else(|| ActionError::MissingParameter(name.to_string()))?;
    value_as_f64(value).ok_or_else(|| invalid(name, format!("expected a number, got {}", value)))
}

/// Optional boolean parameter
pub fn param_bool(params: &Params, name: &str) -> Result<Option<bool>, ActionError> {
    match params.get(name) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(invalid(name, format!("expected a boolean, got {}", other))),
    }
}

/// Optional string parameter
pub fn param_str<'a>(params: &'a Params, name: &str) -> Result<Option<&'a str>, ActionError> {
    match params.get(name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(invalid(name, format!("expected a string, got {}", other))),
    }
}

pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Render a parameter value as stored in a text field
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Attribute name as matched by the typed updates: `MarginL`, `margin_l` and `marginl` are one key
pub(crate) fn field_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Conversions for typed attribute updates
pub(crate) mod typed {
    use serde_json::Value;

    use super::{invalid, value_as_f64};
    use crate::errors::ActionError;

    pub fn string(key: &str, value: &Value) -> Result<String, ActionError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(invalid(key, format!("expected a string, got {}", other))),
        }
    }

    pub fn float(key: &str, value: &Value) -> Result<f64, ActionError> {
        value_as_f64(value).ok_or_else(|| invalid(key, format!("expected a number, got {}", value)))
    }

    pub fn int(key: &str, value: &Value) -> Result<i32, ActionError> {
        match value_as_f64(value) {
            Some(n) if n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64 => Ok(n as i32),
            _ => Err(invalid(key, format!("expected an integer, got {}", value))),
        }
    }

    pub fn long(key: &str, value: &Value) -> Result<i64, ActionError> {
        match value_as_f64(value) {
            Some(n) if n.fract() == 0.0 => Ok(n as i64),
            _ => Err(invalid(key, format!("expected an integer, got {}", value))),
        }
    }

    /// Booleans, or the ASS convention of -1/1 for true and 0 for false
    pub fn boolean(key: &str, value: &Value) -> Result<bool, ActionError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => match n.as_i64() {
                Some(-1) | Some(1) => Ok(true),
                Some(0) => Ok(false),
                _ => Err(invalid(key, format!("expected a boolean, got {}", n))),
            },
            other => Err(invalid(key, format!("expected a boolean, got {}", other))),
        }
    }
}

/// Horizontal and vertical scale factors between two reference resolutions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRatios {
    pub x: f64,
    pub y: f64,
}

impl ScaleRatios {
    /// Read `x_old`, `x_new`, `y_old`, `y_new`; a zero old dimension is a division by zero
    pub fn from_params(params: &Params) -> Result<Self, ActionError> {
        let ratio = |new_key: &str, old_key: &str| -> Result<f64, ActionError> {
            let new = param_f64(params, new_key)?;
            let old = param_f64(params, old_key)?;
            if old == 0.0 {
                return Err(ActionError::DivisionByZero {
                    parameter: old_key.to_string(),
                });
            }
            Ok(new / old)
        };
        let y = ratio("y_new", "y_old")?;
        let x = ratio("x_new", "x_old")?;
        Ok(Self { x, y })
    }
}

/// Scale an integer attribute, rounding half to even
pub fn scale_int(value: i32, ratio: f64) -> i32 {
    (value as f64 * ratio).round_ties_even() as i32
}

// Compiled patterns are shared across every document of a run
static PATTERN_CACHE: Lazy<Mutex<HashMap<String, Regex>>> = Lazy::new(|| Mutex::new(HashMap::new()));

pub(crate) fn compiled_regex(pattern: &str) -> Result<Regex, ActionError> {
    if let Some(re) = PATTERN_CACHE.lock().get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    PATTERN_CACHE.lock().insert(pattern.to_string(), re.clone());
    Ok(re)
}
