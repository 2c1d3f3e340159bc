use log::{debug, warn};

use crate::errors::ActionError;
use crate::subtitle::{Document, Style, StyleId};

use super::{field_key, scale_int, typed, value_to_string, Params, ScaleRatios};

// @module: Style actions

fn style_mut(doc: &mut Document, id: StyleId) -> Result<&mut Style, ActionError> {
    doc.style_mut(id)
        .ok_or_else(|| ActionError::UnknownCandidate(id.to_string()))
}

/// Every style in enumeration order
pub fn select_all(doc: &Document, _params: &Params) -> Result<Vec<StyleId>, ActionError> {
    Ok(doc.style_ids())
}

/// The style used by the most events; ties go to the first style seen in event order
pub fn select_top(doc: &Document, _params: &Params) -> Result<Vec<StyleId>, ActionError> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for (_, event) in doc.events() {
        match counts.iter_mut().find(|(name, _)| *name == event.style) {
            Some((_, count)) => *count += 1,
            None => counts.push((event.style.as_str(), 1)),
        }
    }

    let mut top: Option<(&str, usize)> = None;
    for (name, count) in counts {
        if top.is_none_or(|(_, best)| count > best) {
            top = Some((name, count));
        }
    }

    let Some((name, count)) = top else {
        debug!("No events reference any style, top style selection is empty");
        return Ok(Vec::new());
    };

    match doc.style_by_name(name) {
        Some((id, _)) => {
            debug!("Top style is '{}' with {} events", name, count);
            Ok(vec![id])
        }
        None => {
            warn!("Most used style '{}' is not defined in the document", name);
            Ok(Vec::new())
        }
    }
}

/// Scale font size and vertical margin by the y ratio, side margins by the x ratio
pub fn action_scale_margins(doc: &mut Document, id: StyleId, params: &Params) -> Result<Style, ActionError> {
    let ratios = ScaleRatios::from_params(params)?;
    let style = style_mut(doc, id)?;

    style.fontsize = (style.fontsize * ratios.y).round_ties_even();
    style.margin_v = scale_int(style.margin_v, ratios.y);
    style.margin_l = scale_int(style.margin_l, ratios.x);
    style.margin_r = scale_int(style.margin_r, ratios.x);

    Ok(style.clone())
}

/// Styles carry no positional tags, so scaling is margin scaling
pub fn action_scale(doc: &mut Document, id: StyleId, params: &Params) -> Result<Style, ActionError> {
    action_scale_margins(doc, id, params)
}

/// Merge parameters into the style: known attributes are typed, the rest go to `extra`
pub fn action_update_properties(doc: &mut Document, id: StyleId, params: &Params) -> Result<Style, ActionError> {
    // Style names stay unique within a document
    if let Some((key, value)) = params.iter().find(|(key, _)| field_key(key) == "name") {
        let new_name = typed::string(key, value)?;
        if matches!(doc.style_by_name(&new_name), Some((other, _)) if other != id) {
            return Err(ActionError::InvalidParameter {
                name: key.clone(),
                reason: format!("a style named '{}' already exists", new_name),
            });
        }
    }

    let style = style_mut(doc, id)?;

    for (key, value) in params {
        match field_key(key).as_str() {
            "name" => style.name = typed::string(key, value)?,
            "fontname" => style.fontname = typed::string(key, value)?,
            "fontsize" => style.fontsize = typed::float(key, value)?,
            "primarycolor" | "primarycolour" => style.primary_color = typed::string(key, value)?,
            "secondarycolor" | "secondarycolour" => style.secondary_color = typed::string(key, value)?,
            "outlinecolor" | "outlinecolour" | "tertiarycolor" | "tertiarycolour" => {
                style.outline_color = typed::string(key, value)?
            }
            "backcolor" | "backcolour" => style.back_color = typed::string(key, value)?,
            "bold" => style.bold = typed::boolean(key, value)?,
            "italic" => style.italic = typed::boolean(key, value)?,
            "underline" => style.underline = typed::boolean(key, value)?,
            "strikeout" => style.strikeout = typed::boolean(key, value)?,
            "scalex" => style.scale_x = typed::float(key, value)?,
            "scaley" => style.scale_y = typed::float(key, value)?,
            "spacing" => style.spacing = typed::float(key, value)?,
            "angle" => style.angle = typed::float(key, value)?,
            "borderstyle" => style.border_style = typed::int(key, value)?,
            "outline" => style.outline = typed::float(key, value)?,
            "shadow" => style.shadow = typed::float(key, value)?,
            "alignment" => style.alignment = typed::int(key, value)?,
            "marginl" => style.margin_l = typed::int(key, value)?,
            "marginr" => style.margin_r = typed::int(key, value)?,
            "marginv" => style.margin_v = typed::int(key, value)?,
            "encoding" => style.encoding = typed::int(key, value)?,
            _ => {
                debug!("Storing unknown style attribute '{}' as extra", key);
                style.extra.insert(key.clone(), value_to_string(value));
            }
        }
    }

    Ok(style.clone())
}

/// Remove the style by id; events referencing it by name are not touched
pub fn action_remove(doc: &mut Document, id: StyleId, _params: &Params) -> Result<Style, ActionError> {
    doc.remove_style(id)
        .ok_or_else(|| ActionError::UnknownCandidate(id.to_string()))
}
