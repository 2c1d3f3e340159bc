/*!
 * Language code handling for subtitle track and file names.
 *
 * Track tags coming out of containers use ISO 639-2 (often the
 * bibliographic variant), while subtitle file names usually carry
 * ISO 639-1. Everything is compared through the ISO 639-2/T form.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

// @const: Bibliographic codes whose terminology code differs
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Tag used by containers for an undetermined language
pub const UNDETERMINED: &str = "und";

fn lookup(code: &str) -> Option<Language> {
    let code = code.trim().to_lowercase();
    match code.len() {
        2 => Language::from_639_1(&code),
        3 => {
            let terminology = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(b, _)| *b == code)
                .map(|(_, t)| *t)
                .unwrap_or(code.as_str());
            Language::from_639_3(terminology)
        }
        _ => None,
    }
}

/// Whether the code names a known language
pub fn is_valid_code(code: &str) -> bool {
    lookup(code).is_some()
}

/// Normalize to ISO 639-1 when the language has one, ISO 639-2/T otherwise
pub fn normalize(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(lang
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Whether two codes name the same language, whatever ISO form they use
pub fn codes_match(a: &str, b: &str) -> bool {
    match (lookup(a), lookup(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Whether a track language tag carries no usable language
pub fn is_undetermined(code: Option<&str>) -> bool {
    match code.map(str::trim) {
        None | Some("") => true,
        Some(code) => code.eq_ignore_ascii_case(UNDETERMINED),
    }
}

/// English name of the language, for log messages
pub fn language_name(code: &str) -> Option<&'static str> {
    lookup(code).map(|lang| lang.to_name())
}
