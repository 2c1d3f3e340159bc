/*!
 * Tests for language utility functions
 */

use subsieve::language_utils::{codes_match, is_undetermined, is_valid_code, language_name, normalize};

/// Test validation across ISO 639 forms
#[test]
fn test_is_valid_code_withIsoForms_shouldAcceptKnownCodes() {
    for code in ["en", "fr", "eng", "fra", "fre", "ger", " DE "] {
        assert!(is_valid_code(code), "{}", code);
    }
    for code in ["xyz", "123", "e", "", "english"] {
        assert!(!is_valid_code(code), "{}", code);
    }
}

/// Test normalization to the shortest code
#[test]
fn test_normalize_withThreeLetterCodes_shouldPreferTwoLetters() {
    assert_eq!(normalize("eng").unwrap(), "en");
    assert_eq!(normalize("fre").unwrap(), "fr");
    assert_eq!(normalize("chi").unwrap(), "zh");
    assert_eq!(normalize(" EN ").unwrap(), "en");
    assert!(normalize("xyz").is_err());
}

/// Test matching of different code forms
#[test]
fn test_codes_match_withEquivalentCodes_shouldReturnTrue() {
    assert!(codes_match("en", "eng"));
    assert!(codes_match("ger", "de"));
    assert!(codes_match("cze", "ces"));
    assert!(!codes_match("en", "de"));
    assert!(!codes_match("und", "en"));
}

/// Test detection of missing track languages
#[test]
fn test_is_undetermined_withTags_shouldDetectMissingLanguage() {
    assert!(is_undetermined(None));
    assert!(is_undetermined(Some("")));
    assert!(is_undetermined(Some(" und ")));
    assert!(!is_undetermined(Some("jpn")));
}

/// Test English names
#[test]
fn test_language_name_withCode_shouldReturnEnglishName() {
    assert_eq!(language_name("fr"), Some("French"));
    assert_eq!(language_name("deu"), Some("German"));
    assert_eq!(language_name("xx"), None);
}
