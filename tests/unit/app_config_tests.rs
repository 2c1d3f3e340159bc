/*!
 * Tests for application configuration
 */

use anyhow::Result;
use subsieve::app_config::{Config, ExcludeMode, LogLevel, OutputFormat};
use subsieve::subtitle::SubtitleFormat;
use crate::common;

/// Test the defaults of a fresh configuration
#[test]
fn test_config_new_withPath_shouldUseDefaults() {
    let config = Config::new("/media");

    assert_eq!(config.formats, vec![OutputFormat::Srt]);
    assert_eq!(config.languages, vec!["all".to_string()]);
    assert_eq!(config.threads, 4);
    assert_eq!(config.scan_interval, 0);
    assert_eq!(config.exclude_mode, ExcludeMode::Exclude);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.all_languages());
}

/// Test that the exclude modes parse and print their short names
#[test]
fn test_exclude_mode_withShortNames_shouldRoundTrip() -> Result<()> {
    assert_eq!("e".parse::<ExcludeMode>()?, ExcludeMode::Exclude);
    assert_eq!("e+a".parse::<ExcludeMode>()?, ExcludeMode::ExcludeAndAppend);
    assert!("a".parse::<ExcludeMode>().is_err());
    assert_eq!(ExcludeMode::ExcludeAndAppend.to_string(), "e+a");
    assert!(ExcludeMode::ExcludeAndAppend.appends());
    assert!(!ExcludeMode::Exclude.appends());
    Ok(())
}

/// Test that the configuration deserializes with serde defaults
#[test]
fn test_config_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let config: Config = serde_json::from_str(
        r#"{"path":"/media","formats":["ass","srt"],"exclude_mode":"e+a","log_level":"debug"}"#,
    )?;

    assert_eq!(config.subtitle_formats(), vec![SubtitleFormat::Ass, SubtitleFormat::Srt]);
    assert_eq!(config.exclude_mode, ExcludeMode::ExcludeAndAppend);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.threads, 4);
    Ok(())
}

/// Test validation of inconsistent options
#[test]
fn test_validate_withInconsistentOptions_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let missing_path = Config::new(temp_dir.path().join("nope"));
    assert!(missing_path.validate().is_err());

    let mut no_pipeline = Config::new(temp_dir.path());
    no_pipeline.postprocess_only = true;
    assert!(no_pipeline.validate().is_err());

    let mut missing_pipeline = Config::new(temp_dir.path());
    missing_pipeline.postprocessing = Some(temp_dir.path().join("steps.json"));
    assert!(missing_pipeline.validate().is_err());

    let mut no_threads = Config::new(temp_dir.path());
    no_threads.threads = 0;
    assert!(no_threads.validate().is_err());

    let mut no_languages = Config::new(temp_dir.path());
    no_languages.languages.clear();
    assert!(no_languages.validate().is_err());
    Ok(())
}

/// Test that a consistent configuration validates
#[test]
fn test_validate_withPostprocessOnly_shouldSucceed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let steps = common::create_test_file(temp_dir.path(), "steps.json", r#"{"steps":[]}"#)?;

    let mut config = Config::new(temp_dir.path());
    config.postprocess_only = true;
    config.postprocessing = Some(steps);
    config.languages = vec!["en".to_string(), "pt-br".to_string()];

    config.validate()?;
    Ok(())
}
