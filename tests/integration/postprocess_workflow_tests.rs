/*!
 * Integration tests for post-processing subtitle files with a pipeline
 */

use anyhow::Result;
use subsieve::pipeline::{PipelineConfig, SubtitleFormatter};
use subsieve::subtitle::{Document, SubtitleFormat};
use crate::common;

const RESCALE_AND_REPLACE: &str = r#"{
    "steps": [
        {
            "target": "styles",
            "select": "top",
            "action": "scale_margins",
            "params": { "x_old": 1920, "x_new": 1280, "y_old": 1080, "y_new": 720 }
        },
        {
            "target": "events",
            "action": "regex_substitution",
            "params": { "regex": "foo", "replace": "bar" }
        }
    ]
}"#;

/// Test the two-step pipeline: majority style rescaled, every event rewritten
#[test]
fn test_pipeline_withTopStyleScaleAndSubstitution_shouldRescaleMajorityOnly() -> Result<()> {
    let formatter = SubtitleFormatter::new(PipelineConfig::parse(RESCALE_AND_REPLACE)?)?;
    let mut doc = Document::parse_str(common::SAMPLE_ASS, SubtitleFormat::Ass)?;
    let sign_before = doc.style_by_name("Sign").map(|(_, s)| s.clone()).expect("Sign style");

    formatter.apply(&mut doc)?;

    let (_, main) = doc.style_by_name("Main").expect("Main style");
    assert_eq!(main.fontsize, 40.0);
    assert_eq!(main.margin_l, 20);
    assert_eq!(main.margin_r, 20);
    assert_eq!(main.margin_v, 40);

    let (_, sign) = doc.style_by_name("Sign").expect("Sign style");
    assert_eq!(sign, &sign_before);

    let texts: Vec<&str> = doc.events().map(|(_, e)| e.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["bar bar bar", "Second line", r"{\pos(960,540)}bar sign", "Last, with commas"]
    );
    Ok(())
}

/// Test that formatting a file rewrites it in place and reports its path
#[test]
fn test_format_withAssFile_shouldRewriteInPlace() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "episode.en.ass", common::SAMPLE_ASS)?;
    let formatter = SubtitleFormatter::new(PipelineConfig::parse(RESCALE_AND_REPLACE)?)?;

    let written = formatter.format(&path)?;

    assert_eq!(written, vec![path.clone()]);
    let content = std::fs::read_to_string(&path)?;
    assert!(content.contains("Style: Main,Arial,40,"));
    assert!(content.contains(",bar bar bar\n"));
    assert!(!content.contains("foo"));
    Ok(())
}

/// Test a resolution change applied to styles, events and the header
#[test]
fn test_format_withFullRescalePipeline_shouldKeepDocumentConsistent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "episode.en.ass", common::SAMPLE_ASS)?;
    let pipeline = common::create_test_file(
        temp_dir.path(),
        "rescale.json",
        r#"{"steps":[
            {"target":"info","action":"update","params":{"PlayResX":1280,"PlayResY":720}},
            {"target":"styles","action":"scale","params":{"x_old":1920,"x_new":1280,"y_old":1080,"y_new":720}},
            {"target":"events","filters":[{"name":"properties","params":{"is_comment":false}}],
             "action":"scale","params":{"x_old":1920,"x_new":1280,"y_old":1080,"y_new":720}},
            {"target":"misc","action":"remove_miscellaneous_events"}
        ]}"#,
    )?;

    SubtitleFormatter::from_file(&pipeline)?.format(&path)?;

    let doc = Document::load(&path)?;
    assert_eq!(doc.metadata.get("PlayResX"), Some("1280"));
    assert_eq!(doc.metadata.get("PlayResY"), Some("720"));
    assert_eq!(doc.style_by_name("Sign").map(|(_, s)| s.margin_v), Some(30));
    assert_eq!(doc.style_by_name("Sign").map(|(_, s)| s.fontsize), Some(32.0));
    assert!(doc.events().any(|(_, e)| e.text == r"{\pos(640.0,360.0)}foo sign"));
    assert_eq!(doc.event_count(), 4);
    Ok(())
}

/// Test that an SRT file keeps its format through the pipeline
#[test]
fn test_format_withSrtFile_shouldWriteSrt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "movie.en.srt", common::SAMPLE_SRT)?;
    let formatter = SubtitleFormatter::new(PipelineConfig::parse(
        r#"{"steps":[{"target":"events","action":"regex_substitution","params":{"regex":"test","replace":"sample"}}]}"#,
    )?)?;

    formatter.format(&path)?;

    let content = std::fs::read_to_string(&path)?;
    assert!(content.starts_with("1\n00:00:01,000 --> 00:00:04,000\nThis is a sample subtitle.\n"));
    assert!(content.contains("It contains <i>multiple</i>\nentries."));
    Ok(())
}
