/*!
 * Tests for pipeline configuration loading and per-document dispatch
 */

use anyhow::Result;
use subsieve::errors::{ActionError, PipelineError};
use subsieve::pipeline::{PipelineConfig, SubtitleFormatter};
use subsieve::subtitle::{Document, Event, SubtitleFormat};
use crate::common;

fn formatter(json: &str) -> Result<SubtitleFormatter> {
    Ok(SubtitleFormatter::new(PipelineConfig::parse(json)?)?)
}

/// Test that unknown names are rejected while loading, per role
#[test]
fn test_formatter_new_withUnknownNames_shouldFailBeforeRunning() {
    let unknown_select = r#"{"steps":[{"target":"events","select":"top","action":"delete"}]}"#;
    let unknown_action = r#"{"steps":[{"target":"info","action":"scale"}]}"#;
    let unknown_misc = r#"{"steps":[{"target":"misc","action":"shuffle"}]}"#;

    let load_error = |json: &str| formatter(json).err().and_then(|e| e.downcast::<PipelineError>().ok());

    assert!(matches!(load_error(unknown_select), Some(PipelineError::UnknownSelect { .. })));
    assert!(matches!(load_error(unknown_action), Some(PipelineError::UnknownAction { .. })));
    assert!(matches!(load_error(unknown_misc), Some(PipelineError::UnknownAction { .. })));
}

/// Test that malformed JSON is a configuration error
#[test]
fn test_pipeline_config_parse_withBrokenJson_shouldFail() {
    assert!(matches!(PipelineConfig::parse("{ steps: "), Err(PipelineError::InvalidConfig(_))));
}

/// Test that filters decide which candidates reach the action
#[test]
fn test_apply_withFilters_shouldOnlyActOnMatchingEvents() -> Result<()> {
    let pipeline = formatter(
        r#"{"steps":[{
            "target":"events",
            "filters":[
                {"name":"properties","params":{"is_comment":false}},
                {"name":"regex","params":{"regex":"Sign:"}}
            ],
            "action":"delete"
        }]}"#,
    )?;

    let mut doc = Document::with_defaults(SubtitleFormat::Ass);
    doc.push_event(Event::new(0, 1, "Sign: Exit"));
    doc.push_event(Event::new(0, 1, "Dialogue with Sign: inside"));
    let mut note = Event::new(0, 1, "Sign: translator note");
    note.kind = subsieve::subtitle::EventKind::Comment;
    doc.push_event(note);

    pipeline.apply(&mut doc)?;

    let texts: Vec<&str> = doc.events().map(|(_, e)| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Dialogue with Sign: inside", "Sign: translator note"]);
    Ok(())
}

/// Test that steps run in configuration order
#[test]
fn test_apply_withOrderedSteps_shouldSeeEarlierChanges() -> Result<()> {
    let pipeline = formatter(
        r#"{"steps":[
            {"target":"events","action":"regex_substitution","params":{"regex":"^-","replace":"Sign:"}},
            {"target":"events","filters":[{"name":"regex","params":{"regex":"Sign:"}}],"action":"update_properties","params":{"style":"Sign"}}
        ]}"#,
    )?;

    let mut doc = Document::with_defaults(SubtitleFormat::Ass);
    doc.push_event(Event::new(0, 1, "- Road closed"));
    doc.push_event(Event::new(0, 1, "Hello"));

    pipeline.apply(&mut doc)?;

    let styles: Vec<&str> = doc.events().map(|(_, e)| e.style.as_str()).collect();
    assert_eq!(styles, vec!["Sign", "Default"]);
    Ok(())
}

/// Test that an action failure names the step and keeps the action error
#[test]
fn test_apply_withDivisionByZero_shouldReportFailingStep() -> Result<()> {
    let pipeline = formatter(
        r#"{"steps":[
            {"target":"misc","action":"remove_miscellaneous_events"},
            {"target":"styles","action":"scale","params":{"x_old":0,"x_new":1,"y_old":1,"y_new":1}}
        ]}"#,
    )?;
    let mut doc = Document::with_defaults(SubtitleFormat::Ass);

    let err = pipeline.apply(&mut doc).unwrap_err();

    match err {
        PipelineError::Step { step, ref target, ref action, source: ActionError::DivisionByZero { .. } } => {
            assert_eq!(step, 2);
            assert_eq!(target, "styles");
            assert_eq!(action, "scale");
        }
        other => panic!("unexpected error: {}", other),
    }
    Ok(())
}

/// Test that deleting every event in one step visits each candidate once
#[test]
fn test_apply_withDeleteAll_shouldEmptyEvents() -> Result<()> {
    let pipeline = formatter(r#"{"steps":[{"target":"events","action":"delete"}]}"#)?;
    let mut doc = Document::parse_str(common::SAMPLE_ASS, SubtitleFormat::Ass)?;

    pipeline.apply(&mut doc)?;

    assert_eq!(doc.event_count(), 0);
    assert_eq!(doc.style_count(), 2);
    Ok(())
}

/// Test that the pipeline file loads from disk
#[test]
fn test_from_file_withJsonFile_shouldLoadSteps() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "pipeline.json",
        r#"{"steps":[{"target":"info","select":"current_info","action":"update","params":{"PlayResX":1280}},{"target":"misc","action":"remove_miscellaneous_events"}]}"#,
    )?;

    let pipeline = SubtitleFormatter::from_file(&path)?;
    assert_eq!(pipeline.step_count(), 2);

    let missing = temp_dir.path().join("missing.json");
    assert!(matches!(SubtitleFormatter::from_file(&missing), Err(PipelineError::InvalidConfig(_))));
    Ok(())
}
