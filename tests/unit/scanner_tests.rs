/*!
 * Tests for corpus scanning and exclusion lists
 */

use std::fs;

use anyhow::Result;
use subsieve::scanner::{self, CorpusScanner, ExclusionList};
use subsieve::subtitle::SubtitleFormat;
use crate::common;

/// Test the language-filtered subtitle scan and its exclusion
#[test]
fn test_scan_withLanguageFilter_shouldFindOnlyMatchingSubtitle() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let wanted = common::create_test_file(temp_dir.path(), "a.en.srt", common::SAMPLE_SRT)?;
    common::create_test_file(temp_dir.path(), "a.mkv", "")?;
    common::create_test_file(temp_dir.path(), "b.fr.srt", common::SAMPLE_SRT)?;

    let pattern = scanner::subtitle_pattern(&["en".to_string()], &[SubtitleFormat::Srt])?;

    let found = CorpusScanner::scan(temp_dir.path(), &pattern, &ExclusionList::new())?;
    assert_eq!(found, vec![wanted.clone()]);

    let mut exclusions = ExclusionList::new();
    exclusions.insert(&wanted);
    let found = CorpusScanner::scan(temp_dir.path(), &pattern, &exclusions)?;
    assert!(found.is_empty());
    Ok(())
}

/// Test that nested directories are walked for media files
#[test]
fn test_scan_withNestedMedia_shouldWalkRecursively() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "show/s01/e01.mkv", "")?;
    common::create_test_file(temp_dir.path(), "show/s01/e02.MP4", "")?;
    common::create_test_file(temp_dir.path(), "show/s01/e01.en.srt", "")?;
    fs::create_dir_all(temp_dir.path().join("movie.mkv"))?;

    let mut found = CorpusScanner::scan(temp_dir.path(), &scanner::media_pattern()?, &ExclusionList::new())?;
    found.sort();

    let names: Vec<String> = found
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();
    assert_eq!(names, vec!["e01.mkv", "e02.MP4"]);
    Ok(())
}

/// Test that a file root is returned regardless of the pattern
#[test]
fn test_scan_withFileRoot_shouldReturnItAsIs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "notes.txt", "x")?;

    let found = CorpusScanner::scan(&file, &scanner::media_pattern()?, &ExclusionList::new())?;

    assert_eq!(found, vec![file]);
    Ok(())
}

/// Test that exclusion files round-trip through append and load
#[test]
fn test_exclusion_list_withAppendedPaths_shouldLoadEachLine() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let list_path = temp_dir.path().join("state/seen.txt");

    assert!(ExclusionList::load(&list_path)?.is_empty());

    let first = temp_dir.path().join("a.mkv");
    let second = temp_dir.path().join("b.mkv");
    ExclusionList::append(&list_path, &[first.clone()])?;
    ExclusionList::append(&list_path, &[second.clone()])?;

    let content = fs::read_to_string(&list_path)?;
    assert_eq!(content.lines().count(), 2);
    assert!(content.ends_with('\n'));

    let loaded = ExclusionList::load(&list_path)?;
    assert_eq!(loaded.len(), 2);
    assert!(loaded.contains(&first));
    assert!(loaded.contains(&second));
    Ok(())
}

/// Test that blank lines and surrounding spaces are ignored when loading
#[test]
fn test_exclusion_list_load_withBlankLines_shouldTrim() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let list = common::create_test_file(temp_dir.path(), "seen.txt", "  /media/a.mkv  \n\n/media/b.mkv\n")?;

    let loaded = ExclusionList::load(&list)?;

    assert_eq!(loaded.len(), 2);
    assert!(loaded.contains(std::path::Path::new("/media/a.mkv")));
    Ok(())
}
