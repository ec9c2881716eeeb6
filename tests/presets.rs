// tests/presets.rs

mod common;

use common::create_file;
use dirbundle::errors::Error;
use dirbundle::{combine, plan, CancellationToken, ConfigBuilder, DenyOverwrite};
use std::fs;
use tempfile::tempdir;

const PRESETS: &str = r#"
version: 1
fallback:
  priority: 1
  presets:
    default:
      actions: [compress_whitespace]
project:
  priority: 10
  global_settings:
    exclude_extensions: [log]
  presets:
    notes:
      extensions: [txt]
      actions: [remove_empty_lines]
      max_lines: 2
      separator_style: detailed
"#;

#[test]
fn test_matching_preset_transforms_and_restyles() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    create_file(src.path(), "notes.txt", "a\n\nb\nc\n")?;
    create_file(src.path(), "main.rs", "fn main() {}\n")?;
    create_file(src.path(), "app.log", "noise\n")?;
    let scratch = tempdir()?;
    let presets = scratch.path().join("presets.yaml");
    fs::write(&presets, PRESETS)?;
    let bundle = scratch.path().join("bundle.txt");

    let config = ConfigBuilder::new()
        .source(src.path())
        .output_file(&bundle)
        .preset_file(&presets)
        .build()?;
    let result = combine(&config, &CancellationToken::new(), None, &DenyOverwrite)?;
    assert_eq!(result.files_processed, 2);

    let text = fs::read_to_string(&bundle)?;
    assert!(text.contains("== FILE: notes.txt"));
    assert!(text.contains("a\nb\n[... truncated after 2 lines ...]"));
    assert!(text.contains("======= main.rs |"));
    assert!(!text.contains("app.log"));
    Ok(())
}

#[test]
fn test_resolved_preset_is_attached_to_planned_files() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    create_file(src.path(), "notes.txt", "n\n")?;
    create_file(src.path(), "main.rs", "fn main() {}\n")?;
    let scratch = tempdir()?;
    let presets = scratch.path().join("presets.yaml");
    fs::write(&presets, PRESETS)?;

    let config = ConfigBuilder::new()
        .source(src.path())
        .output_file(scratch.path().join("bundle.txt"))
        .preset_file(&presets)
        .build()?;
    let files = plan(&config, &CancellationToken::new())?;
    let source_of = |name: &str| {
        files
            .iter()
            .find(|f| f.relative_path == name)
            .and_then(|f| f.preset.as_ref())
            .map(|p| p.source.clone())
    };
    assert_eq!(source_of("notes.txt").as_deref(), Some("project/notes"));
    assert_eq!(source_of("main.rs").as_deref(), Some("fallback/default"));
    Ok(())
}

#[test]
fn test_disable_presets_ignores_the_file() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    create_file(src.path(), "notes.txt", "a\n\nb\nc\n")?;
    let scratch = tempdir()?;
    let presets = scratch.path().join("presets.yaml");
    fs::write(&presets, PRESETS)?;
    let bundle = scratch.path().join("bundle.txt");

    let config = ConfigBuilder::new()
        .source(src.path())
        .output_file(&bundle)
        .preset_file(&presets)
        .disable_presets(true)
        .build()?;
    combine(&config, &CancellationToken::new(), None, &DenyOverwrite)?;
    let text = fs::read_to_string(&bundle)?;
    assert!(text.contains("a\n\nb\nc\n"));
    assert!(text.starts_with("======= notes.txt |"));
    Ok(())
}

#[test]
fn test_invalid_preset_file_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    create_file(src.path(), "a.txt", "a")?;
    let scratch = tempdir()?;
    let presets = scratch.path().join("presets.yaml");
    fs::write(&presets, "g:\n  presets:\n    p:\n      actions: [teleport]\n")?;

    let config = ConfigBuilder::new()
        .source(src.path())
        .output_file(scratch.path().join("bundle.txt"))
        .preset_file(&presets)
        .build()?;
    let err = combine(&config, &CancellationToken::new(), None, &DenyOverwrite).unwrap_err();
    assert!(matches!(err, Error::Preset { .. }), "got {:?}", err);
    Ok(())
}
