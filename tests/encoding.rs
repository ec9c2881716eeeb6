// tests/encoding.rs

mod common;

use common::create_file;
use dirbundle::encoding::Charset;
use dirbundle::errors::Error;
use dirbundle::splitter::parse_container;
use dirbundle::{combine, split, CancellationToken, ConfigBuilder, DenyOverwrite, SplitConfig};
use std::fs;
use tempfile::tempdir;

const LATIN1_CAFE: &[u8] = b"caf\xe9\n";

fn utf16_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
    bytes
}

#[test]
fn test_target_utf16le_then_respect_encoding_restores_originals(
) -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    create_file(src.path(), "notes_latin1.txt", LATIN1_CAFE)?;
    create_file(src.path(), "wide.txt", utf16_with_bom("wide text\n"))?;
    create_file(src.path(), "plain.txt", "plain ✓\n")?;
    let scratch = tempdir()?;
    let bundle = scratch.path().join("bundle.txt");

    let config = ConfigBuilder::new()
        .source(src.path())
        .output_file(&bundle)
        .separator_style("machinereadable")
        .target_encoding("utf-16-le")
        .build()?;
    let result = combine(&config, &CancellationToken::new(), None, &DenyOverwrite)?;
    assert_eq!(result.files_processed, 3);
    assert_eq!(result.encoding_errors, 0);

    // The container itself is UTF-8 and records both charsets.
    let text = fs::read_to_string(&bundle)?;
    let records = parse_container(&text, None)?;
    let latin = records
        .iter()
        .find(|r| r.relative_path == "notes_latin1.txt")
        .unwrap();
    assert_eq!(latin.content, "café\n");
    assert_eq!(latin.encoding, Some(Charset::Latin1));
    assert_eq!(latin.target_encoding, Some(Charset::Utf16Le));

    let restored = scratch.path().join("restored");
    let mut split_config = SplitConfig::new(&bundle, &restored);
    split_config.respect_encoding = true;
    split(&split_config)?;
    assert_eq!(fs::read(restored.join("notes_latin1.txt"))?, LATIN1_CAFE);
    assert_eq!(fs::read(restored.join("wide.txt"))?, utf16_with_bom("wide text\n"));
    assert_eq!(fs::read_to_string(restored.join("plain.txt"))?, "plain ✓\n");

    let normalized = scratch.path().join("normalized");
    split(&SplitConfig::new(&bundle, &normalized))?;
    assert_eq!(fs::read_to_string(normalized.join("notes_latin1.txt"))?, "café\n");
    assert_eq!(fs::read_to_string(normalized.join("wide.txt"))?, "wide text\n");
    Ok(())
}

#[test]
fn test_detailed_header_describes_conversion() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    create_file(src.path(), "menu.txt", "café\n")?;
    let scratch = tempdir()?;
    let bundle = scratch.path().join("bundle.txt");
    let config = ConfigBuilder::new()
        .source(src.path())
        .output_file(&bundle)
        .separator_style("detailed")
        .target_encoding("ascii")
        .build()?;

    let result = combine(&config, &CancellationToken::new(), None, &DenyOverwrite)?;
    assert_eq!(result.encoding_errors, 1);
    let text = fs::read_to_string(&bundle)?;
    assert!(text.contains("== ENCODING: utf-8 (target: ascii) (with conversion errors)"));
    assert!(text.contains("caf?\n"));
    Ok(())
}

#[test]
fn test_strict_mode_aborts_on_lossy_conversion() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    create_file(src.path(), "menu.txt", "café\n")?;
    let scratch = tempdir()?;
    let config = ConfigBuilder::new()
        .source(src.path())
        .output_file(scratch.path().join("bundle.txt"))
        .target_encoding("ascii")
        .abort_on_encoding_error(true)
        .build()?;

    let err = combine(&config, &CancellationToken::new(), None, &DenyOverwrite).unwrap_err();
    assert!(matches!(err, Error::Encoding { .. }), "got {:?}", err);
    Ok(())
}

#[test]
fn test_unsupported_target_is_a_config_error() {
    let err = ConfigBuilder::new()
        .source(".")
        .output_file("bundle.txt")
        .target_encoding("klingon")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
