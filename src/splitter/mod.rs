// src/splitter/mod.rs

//! The reverse codec: parses a container back into files.
//!
//! Each of the four separator styles has a fixed grammar (see [`crate::separator`]).
//! Unless a style is forced, each block is parsed in the grammar its own header
//! uses, since presets may restyle single files. Every block becomes a
//! [`ContainerRecord`], then the files are recreated below the destination.
//! Recorded paths are validated before anything is written, so a container can
//! never place a file outside the destination.

mod parse;

use crate::config::{SplitConfig, TimestampMode};
use crate::core_types::ExtractionResult;
use crate::encoding::Charset;
use crate::errors::{io_error_with_path, Error, Result};
use crate::separator::SeparatorStyle;
use crate::utils::{sha256_hex, sanitize_relative_path};
use filetime::FileTime;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::instrument;

/// One file block parsed from a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    /// The path as recorded in the header. Not yet validated.
    pub relative_path: String,
    /// The body with the writer's trailing line endings removed.
    pub content: String,
    /// Lowercase hex SHA-256, when the style records one.
    pub checksum: Option<String>,
    /// The charset the file was stored in before bundling.
    pub encoding: Option<Charset>,
    pub target_encoding: Option<Charset>,
    pub modified: Option<SystemTime>,
    /// One-based line of the block header.
    pub line: usize,
}

/// Parses container text into records.
///
/// With `style` set to `None` every block is parsed in the grammar its header
/// uses, so a container mixing styles (presets can restyle single files)
/// splits completely. With a style given, only that grammar's headers start
/// blocks.
///
/// # Examples
///
/// ```
/// use dirbundle::splitter::parse_container;
///
/// let text = "======= a.txt ======\nhello\n\n";
/// let records = parse_container(text, None)?;
/// assert_eq!(records[0].relative_path, "a.txt");
/// assert_eq!(records[0].content, "hello");
/// # Ok::<(), dirbundle::errors::Error>(())
/// ```
pub fn parse_container(
    text: &str,
    style: Option<SeparatorStyle>,
) -> Result<Vec<ContainerRecord>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines = parse::split_lines(text);
    match style {
        Some(style) => debug!("Parsing container as {} style", style),
        None => {
            let first = parse::detect_style(&lines).ok_or_else(|| Error::Container {
                line: 1,
                reason: "no recognizable file blocks".to_string(),
            })?;
            debug!("Parsing container by block, first style found: {}", first);
        }
    }
    let records = parse::parse_records(&lines, style)?;
    if records.is_empty() {
        let reason = match style {
            Some(style) => format!("no {} blocks found", style),
            None => "no recognizable file blocks".to_string(),
        };
        return Err(Error::Container { line: 1, reason });
    }
    Ok(records)
}

/// Extracts every file of the container named in `config`.
///
/// Records with unsafe paths are skipped and reported in
/// [`ExtractionResult::rejected_paths`]. Checksum mismatches are reported and
/// never stop the run.
#[instrument(skip_all, fields(container = %config.container.display()))]
pub fn split(config: &SplitConfig) -> Result<ExtractionResult> {
    let bytes = fs::read(&config.container)
        .map_err(|e| io_error_with_path(e, &config.container))?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "{} is not valid UTF-8 ({}); invalid bytes are replaced with U+FFFD",
                config.container.display(),
                e.utf8_error()
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    let records = parse_container(&text, config.style)?;
    info!(
        "Found {} file block(s) in {}",
        records.len(),
        config.container.display()
    );

    let mut result = ExtractionResult::default();
    for record in &records {
        extract_record(record, config, &mut result)?;
    }

    if !result.checksum_mismatches.is_empty() {
        warn!(
            "{} file(s) failed checksum verification",
            result.checksum_mismatches.len()
        );
    }
    Ok(result)
}

fn extract_record(
    record: &ContainerRecord,
    config: &SplitConfig,
    result: &mut ExtractionResult,
) -> Result<()> {
    let Some(relative) = sanitize_relative_path(&record.relative_path) else {
        warn!(
            "Refusing unsafe path '{}' (line {})",
            record.relative_path, record.line
        );
        result.rejected_paths.push(record.relative_path.clone());
        return Ok(());
    };

    if config.verify_checksums {
        match &record.checksum {
            Some(expected) if *expected != sha256_hex(record.content.as_bytes()) => {
                warn!("Checksum mismatch for {}", record.relative_path);
                result.checksum_mismatches.push(record.relative_path.clone());
            }
            Some(_) => {}
            None => debug!("No checksum recorded for {}", record.relative_path),
        }
    }

    let target = config.destination.join(&relative);
    if target.exists() && !config.force {
        warn!("Skipping existing file {}", target.display());
        result.skipped_existing += 1;
        return Ok(());
    }

    if config.dry_run {
        result.paths.push(record.relative_path.clone());
        return Ok(());
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error_with_path(e, parent))?;
    }
    fs::write(&target, encode_body(record, config.respect_encoding))
        .map_err(|e| io_error_with_path(e, &target))?;

    if config.timestamp_mode == TimestampMode::Original {
        restore_mtime(&target, record.modified)?;
    }

    debug!("Extracted {}", target.display());
    result.extracted += 1;
    result.paths.push(record.relative_path.clone());
    Ok(())
}

fn encode_body(record: &ContainerRecord, respect_encoding: bool) -> Vec<u8> {
    match record.encoding {
        Some(charset) if respect_encoding && charset != Charset::Utf8 => {
            let (bytes, had_errors) = charset.encode(&record.content);
            if had_errors {
                warn!(
                    "Some characters of {} cannot be represented in {}",
                    record.relative_path,
                    charset.name()
                );
            }
            bytes
        }
        _ => record.content.as_bytes().to_vec(),
    }
}

fn restore_mtime(path: &Path, modified: Option<SystemTime>) -> Result<()> {
    match modified {
        Some(time) => filetime::set_file_mtime(path, FileTime::from_system_time(time))
            .map_err(|e| io_error_with_path(e, path)),
        None => {
            debug!("No timestamp recorded for {}", path.display());
            Ok(())
        }
    }
}
