// src/splitter/parse.rs

//! Parsers for the four container grammars.

use super::ContainerRecord;
use crate::constants::DETAILED_RULE_WIDTH;
use crate::encoding::Charset;
use crate::errors::{Error, Result};
use crate::separator::{parse_machine_marker, MachineMetadata, MarkerKind, SeparatorStyle};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::SystemTime;

static STANDARD_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^======= (.+?)(?: \| CHECKSUM_SHA256: ([0-9a-fA-F]+))? ======$").unwrap()
});

const LOCAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A container line with and without its terminator.
#[derive(Debug, Clone, Copy)]
pub(super) struct Line<'a> {
    /// One-based.
    pub number: usize,
    /// Without `\n` or `\r\n`.
    pub text: &'a str,
    /// Exactly as in the container.
    pub raw: &'a str,
}

impl Line<'_> {
    /// The terminator this line was written with.
    fn ending(&self) -> &'static str {
        if self.raw.ends_with("\r\n") {
            "\r\n"
        } else {
            "\n"
        }
    }
}

pub(super) fn split_lines(text: &str) -> Vec<Line<'_>> {
    text.split_inclusive('\n')
        .enumerate()
        .map(|(idx, raw)| Line {
            number: idx + 1,
            text: raw
                .strip_suffix('\n')
                .map(|l| l.strip_suffix('\r').unwrap_or(l))
                .unwrap_or(raw),
            raw,
        })
        .collect()
}

/// Concatenates body lines and removes `trailing` line endings added by the writer.
fn body_of(lines: &[Line<'_>], ending: &str, trailing: usize) -> String {
    let raw: String = lines.iter().map(|l| l.raw).collect();
    let mut body = raw.as_str();
    for _ in 0..trailing {
        body = body.strip_suffix(ending).unwrap_or(body);
    }
    body.to_string()
}

fn malformed(line: usize, reason: impl Into<String>) -> Error {
    Error::Container {
        line,
        reason: reason.into(),
    }
}

fn parse_local_date(text: &str) -> Option<SystemTime> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), LOCAL_DATE_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(SystemTime::from)
}

/// Splits `utf-8 (target: latin-1) (with conversion errors)` into its charsets.
fn parse_encoding_descriptor(descriptor: &str) -> (Option<Charset>, Option<Charset>) {
    let base = descriptor.split(" (").next().unwrap_or(descriptor);
    let target = descriptor
        .split_once("(target: ")
        .and_then(|(_, rest)| rest.split_once(')'))
        .and_then(|(label, _)| Charset::from_label(label));
    (Charset::from_label(base), target)
}

fn is_machine_begin(line: &Line<'_>) -> bool {
    matches!(
        parse_machine_marker(line.text),
        Some((MarkerKind::BeginMetadata, _))
    )
}

fn is_markdown_start(lines: &[Line<'_>], idx: usize) -> bool {
    lines[idx].text.starts_with("## ")
        && lines
            .get(idx + 1)
            .is_some_and(|l| l.text.starts_with("**Date Modified:**"))
}

fn detailed_rule() -> String {
    "=".repeat(DETAILED_RULE_WIDTH)
}

fn is_detailed_start(lines: &[Line<'_>], idx: usize, rule: &str) -> bool {
    lines[idx].text == rule
        && lines
            .get(idx + 1)
            .is_some_and(|l| l.text.starts_with("== FILE: "))
}

/// The grammar whose header starts at `idx`, if any.
fn block_start(lines: &[Line<'_>], idx: usize, rule: &str) -> Option<SeparatorStyle> {
    if is_machine_begin(&lines[idx]) {
        Some(SeparatorStyle::MachineReadable)
    } else if is_markdown_start(lines, idx) {
        Some(SeparatorStyle::Markdown)
    } else if is_detailed_start(lines, idx, rule) {
        Some(SeparatorStyle::Detailed)
    } else if STANDARD_HEADER.is_match(lines[idx].text) {
        Some(SeparatorStyle::Standard)
    } else {
        None
    }
}

/// Guesses the style of a container from the block headers it contains.
pub(super) fn detect_style(lines: &[Line<'_>]) -> Option<SeparatorStyle> {
    let rule = detailed_rule();
    let found: Vec<SeparatorStyle> = (0..lines.len())
        .filter_map(|i| block_start(lines, i, &rule))
        .collect();
    [
        SeparatorStyle::MachineReadable,
        SeparatorStyle::Markdown,
        SeparatorStyle::Detailed,
        SeparatorStyle::Standard,
    ]
    .into_iter()
    .find(|style| found.contains(style))
}

/// Parses every block in container order.
///
/// With `only` set, headers of other styles are treated as body text.
/// Otherwise each block is parsed in whichever grammar its header uses, so
/// containers whose presets restyled some files split completely. Standard
/// and Detailed bodies run until the next recognized header.
pub(super) fn parse_records(
    lines: &[Line<'_>],
    only: Option<SeparatorStyle>,
) -> Result<Vec<ContainerRecord>> {
    let rule = detailed_rule();
    let start_at = |idx: usize| {
        block_start(lines, idx, &rule).filter(|style| only.map_or(true, |o| o == *style))
    };
    let next_start = |from: usize| {
        (from.min(lines.len())..lines.len())
            .find(|&j| start_at(j).is_some())
            .unwrap_or(lines.len())
    };

    let mut records = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(style) = start_at(i) else {
            i += 1;
            continue;
        };
        let (record, next) = match style {
            SeparatorStyle::Standard => {
                let end = next_start(i + 1);
                (standard_block(lines, i, end)?, end)
            }
            SeparatorStyle::Detailed => {
                let end = next_start(i + 6);
                (detailed_block(lines, i, end, &rule)?, end)
            }
            SeparatorStyle::Markdown => markdown_block(lines, i)?,
            SeparatorStyle::MachineReadable => machine_block(lines, i)?,
        };
        records.push(record);
        i = next;
    }
    Ok(records)
}

fn standard_block(lines: &[Line<'_>], start: usize, end: usize) -> Result<ContainerRecord> {
    let header = &lines[start];
    let caps = STANDARD_HEADER
        .captures(header.text)
        .ok_or_else(|| malformed(header.number, "expected a standard header"))?;
    Ok(ContainerRecord {
        relative_path: caps[1].to_string(),
        content: body_of(&lines[start + 1..end], header.ending(), 2),
        checksum: caps.get(2).map(|m| m.as_str().to_lowercase()),
        encoding: None,
        target_encoding: None,
        modified: None,
        line: header.number,
    })
}

fn detailed_block(
    lines: &[Line<'_>],
    start: usize,
    end: usize,
    rule: &str,
) -> Result<ContainerRecord> {
    if end < start + 6 || lines[start + 5].text != rule {
        return Err(malformed(
            lines[start].number,
            "detailed header is not closed by a rule line",
        ));
    }
    let field = |offset: usize, prefix: &str| -> Result<&str> {
        lines[start + offset].text.strip_prefix(prefix).ok_or_else(|| {
            malformed(
                lines[start + offset].number,
                format!("expected a line starting with '{}'", prefix),
            )
        })
    };
    let path = field(1, "== FILE: ")?;
    let date_line = field(2, "== DATE: ")?;
    let (encoding, target_encoding) = parse_encoding_descriptor(field(3, "== ENCODING: ")?);
    let checksum = field(4, "== CHECKSUM_SHA256: ")?;
    let date = date_line.split(" | ").next().unwrap_or(date_line);

    Ok(ContainerRecord {
        relative_path: path.to_string(),
        content: body_of(&lines[start + 6..end], lines[start].ending(), 2),
        checksum: Some(checksum.trim().to_lowercase()),
        encoding,
        target_encoding,
        modified: parse_local_date(date),
        line: lines[start].number,
    })
}

/// Returns the record and the index just past its closing fence.
fn markdown_block(lines: &[Line<'_>], i: usize) -> Result<(ContainerRecord, usize)> {
    let header = &lines[i];
    let path = &header.text[3..];
    let mut record = ContainerRecord {
        relative_path: path.to_string(),
        content: String::new(),
        checksum: None,
        encoding: None,
        target_encoding: None,
        modified: None,
        line: header.number,
    };
    for part in lines[i + 1].text.split(" | ") {
        let Some((key, value)) = part
            .strip_prefix("**")
            .and_then(|p| p.split_once(":** "))
        else {
            continue;
        };
        match key {
            "Date Modified" => record.modified = parse_local_date(value),
            "Encoding" => {
                (record.encoding, record.target_encoding) = parse_encoding_descriptor(value)
            }
            "Checksum (SHA256)" => record.checksum = Some(value.trim().to_lowercase()),
            _ => {}
        }
    }

    let fence_idx = i + 3;
    let fence: String = match lines.get(fence_idx) {
        Some(line) if line.text.starts_with("```") => {
            line.text.chars().take_while(|c| *c == '`').collect()
        }
        _ => {
            return Err(malformed(
                header.number + 3,
                format!("expected an opening code fence for '{}'", path),
            ))
        }
    };
    let body_start = fence_idx + 1;
    let Some(close) = (body_start..lines.len()).find(|&j| lines[j].text == fence) else {
        return Err(malformed(
            header.number,
            format!("code fence for '{}' is never closed", path),
        ));
    };
    record.content = body_of(&lines[body_start..close], lines[fence_idx].ending(), 1);
    Ok((record, close + 1))
}

/// Returns the record and the index just past its END content marker.
fn machine_block(lines: &[Line<'_>], start: usize) -> Result<(ContainerRecord, usize)> {
    let begin = lines[start];
    let Some((MarkerKind::BeginMetadata, id)) = parse_machine_marker(begin.text) else {
        return Err(malformed(begin.number, "expected a BEGIN metadata marker"));
    };

    let mut i = start + 1;
    if lines.get(i).map(|l| l.text.trim()) != Some("METADATA_JSON:") {
        return Err(malformed(begin.number + 1, "expected 'METADATA_JSON:'"));
    }
    i += 1;
    let json_start = i;
    while i < lines.len()
        && parse_machine_marker(lines[i].text) != Some((MarkerKind::EndMetadata, id))
    {
        i += 1;
    }
    if i == lines.len() {
        return Err(malformed(
            begin.number,
            format!("metadata block {} is never closed", id),
        ));
    }
    let json = lines[json_start..i]
        .iter()
        .map(|l| l.text)
        .collect::<Vec<_>>()
        .join("\n");
    let meta: MachineMetadata = serde_json::from_str(&json)?;

    i += 1;
    match lines.get(i) {
        Some(line) if parse_machine_marker(line.text) == Some((MarkerKind::BeginContent, id)) => {}
        _ => {
            return Err(malformed(
                begin.number,
                format!("content block {} does not follow its metadata", id),
            ))
        }
    }
    let ending = lines[i].ending();
    i += 1;
    let body_start = i;
    while i < lines.len()
        && parse_machine_marker(lines[i].text) != Some((MarkerKind::EndContent, id))
    {
        i += 1;
    }
    if i == lines.len() {
        return Err(malformed(
            begin.number,
            format!("missing END marker for block {}", id),
        ));
    }

    let encoding = Charset::from_label(&meta.encoding);
    if encoding.is_none() {
        warn!(
            "Unknown encoding '{}' recorded for {}",
            meta.encoding, meta.original_filepath
        );
    }
    let record = ContainerRecord {
        content: body_of(&lines[body_start..i], ending, 1),
        checksum: Some(meta.checksum_sha256.to_lowercase()),
        encoding,
        target_encoding: meta.target_encoding.as_deref().and_then(Charset::from_label),
        modified: DateTime::parse_from_rfc3339(&meta.timestamp_utc_iso)
            .ok()
            .map(SystemTime::from),
        relative_path: meta.original_filepath,
        line: begin.number,
    };
    Ok((record, i + 1))
}
