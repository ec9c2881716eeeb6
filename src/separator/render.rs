use super::language::{fence_for, language_for_extension};
use super::{machine_marker, LineEnding, MarkerKind, SeparatorStyle};
use crate::constants::DETAILED_RULE_WIDTH;
use crate::encoding::Charset;
use crate::errors::Result;
use crate::utils::format_size;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;

/// Everything a header needs to know about one file.
#[derive(Debug, Clone)]
pub struct BlockMetadata<'a> {
    pub relative_path: &'a str,
    pub modified: Option<SystemTime>,
    /// Size of the file on disk, in bytes.
    pub size: u64,
    pub encoding: Charset,
    pub target_encoding: Option<Charset>,
    pub had_errors: bool,
    /// SHA-256 of the emitted body.
    pub checksum: &'a str,
    /// Required for the MachineReadable style.
    pub block_id: Option<&'a str>,
}

impl BlockMetadata<'_> {
    fn extension(&self) -> Option<String> {
        Path::new(self.relative_path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    fn type_label(&self) -> String {
        self.extension().map(|e| format!(".{}", e)).unwrap_or_default()
    }

    fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(self.relative_path)
    }
}

/// The JSON document embedded in a MachineReadable header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineMetadata {
    pub original_filepath: String,
    pub original_filename: String,
    pub timestamp_utc_iso: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size_bytes: u64,
    pub checksum_sha256: String,
    pub encoding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub had_encoding_errors: Option<bool>,
}

impl MachineMetadata {
    fn from_block(meta: &BlockMetadata<'_>) -> Self {
        let modified: DateTime<Utc> = meta.modified.map(DateTime::from).unwrap_or_else(Utc::now);
        Self {
            original_filepath: meta.relative_path.to_string(),
            original_filename: meta.file_name().to_string(),
            timestamp_utc_iso: modified.to_rfc3339_opts(SecondsFormat::Secs, true),
            file_type: meta.type_label(),
            size_bytes: meta.size,
            checksum_sha256: meta.checksum.to_string(),
            encoding: meta.encoding.name().to_string(),
            target_encoding: meta
                .target_encoding
                .filter(|t| *t != meta.encoding)
                .map(|t| t.name().to_string()),
            had_encoding_errors: meta.had_errors.then_some(true),
        }
    }
}

/// Formats a modification time as local `YYYY-MM-DD HH:MM:SS`.
pub fn format_local_timestamp(time: Option<SystemTime>) -> String {
    let local: DateTime<Local> = time.map(DateTime::from).unwrap_or_else(Local::now);
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Describes the encoding for Detailed and Markdown headers.
///
/// # Examples
/// ```
/// use dirbundle::encoding::Charset;
/// use dirbundle::separator::encoding_descriptor;
///
/// assert_eq!(encoding_descriptor(Charset::Utf8, None, false), "utf-8");
/// assert_eq!(
///     encoding_descriptor(Charset::Utf8, Some(Charset::Latin1), true),
///     "utf-8 (target: latin-1) (with conversion errors)"
/// );
/// ```
pub fn encoding_descriptor(encoding: Charset, target: Option<Charset>, had_errors: bool) -> String {
    let mut out = encoding.name().to_string();
    if let Some(target) = target.filter(|t| *t != encoding) {
        out.push_str(&format!(" (target: {})", target.name()));
    }
    if had_errors {
        out.push_str(" (with conversion errors)");
    }
    out
}

/// Renders the header that precedes `body` in a block.
pub fn render_header(
    style: SeparatorStyle,
    line_ending: LineEnding,
    meta: &BlockMetadata<'_>,
    body: &str,
) -> Result<String> {
    let nl = line_ending.as_str();
    let header = match style {
        SeparatorStyle::Standard => format!(
            "======= {} | CHECKSUM_SHA256: {} ======{nl}",
            meta.relative_path, meta.checksum
        ),
        SeparatorStyle::Detailed => {
            let rule = "=".repeat(DETAILED_RULE_WIDTH);
            format!(
                "{rule}{nl}== FILE: {path}{nl}== DATE: {date} | SIZE: {size} | TYPE: {ty}{nl}\
                 == ENCODING: {enc}{nl}== CHECKSUM_SHA256: {sum}{nl}{rule}{nl}",
                path = meta.relative_path,
                date = format_local_timestamp(meta.modified),
                size = format_size(meta.size),
                ty = meta.type_label(),
                enc = encoding_descriptor(meta.encoding, meta.target_encoding, meta.had_errors),
                sum = meta.checksum,
            )
        }
        SeparatorStyle::Markdown => format!(
            "## {path}{nl}**Date Modified:** {date} | **Size:** {size} | **Type:** {ty} | \
             **Encoding:** {enc} | **Checksum (SHA256):** {sum}{nl}{nl}{fence}{lang}{nl}",
            path = meta.relative_path,
            date = format_local_timestamp(meta.modified),
            size = format_size(meta.size),
            ty = meta.type_label(),
            enc = encoding_descriptor(meta.encoding, meta.target_encoding, meta.had_errors),
            sum = meta.checksum,
            fence = fence_for(body),
            lang = language_for_extension(meta.extension().as_deref()),
        ),
        SeparatorStyle::MachineReadable => {
            let id = meta.block_id.unwrap_or_default();
            let json = serde_json::to_string_pretty(&MachineMetadata::from_block(meta))?;
            format!(
                "{begin}{nl}METADATA_JSON:{nl}{json}{nl}{end}{nl}{content}{nl}",
                begin = machine_marker(MarkerKind::BeginMetadata, id),
                json = json.replace('\n', nl),
                end = machine_marker(MarkerKind::EndMetadata, id),
                content = machine_marker(MarkerKind::BeginContent, id),
            )
        }
    };
    Ok(header)
}

/// Renders the footer that follows `body`. Empty for styles without one.
pub fn render_footer(style: SeparatorStyle, meta: &BlockMetadata<'_>, body: &str) -> String {
    match style {
        SeparatorStyle::Standard | SeparatorStyle::Detailed => String::new(),
        SeparatorStyle::Markdown => fence_for(body),
        SeparatorStyle::MachineReadable => {
            machine_marker(MarkerKind::EndContent, meta.block_id.unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sha256_hex;

    fn meta<'a>(path: &'a str, checksum: &'a str, id: Option<&'a str>) -> BlockMetadata<'a> {
        BlockMetadata {
            relative_path: path,
            modified: Some(SystemTime::UNIX_EPOCH),
            size: 2048,
            encoding: Charset::Utf8,
            target_encoding: None,
            had_errors: false,
            checksum,
            block_id: id,
        }
    }

    #[test]
    fn test_standard_header() {
        let m = meta("src/lib.rs", "abc", None);
        let header = render_header(SeparatorStyle::Standard, LineEnding::Lf, &m, "x").unwrap();
        assert_eq!(header, "======= src/lib.rs | CHECKSUM_SHA256: abc ======\n");
        assert!(render_footer(SeparatorStyle::Standard, &m, "x").is_empty());
    }

    #[test]
    fn test_detailed_header_lines() {
        let m = meta("a/b.py", "abc", None);
        let header = render_header(SeparatorStyle::Detailed, LineEnding::Crlf, &m, "").unwrap();
        let lines: Vec<&str> = header.split("\r\n").collect();
        assert_eq!(lines[0].len(), DETAILED_RULE_WIDTH);
        assert_eq!(lines[1], "== FILE: a/b.py");
        assert!(lines[2].ends_with("| SIZE: 2.00 KB | TYPE: .py"));
        assert_eq!(lines[3], "== ENCODING: utf-8");
        assert_eq!(lines[4], "== CHECKSUM_SHA256: abc");
        assert_eq!(lines[5], lines[0]);
        assert_eq!(lines[6], "");
    }

    #[test]
    fn test_markdown_fence_matches_footer() {
        let body = "```\ninner\n```";
        let m = meta("README.md", "abc", None);
        let header = render_header(SeparatorStyle::Markdown, LineEnding::Lf, &m, body).unwrap();
        assert!(header.starts_with("## README.md\n**Date Modified:** "));
        assert!(header.ends_with("\n\n````markdown\n"));
        assert_eq!(render_footer(SeparatorStyle::Markdown, &m, body), "````");
    }

    #[test]
    fn test_machine_header_embeds_metadata() {
        let body = "hello";
        let sum = sha256_hex(body.as_bytes());
        let mut m = meta("dir/x.txt", &sum, Some("id-1"));
        m.target_encoding = Some(Charset::Latin1);
        m.had_errors = true;
        let header =
            render_header(SeparatorStyle::MachineReadable, LineEnding::Lf, &m, body).unwrap();
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines[0], "--- DIRBUNDLE_BEGIN_FILE_METADATA_BLOCK_id-1 ---");
        assert_eq!(lines[1], "METADATA_JSON:");
        assert_eq!(
            lines[lines.len() - 1],
            "--- DIRBUNDLE_BEGIN_FILE_CONTENT_BLOCK_id-1 ---"
        );
        let json = lines[2..lines.len() - 2].join("\n");
        let parsed: MachineMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.original_filepath, "dir/x.txt");
        assert_eq!(parsed.original_filename, "x.txt");
        assert_eq!(parsed.timestamp_utc_iso, "1970-01-01T00:00:00Z");
        assert_eq!(parsed.file_type, ".txt");
        assert_eq!(parsed.checksum_sha256, sum);
        assert_eq!(parsed.target_encoding.as_deref(), Some("latin-1"));
        assert_eq!(parsed.had_encoding_errors, Some(true));
        assert_eq!(
            render_footer(SeparatorStyle::MachineReadable, &m, body),
            "--- DIRBUNDLE_END_FILE_CONTENT_BLOCK_id-1 ---"
        );
    }

    #[test]
    fn test_optional_json_keys_are_omitted() {
        let m = meta("x", "abc", Some("id"));
        let json = serde_json::to_string(&MachineMetadata::from_block(&m)).unwrap();
        assert!(!json.contains("target_encoding"));
        assert!(!json.contains("had_encoding_errors"));
        assert!(json.contains("\"type\":\"\""));
    }
}
