//! Defines core data structures used throughout the combine and split pipelines.
//!
//! `SourceFile` is created by discovery and filled with decoded content by the
//! writer. `ProcessingResult` and `ExtractionResult` summarize a finished run.

use crate::encoding::Charset;
use crate::presets::ResolvedPreset;
use crate::security::SecretKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// How a file entered the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileRole {
    /// Discovered from a source root or a manifest.
    #[default]
    Regular,
    /// An intro/include file placed at the start of the bundle. Never deduplicated.
    Include,
}

/// Decoded content of a file, as it will be emitted.
#[derive(Debug, Clone)]
pub struct FileContent {
    /// The decoded (and possibly transformed) text.
    pub text: String,
    /// The charset the file was stored in on disk.
    pub encoding: Charset,
    /// The charset the content was validated against, if a conversion was requested.
    pub target_encoding: Option<Charset>,
    /// `true` if decoding or conversion substituted replacement characters.
    pub had_errors: bool,
}

/// A file selected for bundling.
///
/// # Examples
///
/// ```
/// use dirbundle::core_types::SourceFile;
/// use std::path::PathBuf;
///
/// let file = SourceFile::new(PathBuf::from("/project/src/main.rs"), "src/main.rs");
/// assert_eq!(file.relative_path, "src/main.rs");
/// assert_eq!(file.extension(), Some("rs".to_string()));
/// assert!(file.content.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    /// The absolute path on disk.
    pub absolute_path: PathBuf,
    /// The POSIX-style path relative to its source root. Unique within a run.
    pub relative_path: String,
    /// Whether this is a regular or an include file.
    pub role: FileRole,
    /// Size in bytes, from metadata.
    pub size: u64,
    /// Modification time, from metadata.
    pub modified: Option<SystemTime>,
    /// `true` if the path itself is a symlink.
    pub is_symlink: bool,
    /// `true` if the content was sniffed as binary.
    pub is_binary: bool,
    /// `true` if the file was listed explicitly in a manifest.
    pub from_manifest: bool,
    /// Overrides attached by the preset system, if any preset applies.
    pub preset: Option<Arc<ResolvedPreset>>,
    /// Populated by the writer once the file has been read.
    pub content: Option<FileContent>,
}

impl SourceFile {
    /// Creates a stub with only the identity fields set.
    pub fn new(absolute_path: PathBuf, relative_path: impl Into<String>) -> Self {
        Self {
            absolute_path,
            relative_path: relative_path.into(),
            ..Default::default()
        }
    }

    /// Lowercase extension without the leading dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.relative_path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }
}

/// A potential secret found by the security scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityFinding {
    /// Relative path of the flagged file.
    pub path: String,
    /// Category of the matched pattern.
    pub kind: SecretKind,
    /// One-based line number.
    pub line: usize,
    /// Short description for logs.
    pub message: String,
}

/// Summary of a combine run. Produced once and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct ProcessingResult {
    /// Number of blocks written to the container.
    pub files_processed: usize,
    /// Number of candidates handed to the writer.
    pub total_candidates: usize,
    /// Blocks skipped because their content was already emitted.
    pub duplicates_skipped: usize,
    /// Files whose content carries an encoding error flag.
    pub encoding_errors: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// The container that was written.
    pub output_path: PathBuf,
    /// Sibling list of bundled files, if requested.
    pub file_list_path: Option<PathBuf>,
    /// Sibling list of bundled directories, if requested.
    pub dir_list_path: Option<PathBuf>,
    /// Findings reported by the security scanner.
    pub security_findings: Vec<SecurityFinding>,
}

/// Summary of a split run.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    /// Number of files written to the destination.
    pub extracted: usize,
    /// Records skipped because the destination file existed and `force` was off.
    pub skipped_existing: usize,
    /// Relative paths whose recorded checksum did not match the extracted body.
    pub checksum_mismatches: Vec<String>,
    /// Recorded paths refused because they are absolute or climb out with `..`.
    pub rejected_paths: Vec<String>,
    /// Relative paths written (or, in a dry run, that would be written).
    pub paths: Vec<String>,
}
