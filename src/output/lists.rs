// src/output/lists.rs

//! Output file naming and the sibling file/directory lists.

use crate::constants::{DIRLIST_SUFFIX, FILELIST_SUFFIX};
use crate::core_types::SourceFile;
use crate::errors::{io_error_with_path, Result};
use crate::separator::LineEnding;
use crate::utils::ancestor_directories;
use chrono::NaiveDateTime;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

fn stem_and_extension(path: &Path) -> (String, Option<String>) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());
    (stem, extension)
}

/// Inserts `_YYYYMMDD_HHMMSS` between the stem and the extension.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use dirbundle::output::timestamped_path;
/// use std::path::{Path, PathBuf};
///
/// let at = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(7, 5, 0).unwrap();
/// assert_eq!(
///     timestamped_path(Path::new("out/bundle.txt"), at),
///     PathBuf::from("out/bundle_20240309_070500.txt")
/// );
/// ```
pub fn timestamped_path(path: &Path, at: NaiveDateTime) -> PathBuf {
    let (stem, extension) = stem_and_extension(path);
    let mut name = format!("{}_{}", stem, at.format("%Y%m%d_%H%M%S"));
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(&ext);
    }
    path.with_file_name(name)
}

/// Paths of the file list and directory list written next to `output`.
pub fn list_paths(output: &Path) -> (PathBuf, PathBuf) {
    let (stem, _) = stem_and_extension(output);
    (
        output.with_file_name(format!("{}{}", stem, FILELIST_SUFFIX)),
        output.with_file_name(format!("{}{}", stem, DIRLIST_SUFFIX)),
    )
}

fn write_lines(path: &Path, lines: &[String], line_ending: LineEnding) -> Result<()> {
    let mut text = String::new();
    for line in lines {
        text.push_str(line);
        text.push_str(line_ending.as_str());
    }
    fs::write(path, text).map_err(|e| io_error_with_path(e, path))
}

/// Writes the list of bundled files, in bundle order, and the list of their
/// directories, in directory order. Returns both paths.
pub fn write_lists(
    output: &Path,
    files: &[SourceFile],
    line_ending: LineEnding,
) -> Result<(PathBuf, PathBuf)> {
    let (file_list, dir_list) = list_paths(output);
    let file_lines: Vec<String> = files.iter().map(|f| f.relative_path.clone()).collect();
    let dir_lines = ancestor_directories(files.iter().map(|f| f.relative_path.as_str()));
    write_lines(&file_list, &file_lines, line_ending)?;
    write_lines(&dir_list, &dir_lines, line_ending)?;
    debug!(
        "Wrote {} file(s) to {} and {} dir(s) to {}",
        file_lines.len(),
        file_list.display(),
        dir_lines.len(),
        dir_list.display()
    );
    Ok((file_list, dir_list))
}
