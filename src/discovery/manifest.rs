use crate::errors::{io_error_with_path, Result};
use crate::utils::remove_nested_paths;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// Reads a manifest of paths and glob patterns, one per line.
///
/// Blank lines and lines starting with `#` are skipped. Relative entries are
/// resolved against the manifest's own directory. Entries that match nothing
/// are logged and skipped. The result is canonicalized, deduplicated and
/// free of paths nested under another listed directory.
///
/// Returns the directory entries were resolved against, and the paths.
pub(crate) fn read_manifest(path: &Path) -> Result<(PathBuf, Vec<PathBuf>)> {
    let text = fs::read_to_string(path).map_err(|e| io_error_with_path(e, path))?;
    let base = path
        .canonicalize()
        .map_err(|e| io_error_with_path(e, path))?
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut paths = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        let candidate = base.join(entry);
        if is_glob(entry) {
            let pattern = candidate.to_string_lossy().into_owned();
            match glob::glob(&pattern) {
                Ok(matches) => {
                    let before = paths.len();
                    for matched in matches {
                        match matched {
                            Ok(p) => paths.push(p),
                            Err(e) => warn!("Manifest glob '{}': {}", entry, e),
                        }
                    }
                    if paths.len() == before {
                        warn!("Manifest line {}: '{}' matched nothing", idx + 1, entry);
                    }
                }
                Err(e) => warn!("Manifest line {}: invalid glob '{}': {}", idx + 1, entry, e),
            }
        } else if candidate.exists() {
            paths.push(candidate);
        } else {
            warn!("Manifest line {}: '{}' not found, skipping", idx + 1, entry);
        }
    }

    let canonical: Vec<PathBuf> = paths
        .into_iter()
        .filter_map(|p| match p.canonicalize() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Skipping manifest entry '{}': {}", p.display(), e);
                None
            }
        })
        .collect();
    let kept = remove_nested_paths(canonical);
    debug!("Manifest {} lists {} path(s)", path.display(), kept.len());
    Ok((base, kept))
}
