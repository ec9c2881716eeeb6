//! Symlink resolution with cycle detection.
//!
//! A link chain is followed hop by hop up to [`MAX_SYMLINK_DEPTH`]. A chain
//! that revisits a hop, runs out of hops, or ends in a directory that contains
//! the link itself (or is already on the current traversal chain) is a cycle.

use crate::constants::MAX_SYMLINK_DEPTH;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a symlink chain ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkTarget {
    File(PathBuf),
    Directory(PathBuf),
    /// The chain loops or is too long.
    Cycle(String),
    /// The chain ends at a missing or unreadable path.
    Broken(String),
}

/// Identity of a hop: its canonical parent joined with its own name.
fn hop_key(path: &Path) -> PathBuf {
    match (path.parent().and_then(|p| p.canonicalize().ok()), path.file_name()) {
        (Some(parent), Some(name)) => parent.join(name),
        _ => path.to_path_buf(),
    }
}

/// Follows the chain starting at `link` to its final target.
pub(crate) fn resolve_link(link: &Path) -> LinkTarget {
    let mut seen: Vec<PathBuf> = Vec::new();
    let mut current = link.to_path_buf();

    for _ in 0..=MAX_SYMLINK_DEPTH {
        let metadata = match fs::symlink_metadata(&current) {
            Ok(m) => m,
            Err(e) => return LinkTarget::Broken(format!("{}: {}", current.display(), e)),
        };
        if !metadata.file_type().is_symlink() {
            return match current.canonicalize() {
                Ok(target) if target.is_dir() => LinkTarget::Directory(target),
                Ok(target) => LinkTarget::File(target),
                Err(e) => LinkTarget::Broken(format!("{}: {}", current.display(), e)),
            };
        }

        seen.push(hop_key(&current));
        let target = match fs::read_link(&current) {
            Ok(t) => t,
            Err(e) => return LinkTarget::Broken(format!("{}: {}", current.display(), e)),
        };
        let next = if target.is_absolute() {
            target
        } else {
            current.parent().unwrap_or_else(|| Path::new("")).join(target)
        };
        if seen.contains(&hop_key(&next)) {
            return LinkTarget::Cycle(format!("link chain revisits {}", next.display()));
        }
        current = next;
    }
    LinkTarget::Cycle(format!(
        "link chain is longer than {} hops",
        MAX_SYMLINK_DEPTH
    ))
}

/// Checks a link that resolved to `target` before its directory is walked.
///
/// `chain` holds the directory targets already being traversed above this
/// link. Returns the reason if descending would loop.
pub(crate) fn directory_cycle(link: &Path, target: &Path, chain: &[PathBuf]) -> Option<String> {
    if chain.iter().any(|visited| visited == target) {
        return Some(format!("{} is already on the traversal chain", target.display()));
    }
    let parent = link.parent().and_then(|p| p.canonicalize().ok())?;
    if parent.starts_with(target) {
        return Some(format!(
            "{} is an ancestor of the link",
            target.display()
        ));
    }
    None
}
