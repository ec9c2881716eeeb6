use crate::core_types::SourceFile;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Renders a relative path with `/` separators, dropping `.` components.
///
/// # Examples
/// ```
/// use dirbundle::utils::to_posix;
/// use std::path::Path;
///
/// assert_eq!(to_posix(Path::new("./src/lib.rs")), "src/lib.rs");
/// ```
pub fn to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Sort key: depth, case-insensitive parent, README first, case-insensitive name.
fn bundle_key(relative: &str) -> (usize, String, bool, String) {
    let (parent, name) = match relative.rfind('/') {
        Some(idx) => (&relative[..idx], &relative[idx + 1..]),
        None => ("", relative),
    };
    (
        relative.matches('/').count(),
        parent.to_lowercase(),
        !name.eq_ignore_ascii_case("readme.md"),
        name.to_lowercase(),
    )
}

/// Orders two relative paths the way they appear in a bundle.
///
/// Shallower paths come first. At equal depth, paths are grouped by their
/// parent directory (case-insensitive), `README.md` leads its directory, and the
/// remaining names sort case-insensitively. Ties fall back to a byte comparison
/// so the order is total.
///
/// # Examples
/// ```
/// use dirbundle::utils::compare_bundle_order;
///
/// let mut paths = vec!["src/main.rs", "b.txt", "README.md", "a.txt", "src/README.md"];
/// paths.sort_by(|a, b| compare_bundle_order(a, b));
/// assert_eq!(paths, vec!["README.md", "a.txt", "b.txt", "src/README.md", "src/main.rs"]);
/// ```
pub fn compare_bundle_order(a: &str, b: &str) -> Ordering {
    bundle_key(a).cmp(&bundle_key(b)).then_with(|| a.cmp(b))
}

/// Orders directory paths by depth, then case-insensitive path.
pub fn compare_directory_order(a: &str, b: &str) -> Ordering {
    let depth_a = a.matches('/').count();
    let depth_b = b.matches('/').count();
    depth_a
        .cmp(&depth_b)
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Sorts files in place into bundle order.
pub fn sort_for_bundle(files: &mut [SourceFile]) {
    files.sort_by(|a, b| compare_bundle_order(&a.relative_path, &b.relative_path));
}

/// Validates a relative path taken from a container and converts it to a `PathBuf`.
///
/// Returns `None` for empty paths, absolute paths (POSIX, UNC or drive-letter)
/// and any path containing a `..` component.
///
/// # Examples
/// ```
/// use dirbundle::utils::sanitize_relative_path;
/// use std::path::PathBuf;
///
/// assert_eq!(sanitize_relative_path("a/./b.txt"), Some(PathBuf::from("a/b.txt")));
/// assert_eq!(sanitize_relative_path("../etc/passwd"), None);
/// assert_eq!(sanitize_relative_path("/etc/passwd"), None);
/// assert_eq!(sanitize_relative_path("C:\\Windows\\win.ini"), None);
/// ```
pub fn sanitize_relative_path(relative: &str) -> Option<PathBuf> {
    let normalized = relative.trim().replace('\\', "/");
    if normalized.is_empty() || normalized.starts_with('/') {
        return None;
    }
    let bytes = normalized.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return None;
    }

    let mut out = PathBuf::new();
    for part in normalized.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Returns `true` if `child` lies strictly below `parent`.
pub fn is_descendant(child: &Path, parent: &Path) -> bool {
    child != parent && child.starts_with(parent)
}

/// Drops duplicates and any path that is a descendant of another listed path.
///
/// The relative order of the surviving paths is preserved.
pub fn remove_nested_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for (idx, path) in paths.iter().enumerate() {
        if kept.contains(path) {
            continue;
        }
        let nested = paths
            .iter()
            .enumerate()
            .any(|(other_idx, other)| other_idx != idx && is_descendant(path, other));
        if !nested {
            kept.push(path.clone());
        }
    }
    kept
}

/// Collects every directory that contains one of the given relative file paths,
/// in directory order.
pub fn ancestor_directories<'a>(relative_paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut dirs = BTreeSet::new();
    for path in relative_paths {
        let mut end = 0;
        while let Some(offset) = path[end..].find('/') {
            end += offset;
            dirs.insert(path[..end].to_string());
            end += 1;
        }
    }
    let mut dirs: Vec<String> = dirs.into_iter().collect();
    dirs.sort_by(|a, b| compare_directory_order(a, b));
    dirs
}
