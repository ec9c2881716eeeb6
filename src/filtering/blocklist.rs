// src/filtering/blocklist.rs

use crate::constants::{DEFAULT_EXCLUDED_DIRS, DEFAULT_EXCLUDED_FILES};

/// Checks a directory name against the built-in blocklist (exact match).
#[inline]
pub fn is_default_excluded_dir(name: &str) -> bool {
    DEFAULT_EXCLUDED_DIRS.contains(&name)
}

/// Checks a file name against the built-in blocklist.
///
/// The comparison is case-insensitive, since tools such as `Thumbs.db`
/// generators are not consistent about casing.
///
/// # Examples
///
/// ```
/// use dirbundle::filtering::is_default_excluded_file;
///
/// assert!(is_default_excluded_file("Cargo.lock"));
/// assert!(is_default_excluded_file(".ds_store"));
/// assert!(!is_default_excluded_file("Cargo.toml"));
/// ```
pub fn is_default_excluded_file(name: &str) -> bool {
    DEFAULT_EXCLUDED_FILES
        .iter()
        .any(|blocked| blocked.eq_ignore_ascii_case(name))
}
