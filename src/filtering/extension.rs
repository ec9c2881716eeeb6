// src/filtering/extension.rs

use crate::config::DiscoveryConfig;
use std::path::Path;

/// Checks if a path passes the include/exclude extension filters defined in `DiscoveryConfig`.
///
/// The filtering logic follows these rules in order:
///
/// 1.  **Exclusion Precedence:** If `exclude_extensions` is `Some` and contains the
///     file's extension, the function returns `false`.
/// 2.  **Inclusion Requirement:** If `include_extensions` is `Some`, the file must have an
///     extension listed there.
/// 3.  **Default Pass:** Otherwise the function returns `true`.
///
/// The comparison is always case-insensitive; configured extensions are stored
/// lowercase and without a leading dot.
///
/// # Examples
///
/// ```
/// use dirbundle::config::DiscoveryConfig;
/// use dirbundle::filtering::passes_extension_filters;
/// use std::path::Path;
///
/// let mut discovery = DiscoveryConfig::default();
/// assert!(passes_extension_filters(Path::new("Makefile"), &discovery));
///
/// discovery.include_extensions = Some(vec!["rs".to_string(), "toml".to_string()]);
/// discovery.exclude_extensions = Some(vec!["toml".to_string()]);
/// assert!(passes_extension_filters(Path::new("src/main.RS"), &discovery));
/// assert!(!passes_extension_filters(Path::new("Cargo.toml"), &discovery));
/// assert!(!passes_extension_filters(Path::new("Makefile"), &discovery));
/// ```
pub fn passes_extension_filters(path: &Path, discovery: &DiscoveryConfig) -> bool {
    let extension = path
        .extension()
        .and_then(|os_str| os_str.to_str())
        .map(|s| s.to_lowercase());

    if let (Some(exclude), Some(ext)) = (&discovery.exclude_extensions, &extension) {
        if exclude.contains(ext) {
            return false;
        }
    }

    match (&discovery.include_extensions, &extension) {
        (Some(include), Some(ext)) => include.contains(ext),
        (Some(_), None) => false,
        (None, _) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery(include: Option<Vec<&str>>, exclude: Option<Vec<&str>>) -> DiscoveryConfig {
        DiscoveryConfig {
            include_extensions: include.map(|v| v.iter().map(|s| s.to_string()).collect()),
            exclude_extensions: exclude.map(|v| v.iter().map(|s| s.to_string()).collect()),
            ..DiscoveryConfig::default()
        }
    }

    #[test]
    fn test_ext_no_filters() {
        let d = discovery(None, None);
        assert!(passes_extension_filters(Path::new("file.txt"), &d));
        assert!(passes_extension_filters(Path::new("file"), &d));
    }

    #[test]
    fn test_ext_include() {
        let d = discovery(Some(vec!["txt", "md"]), None);
        assert!(passes_extension_filters(Path::new("FILE.MD"), &d));
        assert!(!passes_extension_filters(Path::new("file.rs"), &d));
        assert!(!passes_extension_filters(Path::new("file"), &d));
    }

    #[test]
    fn test_ext_exclude_wins() {
        let d = discovery(Some(vec!["txt", "md"]), Some(vec!["md"]));
        assert!(passes_extension_filters(Path::new("notes.txt"), &d));
        assert!(!passes_extension_filters(Path::new("notes.md"), &d));
        assert!(passes_extension_filters(
            Path::new("file"),
            &discovery(None, Some(vec!["log"]))
        ));
    }
}
