use super::patterns::PatternMatcher;
use crate::config::DiscoveryConfig;
use crate::constants::PROJECT_IGNORE_FILENAME;
use crate::filtering::{is_default_excluded_dir, is_default_excluded_file, is_dot_name};
use crate::utils::to_posix;
use ignore::WalkBuilder;
use log::{debug, trace};
use std::path::{Path, PathBuf};

/// A directory to walk and how its entries are named.
#[derive(Debug, Clone)]
pub(super) struct WalkRoot {
    /// Canonical directory to walk.
    pub root: PathBuf,
    /// Prepended to every bundle path found under this root.
    pub prefix: Option<String>,
    /// Path of `root` inside its source, for roots reached through a link.
    /// Patterns and dot checks see `scope/<path under root>`.
    pub scope: Option<String>,
    /// Directory targets already being traversed above this root.
    pub chain: Vec<PathBuf>,
}

pub(super) fn join_posix(prefix: Option<&str>, rest: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() && !rest.is_empty() => format!("{}/{}", p, rest),
        Some(p) if !p.is_empty() => p.to_string(),
        _ => rest.to_string(),
    }
}

impl WalkRoot {
    pub(super) fn new(root: PathBuf, prefix: Option<String>) -> Self {
        Self {
            chain: vec![root.clone()],
            root,
            prefix,
            scope: None,
        }
    }

    /// Path of `path` as patterns see it: relative to its source.
    pub(super) fn scoped_path(&self, path: &Path) -> Option<String> {
        let inner = path.strip_prefix(&self.root).ok()?;
        Some(join_posix(self.scope.as_deref(), &to_posix(inner)))
    }

    /// Path of a scoped path as it appears in the bundle.
    pub(super) fn bundle_path(&self, scoped: &str) -> String {
        join_posix(self.prefix.as_deref(), scoped)
    }
}

/// Configures an `ignore::WalkBuilder` for one root.
///
/// Ignore files are only honoured when auto-ignore is on. The default
/// blocklist, dot names (when `prune_dot_paths`) and exclude patterns prune
/// whole subtrees in `filter_entry`, so nothing below them is visited.
pub(super) fn build_walker(
    root: &WalkRoot,
    config: &DiscoveryConfig,
    patterns: &PatternMatcher,
    prune_dot_paths: bool,
) -> WalkBuilder {
    let mut builder = WalkBuilder::new(&root.root);
    builder
        .standard_filters(false)
        .hidden(false)
        .parents(false)
        .ignore(false)
        .git_global(false)
        .git_ignore(config.use_auto_ignore)
        .git_exclude(config.use_auto_ignore)
        .require_git(false)
        .follow_links(false);
    if config.use_auto_ignore {
        builder.add_custom_ignore_filename(PROJECT_IGNORE_FILENAME);
    }
    debug!(
        "Walker for {}: auto-ignore={}, default excludes={}, prune dot paths={}",
        root.root.display(),
        config.use_auto_ignore,
        config.use_default_excludes,
        prune_dot_paths
    );

    let use_default_excludes = config.use_default_excludes;
    let patterns = patterns.clone();
    let root = root.clone();
    builder.filter_entry(move |entry| {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());

        if use_default_excludes {
            let blocked = if is_dir {
                is_default_excluded_dir(&name)
            } else {
                is_default_excluded_file(&name)
            };
            if blocked {
                trace!("Pruned by default excludes: {}", entry.path().display());
                return false;
            }
        }
        if prune_dot_paths && is_dot_name(&name) {
            trace!("Pruned dot path: {}", entry.path().display());
            return false;
        }
        match root.scoped_path(entry.path()) {
            Some(scoped) if patterns.is_excluded(&scoped, is_dir) => {
                trace!("Pruned by exclude pattern: {}", scoped);
                false
            }
            _ => true,
        }
    });
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn walk_names(root: &WalkRoot, config: &DiscoveryConfig, prune: bool) -> Vec<String> {
        let patterns = PatternMatcher::new(config).expect("patterns");
        let mut names: Vec<String> = build_walker(root, config, &patterns, prune)
            .build()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
            .filter_map(|e| root.scoped_path(e.path()))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_join_posix() {
        assert_eq!(join_posix(None, "a.txt"), "a.txt");
        assert_eq!(join_posix(Some("src"), "a.txt"), "src/a.txt");
        assert_eq!(join_posix(Some(""), "a.txt"), "a.txt");
        assert_eq!(join_posix(Some("src"), ""), "src");
    }

    #[test]
    fn test_prunes_blocklist_dots_and_patterns() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let root_path = dir.path().canonicalize()?;
        fs::create_dir_all(root_path.join("node_modules/pkg"))?;
        fs::create_dir_all(root_path.join(".hidden"))?;
        fs::create_dir_all(root_path.join("logs"))?;
        fs::write(root_path.join("node_modules/pkg/index.js"), "x")?;
        fs::write(root_path.join(".hidden/secret.txt"), "x")?;
        fs::write(root_path.join("logs/today.log"), "x")?;
        fs::write(root_path.join("Cargo.lock"), "x")?;
        fs::write(root_path.join("main.rs"), "x")?;

        let root = WalkRoot::new(root_path, None);
        let config = DiscoveryConfig {
            exclude_patterns: vec!["logs/".to_string()],
            ..DiscoveryConfig::default()
        };
        assert_eq!(walk_names(&root, &config, true), vec!["main.rs"]);

        let open = DiscoveryConfig {
            use_default_excludes: false,
            ..DiscoveryConfig::default()
        };
        let names = walk_names(&root, &open, false);
        assert!(names.contains(&"node_modules/pkg/index.js".to_string()));
        assert!(names.contains(&".hidden/secret.txt".to_string()));
        assert!(names.contains(&"Cargo.lock".to_string()));
        Ok(())
    }

    #[test]
    fn test_auto_ignore_files() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let root_path = dir.path().canonicalize()?;
        fs::write(root_path.join(".gitignore"), "*.tmp\n")?;
        fs::write(root_path.join(PROJECT_IGNORE_FILENAME), "draft.md\n")?;
        fs::write(root_path.join("a.tmp"), "x")?;
        fs::write(root_path.join("draft.md"), "x")?;
        fs::write(root_path.join("keep.md"), "x")?;

        let root = WalkRoot::new(root_path, None);
        assert_eq!(
            walk_names(&root, &DiscoveryConfig::default(), true),
            vec!["keep.md"]
        );

        let no_auto = DiscoveryConfig {
            use_auto_ignore: false,
            ..DiscoveryConfig::default()
        };
        assert_eq!(
            walk_names(&root, &no_auto, true),
            vec!["a.tmp", "draft.md", "keep.md"]
        );
        Ok(())
    }
}
