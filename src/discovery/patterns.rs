use crate::config::DiscoveryConfig;
use crate::errors::{io_error_with_path, ConfigError, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Gitignore-syntax include and exclude matchers over POSIX relative paths.
///
/// Both are rooted at `.`, so they match the relative path of a candidate
/// regardless of which source root it came from.
#[derive(Debug, Clone)]
pub(crate) struct PatternMatcher {
    exclude: Gitignore,
    include: Option<Gitignore>,
}

fn build_matcher(
    inline: &[String],
    files: &[PathBuf],
    option: &str,
) -> Result<Option<Gitignore>> {
    let mut lines: Vec<String> = inline.to_vec();
    for file in files {
        let text = fs::read_to_string(file).map_err(|e| io_error_with_path(e, file))?;
        lines.extend(text.lines().map(str::to_string));
        debug!("Read {} pattern file {}", option, file.display());
    }
    let lines: Vec<&str> = lines
        .iter()
        .map(|l| l.trim_end())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();
    if lines.is_empty() {
        return Ok(None);
    }

    let mut builder = GitignoreBuilder::new(".");
    for line in &lines {
        builder
            .add_line(None, line)
            .map_err(|e| ConfigError::InvalidValue {
                option: option.to_string(),
                reason: format!("invalid pattern '{}': {}", line, e),
            })?;
    }
    let matcher = builder.build().map_err(|e| ConfigError::InvalidValue {
        option: option.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(matcher))
}

impl PatternMatcher {
    /// Compiles inline patterns and the contents of pattern files.
    pub(crate) fn new(config: &DiscoveryConfig) -> Result<Self> {
        let exclude = build_matcher(
            &config.exclude_patterns,
            &config.exclude_paths_files,
            "--exclude-patterns",
        )?
        .unwrap_or_else(Gitignore::empty);
        let include = build_matcher(
            &config.include_patterns,
            &config.include_paths_files,
            "--include-patterns",
        )?;
        Ok(Self { exclude, include })
    }

    /// `true` if the path, or one of its parents, matches an exclude pattern.
    pub(crate) fn is_excluded(&self, relative: &str, is_dir: bool) -> bool {
        self.exclude
            .matched_path_or_any_parents(Path::new(relative), is_dir)
            .is_ignore()
    }

    /// `true` if there are no include patterns or the file matches one.
    pub(crate) fn is_included(&self, relative: &str) -> bool {
        match &self.include {
            Some(include) => include
                .matched_path_or_any_parents(Path::new(relative), false)
                .is_ignore(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn matcher(exclude: &[&str], include: &[&str]) -> Result<PatternMatcher> {
        let config = DiscoveryConfig {
            exclude_patterns: exclude.iter().map(|s| s.to_string()).collect(),
            include_patterns: include.iter().map(|s| s.to_string()).collect(),
            ..DiscoveryConfig::default()
        };
        PatternMatcher::new(&config)
    }

    #[test]
    fn test_exclude_matches_files_and_parents() -> Result<()> {
        let m = matcher(&["*.log", "build/", "/docs/private"], &[])?;
        assert!(m.is_excluded("app.log", false));
        assert!(m.is_excluded("nested/app.log", false));
        assert!(m.is_excluded("build", true));
        assert!(m.is_excluded("build/out.txt", false));
        assert!(m.is_excluded("docs/private/a.md", false));
        assert!(!m.is_excluded("src/docs/private/a.md", false));
        assert!(!m.is_excluded("src/main.rs", false));
        Ok(())
    }

    #[test]
    fn test_negation_reincludes() -> Result<()> {
        let m = matcher(&["*.md", "!README.md"], &[])?;
        assert!(m.is_excluded("guide.md", false));
        assert!(!m.is_excluded("README.md", false));
        Ok(())
    }

    #[test]
    fn test_include_patterns() -> Result<()> {
        let m = matcher(&[], &["src/", "*.toml"])?;
        assert!(m.is_included("src/lib.rs"));
        assert!(m.is_included("Cargo.toml"));
        assert!(!m.is_included("README.md"));
        assert!(matcher(&[], &[])?.is_included("anything"));
        Ok(())
    }

    #[test]
    fn test_pattern_files_are_merged() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let first = dir.path().join("a.ignore");
        let second = dir.path().join("b.ignore");
        fs::write(&first, "# comment\n*.tmp\n\n")?;
        fs::write(&second, "secrets/\n")?;
        let config = DiscoveryConfig {
            exclude_paths_files: vec![first, second],
            ..DiscoveryConfig::default()
        };
        let m = PatternMatcher::new(&config)?;
        assert!(m.is_excluded("x.tmp", false));
        assert!(m.is_excluded("secrets/key.pem", false));
        assert!(!m.is_excluded("comment", false));
        Ok(())
    }

    #[test]
    fn test_missing_pattern_file() {
        let config = DiscoveryConfig {
            include_paths_files: vec![PathBuf::from("no/such/patterns.txt")],
            ..DiscoveryConfig::default()
        };
        assert!(PatternMatcher::new(&config).is_err());
    }
}
