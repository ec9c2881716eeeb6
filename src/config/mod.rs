//! Defines the core `Config` struct and related types for application configuration.
//!
//! This module consolidates all the settings parsed and validated from the CLI
//! (or set through [`ConfigBuilder`]), making them available to the rest of the
//! pipeline in a structured and type-safe manner. Options left unset by the
//! caller can later be filled from preset files with
//! [`Config::apply_global_settings`].

use crate::encoding::{Charset, EncodingOptions};
use crate::presets::GlobalSettings;
use crate::security::SecurityMode;
use crate::separator::{LineEnding, SeparatorStyle};
use log::{debug, warn};
use std::path::PathBuf;

pub use builder::ConfigBuilder;
pub use split::{SplitConfig, TimestampMode};
mod builder;
mod builder_logic;
mod parsing;
pub mod path_resolve;
mod split;

/// Configuration options related to file discovery and filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Canonicalized source directories to walk.
    pub sources: Vec<PathBuf>,
    /// Manifest of paths or globs, one per line.
    pub input_file: Option<PathBuf>,
    /// Intro files emitted first, in this order.
    pub include_files: Vec<PathBuf>,
    /// Global size ceiling in bytes.
    pub max_file_size: Option<u64>,
    /// Extensions (lowercase, no dot) to include. If `Some`, only these are bundled.
    pub include_extensions: Option<Vec<String>>,
    /// Extensions (lowercase, no dot) to exclude. Takes precedence over inclusion.
    pub exclude_extensions: Option<Vec<String>>,
    /// Gitignore-style patterns to exclude.
    pub exclude_patterns: Vec<String>,
    /// Gitignore-style patterns a file must match.
    pub include_patterns: Vec<String>,
    /// Files holding additional exclude patterns.
    pub exclude_paths_files: Vec<PathBuf>,
    /// Files holding additional include patterns.
    pub include_paths_files: Vec<PathBuf>,
    /// Skip VCS metadata, dependency and build directories.
    pub use_default_excludes: bool,
    /// Read `.gitignore` and `.dirbundleignore` from the source directories.
    pub use_auto_ignore: bool,
    pub include_dot_paths: bool,
    pub include_binary: bool,
    pub include_symlinks: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            input_file: None,
            include_files: Vec::new(),
            max_file_size: None,
            include_extensions: None,
            exclude_extensions: None,
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
            exclude_paths_files: Vec::new(),
            include_paths_files: Vec::new(),
            use_default_excludes: true,
            use_auto_ignore: true,
            include_dot_paths: false,
            include_binary: false,
            include_symlinks: false,
        }
    }
}

/// Configuration options related to writing the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Container path as given. May be `None` only for a dry run.
    pub output_path: Option<PathBuf>,
    /// `None` means [`SeparatorStyle::Standard`] unless a preset overrides it.
    pub separator_style: Option<SeparatorStyle>,
    pub line_ending: Option<LineEnding>,
    /// Skip blocks whose content was already emitted.
    pub deduplicate: bool,
    /// Write `<stem>_filelist.txt` and `<stem>_dirlist.txt`.
    pub write_lists: bool,
    /// Append `_YYYYMMDD_HHMMSS` to the container name.
    pub add_timestamp: bool,
    /// Overwrite an existing container without asking.
    pub force: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: None,
            separator_style: None,
            line_ending: None,
            deduplicate: true,
            write_lists: false,
            add_timestamp: false,
            force: false,
        }
    }
}

impl OutputConfig {
    pub fn style(&self) -> SeparatorStyle {
        self.separator_style.unwrap_or_default()
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending.unwrap_or_default()
    }
}

/// Which preset files are loaded and which group is consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetConfig {
    pub preset_files: Vec<PathBuf>,
    /// Restricts resolution to this group.
    pub group: Option<String>,
    /// Ignore `preset_files` entirely.
    pub disabled: bool,
}

impl PresetConfig {
    /// `true` if any preset file should be loaded.
    pub fn is_active(&self) -> bool {
        !self.disabled && !self.preset_files.is_empty()
    }
}

/// Represents the fully validated configuration of a combine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Configuration for the discovery stage.
    pub discovery: DiscoveryConfig,
    /// How files are decoded and validated.
    pub encoding: EncodingOptions,
    /// Configuration for the output stage.
    pub output: OutputConfig,
    /// `None` means no scan unless preset settings request one.
    pub security: Option<SecurityMode>,
    pub presets: PresetConfig,
    /// If `true`, print the files that would be bundled instead of writing them.
    pub dry_run: bool,
}

fn union_into(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

fn union_extensions(target: &mut Option<Vec<String>>, extra: &[String]) {
    if extra.is_empty() {
        return;
    }
    union_into(target.get_or_insert_with(Vec::new), extra);
}

impl Config {
    /// Effective security mode.
    pub fn security_mode(&self) -> SecurityMode {
        self.security.unwrap_or_default()
    }

    /// Fills every option the caller left unset from merged preset settings.
    ///
    /// Explicit values always win. Pattern and extension lists are unioned, and
    /// boolean inclusion flags can only be switched on.
    ///
    /// # Examples
    /// ```
    /// use dirbundle::config::Config;
    /// use dirbundle::presets::GlobalSettings;
    /// use dirbundle::separator::SeparatorStyle;
    ///
    /// let mut config = Config::new_for_test();
    /// config.output.separator_style = Some(SeparatorStyle::Detailed);
    /// let global = GlobalSettings {
    ///     separator_style: Some(SeparatorStyle::Markdown),
    ///     max_file_size: Some(4096),
    ///     exclude_patterns: vec!["*.log".to_string()],
    ///     ..Default::default()
    /// };
    /// config.apply_global_settings(&global);
    /// assert_eq!(config.output.separator_style, Some(SeparatorStyle::Detailed));
    /// assert_eq!(config.discovery.max_file_size, Some(4096));
    /// assert_eq!(config.discovery.exclude_patterns, vec!["*.log"]);
    /// ```
    pub fn apply_global_settings(&mut self, global: &GlobalSettings) {
        if self.encoding.target.is_none() {
            match global.encoding {
                Some(charset) if charset.is_conversion_target() => {
                    self.encoding.target = Some(charset)
                }
                Some(charset) => warn!(
                    "Ignoring preset encoding '{}': not a supported conversion target",
                    charset
                ),
                None => {}
            }
        }
        self.output.separator_style = self.output.separator_style.or(global.separator_style);
        self.output.line_ending = self.output.line_ending.or(global.line_ending);
        self.discovery.max_file_size = self.discovery.max_file_size.or(global.max_file_size);
        self.security = self.security.or(global.security_check);
        self.discovery.include_dot_paths |= global.include_dot_paths.unwrap_or(false);
        self.discovery.include_binary |= global.include_binary.unwrap_or(false);
        union_into(&mut self.discovery.include_patterns, &global.include_patterns);
        union_into(&mut self.discovery.exclude_patterns, &global.exclude_patterns);
        union_extensions(&mut self.discovery.include_extensions, &global.include_extensions);
        union_extensions(&mut self.discovery.exclude_extensions, &global.exclude_extensions);
        debug!("Applied preset global settings: {:?}", self);
    }

    /// Creates a default `Config` for testing purposes.
    ///
    /// This function is hidden from public documentation and is intended for
    /// use in tests and doc tests only.
    #[doc(hidden)]
    pub fn new_for_test() -> Self {
        Self {
            discovery: DiscoveryConfig {
                sources: vec![PathBuf::from(".")],
                ..DiscoveryConfig::default()
            },
            encoding: EncodingOptions::default(),
            output: OutputConfig {
                output_path: Some(PathBuf::from("bundle.txt")),
                ..OutputConfig::default()
            },
            security: None,
            presets: PresetConfig::default(),
            dry_run: false,
        }
    }
}

/// Target charsets accepted by `--target-encoding`, for help and error text.
pub fn supported_targets() -> Vec<&'static str> {
    [
        Charset::Utf8,
        Charset::Utf16,
        Charset::Utf16Le,
        Charset::Utf16Be,
        Charset::Ascii,
        Charset::Latin1,
        Charset::Windows1252,
    ]
    .iter()
    .map(|c| c.name())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_global_settings_fills_unset_values() {
        let mut config = Config::new_for_test();
        config.discovery.exclude_extensions = Some(vec!["tmp".to_string()]);
        let global = GlobalSettings {
            encoding: Some(Charset::Latin1),
            line_ending: Some(LineEnding::Crlf),
            security_check: Some(SecurityMode::Warn),
            include_binary: Some(true),
            include_extensions: vec!["md".to_string()],
            exclude_extensions: vec!["log".to_string(), "tmp".to_string()],
            ..Default::default()
        };
        config.apply_global_settings(&global);
        assert_eq!(config.encoding.target, Some(Charset::Latin1));
        assert_eq!(config.output.line_ending(), LineEnding::Crlf);
        assert_eq!(config.security_mode(), SecurityMode::Warn);
        assert!(config.discovery.include_binary);
        assert_eq!(config.discovery.include_extensions, Some(vec!["md".to_string()]));
        assert_eq!(
            config.discovery.exclude_extensions,
            Some(vec!["tmp".to_string(), "log".to_string()])
        );
    }

    #[test]
    fn test_explicit_values_win() {
        let mut config = Config::new_for_test();
        config.security = Some(SecurityMode::Off);
        config.discovery.max_file_size = Some(10);
        let global = GlobalSettings {
            security_check: Some(SecurityMode::Abort),
            max_file_size: Some(99),
            include_dot_paths: Some(false),
            ..Default::default()
        };
        config.apply_global_settings(&global);
        assert_eq!(config.security_mode(), SecurityMode::Off);
        assert_eq!(config.discovery.max_file_size, Some(10));
        assert!(!config.discovery.include_dot_paths);
        assert_eq!(config.discovery.include_extensions, None);
    }

    #[test]
    fn test_defaults() {
        let discovery = DiscoveryConfig::default();
        assert!(discovery.use_default_excludes);
        assert!(discovery.use_auto_ignore);
        assert!(OutputConfig::default().deduplicate);
        assert_eq!(OutputConfig::default().style(), SeparatorStyle::Standard);
        assert!(supported_targets().contains(&"utf-16-le"));
    }
}
