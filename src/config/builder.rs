// src/config/builder.rs

use super::builder_logic::validate_builder_options;
use super::parsing::{normalize_extensions, parse_choice, parse_max_size, parse_target_encoding};
use super::path_resolve::resolve_source_dir;
use super::{Config, DiscoveryConfig, OutputConfig, PresetConfig};
use crate::cli::CombineArgs;
use crate::encoding::EncodingOptions;
use crate::errors::Result;
use crate::security::SecurityMode;
use crate::separator::{LineEnding, SeparatorStyle};
use std::path::PathBuf;

/// A builder for creating a [`Config`] programmatically.
///
/// Values are kept as given (strings for sizes, styles and modes) and parsed
/// and validated together in [`ConfigBuilder::build`], so the CLI and library
/// callers see the same errors.
///
/// # Examples
///
/// ```no_run
/// use dirbundle::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .source("./my-project")
///     .output_file("bundle.md")
///     .separator_style("markdown")
///     .max_file_size("1MiB")
///     .build()
///     .unwrap();
/// assert_eq!(config.discovery.max_file_size, Some(1024 * 1024));
/// ```
#[derive(Debug, Default, Clone)]
pub struct ConfigBuilder {
    pub(super) sources: Vec<PathBuf>,
    pub(super) input_file: Option<PathBuf>,
    pub(super) include_files: Vec<PathBuf>,
    pub(super) output_file: Option<PathBuf>,
    pub(super) separator_style: Option<String>,
    pub(super) line_ending: Option<String>,
    pub(super) target_encoding: Option<String>,
    pub(super) abort_on_encoding_error: Option<bool>,
    pub(super) max_file_size: Option<String>,
    pub(super) include_extensions: Option<Vec<String>>,
    pub(super) exclude_extensions: Option<Vec<String>>,
    pub(super) exclude_patterns: Vec<String>,
    pub(super) include_patterns: Vec<String>,
    pub(super) exclude_paths_files: Vec<PathBuf>,
    pub(super) include_paths_files: Vec<PathBuf>,
    pub(super) no_default_excludes: Option<bool>,
    pub(super) no_auto_ignore: Option<bool>,
    pub(super) include_dot_paths: Option<bool>,
    pub(super) include_binary: Option<bool>,
    pub(super) include_symlinks: Option<bool>,
    pub(super) security_check: Option<String>,
    pub(super) preset_files: Vec<PathBuf>,
    pub(super) preset_group: Option<String>,
    pub(super) disable_presets: Option<bool>,
    pub(super) no_dedup: Option<bool>,
    pub(super) lists: Option<bool>,
    pub(super) add_timestamp: Option<bool>,
    pub(super) force: Option<bool>,
    pub(super) dry_run: Option<bool>,
}

impl ConfigBuilder {
    /// Creates a new `ConfigBuilder` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `ConfigBuilder` from the `combine` command line arguments.
    pub fn from_cli(args: CombineArgs) -> Self {
        Self {
            sources: args.sources,
            input_file: args.input_file,
            include_files: args.include_files,
            output_file: args.output,
            separator_style: args.separator_style,
            line_ending: args.line_ending,
            target_encoding: args.target_encoding,
            abort_on_encoding_error: Some(args.abort_on_encoding_error),
            max_file_size: args.max_file_size,
            include_extensions: args.include_extensions,
            exclude_extensions: args.exclude_extensions,
            exclude_patterns: args.exclude_patterns,
            include_patterns: args.include_patterns,
            exclude_paths_files: args.exclude_paths_files,
            include_paths_files: args.include_paths_files,
            no_default_excludes: Some(args.no_default_excludes),
            no_auto_ignore: Some(args.no_auto_ignore),
            include_dot_paths: Some(args.include_dot_paths),
            include_binary: Some(args.include_binary),
            include_symlinks: Some(args.include_symlinks),
            security_check: args.security_check,
            preset_files: args.preset_files,
            preset_group: args.preset_group,
            disable_presets: Some(args.disable_presets),
            no_dedup: Some(args.no_dedup),
            lists: Some(args.lists),
            add_timestamp: Some(args.add_timestamp),
            force: Some(args.force),
            dry_run: Some(args.dry_run),
        }
    }

    /// Adds a source directory to walk.
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(path.into());
        self
    }
    /// Sets the manifest of paths or globs.
    pub fn input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_file = Some(path.into());
        self
    }
    /// Adds an intro file, emitted before all discovered files.
    pub fn include_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_files.push(path.into());
        self
    }
    /// Sets the container path.
    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }
    /// Sets the separator style by name.
    pub fn separator_style(mut self, style: impl Into<String>) -> Self {
        self.separator_style = Some(style.into());
        self
    }
    /// Sets the line ending (`lf` or `crlf`).
    pub fn line_ending(mut self, line_ending: impl Into<String>) -> Self {
        self.line_ending = Some(line_ending.into());
        self
    }
    /// Sets the charset every file is validated against.
    pub fn target_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.target_encoding = Some(encoding.into());
        self
    }
    pub fn abort_on_encoding_error(mut self, abort: bool) -> Self {
        self.abort_on_encoding_error = Some(abort);
        self
    }
    /// Sets the global size ceiling (e.g. `"50KB"`).
    pub fn max_file_size(mut self, size: impl Into<String>) -> Self {
        self.max_file_size = Some(size.into());
        self
    }
    pub fn include_extensions(mut self, exts: Vec<String>) -> Self {
        self.include_extensions = Some(exts);
        self
    }
    pub fn exclude_extensions(mut self, exts: Vec<String>) -> Self {
        self.exclude_extensions = Some(exts);
        self
    }
    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }
    pub fn include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }
    pub fn exclude_paths_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude_paths_files.push(path.into());
        self
    }
    pub fn include_paths_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths_files.push(path.into());
        self
    }
    pub fn no_default_excludes(mut self, disable: bool) -> Self {
        self.no_default_excludes = Some(disable);
        self
    }
    pub fn no_auto_ignore(mut self, disable: bool) -> Self {
        self.no_auto_ignore = Some(disable);
        self
    }
    pub fn include_dot_paths(mut self, include: bool) -> Self {
        self.include_dot_paths = Some(include);
        self
    }
    pub fn include_binary(mut self, include: bool) -> Self {
        self.include_binary = Some(include);
        self
    }
    pub fn include_symlinks(mut self, include: bool) -> Self {
        self.include_symlinks = Some(include);
        self
    }
    /// Sets the security mode (`none`, `warn`, `skip` or `abort`).
    pub fn security_check(mut self, mode: impl Into<String>) -> Self {
        self.security_check = Some(mode.into());
        self
    }
    /// Adds a YAML preset file.
    pub fn preset_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.preset_files.push(path.into());
        self
    }
    pub fn preset_group(mut self, group: impl Into<String>) -> Self {
        self.preset_group = Some(group.into());
        self
    }
    pub fn disable_presets(mut self, disable: bool) -> Self {
        self.disable_presets = Some(disable);
        self
    }
    pub fn no_dedup(mut self, disable: bool) -> Self {
        self.no_dedup = Some(disable);
        self
    }
    pub fn lists(mut self, lists: bool) -> Self {
        self.lists = Some(lists);
        self
    }
    pub fn add_timestamp(mut self, add: bool) -> Self {
        self.add_timestamp = Some(add);
        self
    }
    pub fn force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    /// Validates the options and builds the final `Config`.
    ///
    /// Source directories are canonicalized here, so a missing source fails
    /// before any work starts.
    ///
    /// # Errors
    /// Returns a config error for invalid values or combinations, and
    /// `NotFound`/`PermissionDenied` for unresolvable source directories.
    pub fn build(self) -> Result<Config> {
        validate_builder_options(&self)?;

        let separator_style =
            parse_choice::<SeparatorStyle>(self.separator_style.as_deref(), "--separator-style")?;
        let line_ending = parse_choice::<LineEnding>(self.line_ending.as_deref(), "--line-ending")?;
        let security =
            parse_choice::<SecurityMode>(self.security_check.as_deref(), "--security-check")?;
        let target = parse_target_encoding(self.target_encoding.as_deref())?;
        let max_file_size = parse_max_size(self.max_file_size.as_deref())?;

        let sources = self
            .sources
            .iter()
            .map(|s| resolve_source_dir(s))
            .collect::<Result<Vec<_>>>()?;

        let discovery = DiscoveryConfig {
            sources,
            input_file: self.input_file,
            include_files: self.include_files,
            max_file_size,
            include_extensions: normalize_extensions(self.include_extensions),
            exclude_extensions: normalize_extensions(self.exclude_extensions),
            exclude_patterns: self.exclude_patterns,
            include_patterns: self.include_patterns,
            exclude_paths_files: self.exclude_paths_files,
            include_paths_files: self.include_paths_files,
            use_default_excludes: !self.no_default_excludes.unwrap_or(false),
            use_auto_ignore: !self.no_auto_ignore.unwrap_or(false),
            include_dot_paths: self.include_dot_paths.unwrap_or(false),
            include_binary: self.include_binary.unwrap_or(false),
            include_symlinks: self.include_symlinks.unwrap_or(false),
        };

        let output = OutputConfig {
            output_path: self.output_file,
            separator_style,
            line_ending,
            deduplicate: !self.no_dedup.unwrap_or(false),
            write_lists: self.lists.unwrap_or(false),
            add_timestamp: self.add_timestamp.unwrap_or(false),
            force: self.force.unwrap_or(false),
        };

        Ok(Config {
            discovery,
            encoding: EncodingOptions {
                target,
                strict: self.abort_on_encoding_error.unwrap_or(false),
            },
            output,
            security,
            presets: PresetConfig {
                preset_files: self.preset_files,
                group: self.preset_group,
                disabled: self.disable_presets.unwrap_or(false),
            },
            dry_run: self.dry_run.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::encoding::Charset;
    use crate::errors::{ConfigError, Error};
    use clap::Parser;
    use tempfile::tempdir;

    fn combine_args(extra: &[&str]) -> CombineArgs {
        let mut argv = vec!["dirbundle", "combine"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Combine(args) => args,
            Commands::Split(_) => unreachable!(),
        }
    }

    #[test]
    fn test_basic_config_creation() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let src = dir.path().to_str().unwrap();
        let config = ConfigBuilder::from_cli(combine_args(&["-s", src, "-o", "out.txt"])).build()?;
        assert_eq!(config.discovery.sources.len(), 1);
        assert!(config.discovery.sources[0].is_absolute());
        assert!(config.discovery.use_default_excludes);
        assert!(config.discovery.use_auto_ignore);
        assert!(config.output.deduplicate);
        assert_eq!(config.output.separator_style, None);
        assert_eq!(config.security, None);
        assert!(!config.encoding.strict);
        Ok(())
    }

    #[test]
    fn test_flags_are_parsed() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let src = dir.path().to_str().unwrap();
        let config = ConfigBuilder::from_cli(combine_args(&[
            "-s",
            src,
            "-o",
            "out.md",
            "--separator-style",
            "Markdown",
            "--line-ending",
            "crlf",
            "--target-encoding",
            "latin1",
            "--abort-on-encoding-error",
            "--max-file-size",
            "2KiB",
            "--exclude-extensions",
            ".LOG",
            "--security-check",
            "skip",
            "--no-dedup",
            "--no-auto-ignore",
        ]))
        .build()?;
        assert_eq!(config.output.style(), SeparatorStyle::Markdown);
        assert_eq!(config.output.line_ending(), LineEnding::Crlf);
        assert_eq!(config.encoding.target, Some(Charset::Latin1));
        assert!(config.encoding.strict);
        assert_eq!(config.discovery.max_file_size, Some(2048));
        assert_eq!(config.discovery.exclude_extensions, Some(vec!["log".to_string()]));
        assert_eq!(config.security, Some(SecurityMode::Skip));
        assert!(!config.output.deduplicate);
        assert!(!config.discovery.use_auto_ignore);
        Ok(())
    }

    #[test]
    fn test_missing_input_and_output() {
        let err = ConfigBuilder::new().output_file("x").build().unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingInput)));

        let err = ConfigBuilder::new().input_file("list.txt").build().unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingOutput)));
    }

    #[test]
    fn test_dry_run_needs_no_output() -> anyhow::Result<()> {
        let config = ConfigBuilder::new()
            .input_file("list.txt")
            .dry_run(true)
            .build()?;
        assert!(config.dry_run);
        assert_eq!(config.output.output_path, None);
        Ok(())
    }

    #[test]
    fn test_preset_group_rules() {
        let err = ConfigBuilder::new()
            .input_file("l")
            .output_file("o")
            .preset_group("docs")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingDependency { .. })
        ));

        let err = ConfigBuilder::new()
            .input_file("l")
            .output_file("o")
            .preset_file("p.yaml")
            .preset_group("docs")
            .disable_presets(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Conflict { .. })));
    }

    #[test]
    fn test_invalid_values() {
        let base = ConfigBuilder::new().input_file("l").output_file("o");
        let err = base.clone().separator_style("fancy").build().unwrap_err();
        assert!(err.to_string().contains("--separator-style"));
        let err = base.clone().security_check("maybe").build().unwrap_err();
        assert!(err.to_string().contains("--security-check"));
        let err = base.max_file_size("lots").build().unwrap_err();
        assert!(err.to_string().contains("--max-file-size"));
    }

    #[test]
    fn test_missing_source_dir() {
        let err = ConfigBuilder::new()
            .source("definitely/not/here")
            .output_file("o")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
