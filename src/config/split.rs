// src/config/split.rs

use super::parsing::parse_choice;
use crate::cli::SplitArgs;
use crate::errors::{ConfigError, Result};
use crate::separator::SeparatorStyle;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Modification time given to extracted files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampMode {
    /// Leave the time of writing.
    #[default]
    Current,
    /// Restore the time recorded in the block header, where the style has one.
    Original,
}

impl FromStr for TimestampMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current" | "now" => Ok(TimestampMode::Current),
            "original" => Ok(TimestampMode::Original),
            other => Err(format!(
                "Unknown timestamp mode '{}'. Expected current or original",
                other
            )),
        }
    }
}

impl fmt::Display for TimestampMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimestampMode::Current => "current",
            TimestampMode::Original => "original",
        })
    }
}

/// Options of a split run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitConfig {
    pub container: PathBuf,
    pub destination: PathBuf,
    /// `None` detects the style from the container.
    pub style: Option<SeparatorStyle>,
    /// Replace existing files instead of skipping them.
    pub force: bool,
    /// Write each file in its recorded encoding instead of UTF-8.
    pub respect_encoding: bool,
    pub timestamp_mode: TimestampMode,
    pub verify_checksums: bool,
    pub dry_run: bool,
}

impl SplitConfig {
    /// Options with every switch off: UTF-8 output, current timestamps, no overwrite.
    pub fn new(container: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            container: container.into(),
            destination: destination.into(),
            style: None,
            force: false,
            respect_encoding: false,
            timestamp_mode: TimestampMode::Current,
            verify_checksums: false,
            dry_run: false,
        }
    }

    /// Builds split options from the `split` command line arguments.
    pub fn from_cli(args: SplitArgs) -> Result<Self> {
        let style = parse_choice::<SeparatorStyle>(args.style.as_deref(), "--style")?;
        let timestamp_mode = args
            .timestamp_mode
            .parse::<TimestampMode>()
            .map_err(|reason| ConfigError::InvalidValue {
                option: "--timestamp-mode".to_string(),
                reason,
            })?;
        Ok(Self {
            container: args.container,
            destination: args.destination,
            style,
            force: args.force,
            respect_encoding: args.respect_encoding,
            timestamp_mode,
            verify_checksums: args.verify_checksums,
            dry_run: args.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn split_args(argv: &[&str]) -> SplitArgs {
        match Cli::parse_from(argv).command {
            Commands::Split(args) => args,
            Commands::Combine(_) => unreachable!(),
        }
    }

    #[test]
    fn test_from_cli() -> Result<()> {
        let config = SplitConfig::from_cli(split_args(&[
            "dirbundle",
            "split",
            "b.txt",
            "-d",
            "out",
            "--style",
            "machine",
            "--timestamp-mode",
            "Original",
            "--respect-encoding",
        ]))?;
        assert_eq!(config.style, Some(SeparatorStyle::MachineReadable));
        assert_eq!(config.timestamp_mode, TimestampMode::Original);
        assert_eq!(config.destination, PathBuf::from("out"));
        assert!(config.respect_encoding);
        Ok(())
    }

    #[test]
    fn test_bad_timestamp_mode() {
        let err = SplitConfig::from_cli(split_args(&[
            "dirbundle",
            "split",
            "b.txt",
            "--timestamp-mode",
            "yesterday",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("--timestamp-mode"));
    }
}
