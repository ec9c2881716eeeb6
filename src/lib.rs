//! `dirbundle` bundles a tree of text files into a single container file and
//! splits such a container back into files.
//!
//! A combine run is a pipeline of four stages:
//! 1.  **Discover**: walk the source directories (or an explicit manifest),
//!     apply ignore files, filters and presets, and sort the candidates into
//!     bundle order.
//! 2.  **Scan**: optionally look for secrets and abort, skip or warn.
//! 3.  **Write**: decode every file, apply preset transformations and write it
//!     into the container in one of four separator styles, skipping duplicate
//!     content.
//! 4.  **Report**: write the optional sibling list files and return a
//!     [`ProcessingResult`].
//!
//! [`split`] is the reverse codec: it parses any of the four styles and
//! recreates the files below a destination directory.
//!
//! # Example: Library Usage
//!
//! ```
//! use dirbundle::{combine, split, CancellationToken, ConfigBuilder, DenyOverwrite, SplitConfig};
//! use std::fs;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let project = tempfile::tempdir()?;
//! fs::write(project.path().join("README.md"), "# Demo\n")?;
//! fs::create_dir(project.path().join("src"))?;
//! fs::write(project.path().join("src/lib.rs"), "pub fn demo() {}\n")?;
//!
//! let scratch = tempfile::tempdir()?;
//! let bundle = scratch.path().join("bundle.txt");
//! let config = ConfigBuilder::new()
//!     .source(project.path())
//!     .output_file(&bundle)
//!     .separator_style("machinereadable")
//!     .build()?;
//!
//! let result = combine(&config, &CancellationToken::new(), None, &DenyOverwrite)?;
//! assert_eq!(result.files_processed, 2);
//!
//! let restored = scratch.path().join("restored");
//! let extracted = split(&SplitConfig::new(&bundle, &restored))?;
//! assert_eq!(extracted.extracted, 2);
//! assert_eq!(fs::read_to_string(restored.join("src/lib.rs"))?, "pub fn demo() {}\n");
//! # Ok(())
//! # }
//! ```

pub mod cancellation;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core_types;
pub mod discovery;
pub mod encoding;
pub mod errors;
pub mod filtering;
pub mod output;
pub mod prelude;
pub mod presets;
pub mod processing;
pub mod progress;
pub mod security;
pub mod separator;
pub mod signal;
pub mod splitter;
pub mod utils;

pub use cancellation::CancellationToken;
pub use config::{Config, ConfigBuilder, SplitConfig, TimestampMode};
pub use core_types::{ExtractionResult, ProcessingResult, SourceFile};
pub use errors::{Error, Result};
pub use output::{AllowOverwrite, ConsolePrompt, DenyOverwrite, OverwritePrompt};
pub use splitter::split;

use crate::config::path_resolve::absolutize;
use crate::core_types::SecurityFinding;
use crate::errors::{io_error_with_path, ConfigError};
use crate::output::{list_paths, timestamped_path, write_dry_run_output, write_lists, Combiner};
use crate::presets::PresetRegistry;
use crate::progress::ProgressReporter;
use crate::security::{report_findings, SecurityMode, SecurityScanner};
use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Everything a run needs after presets, discovery and the security scan.
struct PreparedRun {
    config: Config,
    files: Vec<SourceFile>,
    total_candidates: usize,
    findings: Vec<SecurityFinding>,
    output_path: Option<PathBuf>,
}

fn load_presets(config: &Config) -> Result<PresetRegistry> {
    if !config.presets.is_active() {
        return Ok(PresetRegistry::default());
    }
    let registry = PresetRegistry::load(&config.presets.preset_files)?;
    if let Some(group) = &config.presets.group {
        if !registry.has_group(group) {
            return Err(ConfigError::InvalidValue {
                option: "--preset-group".to_string(),
                reason: format!(
                    "no group named '{}' (available: {})",
                    group,
                    registry.group_names().join(", ")
                ),
            }
            .into());
        }
    }
    Ok(registry)
}

/// Absolute path with the parent directory canonicalized, so it compares
/// equal to the paths discovery produces.
fn resolve_output(path: &Path) -> Result<PathBuf> {
    let absolute = absolutize(path)?;
    let (Some(parent), Some(name)) = (absolute.parent(), absolute.file_name()) else {
        return Ok(absolute);
    };
    Ok(parent
        .canonicalize()
        .map(|p| p.join(name))
        .unwrap_or(absolute))
}

fn prepare(config: &Config, token: &CancellationToken) -> Result<PreparedRun> {
    let presets = load_presets(config)?;
    let mut config = config.clone();
    if !presets.is_empty() {
        config.apply_global_settings(presets.global_settings());
    }

    let output_path = match &config.output.output_path {
        Some(path) if config.output.add_timestamp => Some(resolve_output(&timestamped_path(
            path,
            chrono::Local::now().naive_local(),
        ))?),
        Some(path) => Some(resolve_output(path)?),
        None => None,
    };
    let mut skip_paths = Vec::new();
    if let Some(path) = &output_path {
        let (file_list, dir_list) = list_paths(path);
        skip_paths.extend([path.clone(), file_list, dir_list]);
    }

    let files = discovery::discover(
        &config.discovery,
        &presets,
        config.presets.group.as_deref(),
        &skip_paths,
        token,
    )?;
    if files.is_empty() {
        return Err(Error::NoFilesFound);
    }
    let total_candidates = files.len();

    let scanner = SecurityScanner::new(config.security_mode());
    let findings = scanner.scan(&files, |file| {
        file.preset
            .as_ref()
            .map_or(true, |preset| preset.allows_security_scan())
    });
    let files = scanner.enforce(files, &findings)?;
    if files.is_empty() {
        return Err(Error::NoFilesFound);
    }

    Ok(PreparedRun {
        config,
        files,
        total_candidates,
        findings,
        output_path,
    })
}

/// Returns the files a combine run would bundle, in bundle order.
///
/// Presets are loaded and the security scan is applied exactly as in
/// [`combine`], but nothing is read into memory or written.
pub fn plan(config: &Config, token: &CancellationToken) -> Result<Vec<SourceFile>> {
    Ok(prepare(config, token)?.files)
}

/// Runs a complete combine.
///
/// If the container already exists and `config.output.force` is off,
/// `prompt` decides whether it is replaced. A dry run prints the ordered
/// candidate list to stdout instead of writing anything.
///
/// # Errors
/// `NoFilesFound` if nothing survives the filters, `OutputExists` if the
/// prompt declines, `Interrupted` on cancellation, and any error from the
/// stages themselves.
#[instrument(skip_all)]
pub fn combine(
    config: &Config,
    token: &CancellationToken,
    progress: Option<Arc<dyn ProgressReporter>>,
    prompt: &dyn OverwritePrompt,
) -> Result<ProcessingResult> {
    let started = Instant::now();
    let run = prepare(config, token)?;
    let config = &run.config;

    if config.dry_run {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        write_dry_run_output(&mut out, &run.files)
            .and_then(|()| out.flush())
            .map_err(|e| io_error_with_path(e, "<stdout>"))?;
        return Ok(ProcessingResult {
            total_candidates: run.total_candidates,
            security_findings: run.findings,
            elapsed: started.elapsed(),
            ..Default::default()
        });
    }

    let output_path = run.output_path.ok_or(ConfigError::MissingOutput)?;
    if output_path.exists() && !config.output.force && !prompt.confirm(&output_path) {
        return Err(Error::OutputExists {
            path: output_path.display().to_string(),
        });
    }
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error_with_path(e, parent))?;
    }

    let combiner = Combiner::new(
        &config.output,
        config.encoding.clone(),
        config.discovery.include_symlinks,
        progress,
    )?;
    let stats = combiner.write(&output_path, &run.files, token)?;

    let (file_list_path, dir_list_path) = if config.output.write_lists {
        let written: HashSet<&str> = stats.written_paths.iter().map(String::as_str).collect();
        let listed: Vec<SourceFile> = run
            .files
            .iter()
            .filter(|f| written.contains(f.relative_path.as_str()))
            .cloned()
            .collect();
        let (files, dirs) = write_lists(&output_path, &listed, config.output.line_ending())?;
        (Some(files), Some(dirs))
    } else {
        (None, None)
    };

    if config.security_mode() == SecurityMode::Warn {
        report_findings(&run.findings);
    }

    info!(
        "Wrote {} of {} file(s) to {} ({} duplicate(s) skipped)",
        stats.written,
        run.total_candidates,
        output_path.display(),
        stats.duplicates_skipped
    );
    let result = ProcessingResult {
        files_processed: stats.written,
        total_candidates: run.total_candidates,
        duplicates_skipped: stats.duplicates_skipped,
        encoding_errors: stats.encoding_errors,
        elapsed: started.elapsed(),
        output_path,
        file_list_path,
        dir_list_path,
        security_findings: run.findings,
    };
    debug!("Combine finished: {:?}", result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn project() -> anyhow::Result<tempfile::TempDir> {
        let dir = tempdir()?;
        fs::write(dir.path().join("b.txt"), "Content B")?;
        fs::write(dir.path().join("a.rs"), "fn a() {}")?;
        Ok(dir)
    }

    #[test]
    fn test_combine_standard() -> anyhow::Result<()> {
        let src = project()?;
        let out = tempdir()?;
        let bundle = out.path().join("bundle.txt");
        let config = ConfigBuilder::new()
            .source(src.path())
            .output_file(&bundle)
            .build()?;

        let result = combine(&config, &CancellationToken::new(), None, &DenyOverwrite)?;
        assert_eq!(result.files_processed, 2);
        assert_eq!(result.total_candidates, 2);

        let text = fs::read_to_string(&bundle)?;
        let a = text.find("======= a.rs |").unwrap();
        let b = text.find("======= b.txt |").unwrap();
        assert!(a < b);
        assert!(text.contains("fn a() {}\n\n"));
        Ok(())
    }

    #[test]
    fn test_combine_no_files_found() -> anyhow::Result<()> {
        let src = project()?;
        let out = tempdir()?;
        let config = ConfigBuilder::new()
            .source(src.path())
            .output_file(out.path().join("bundle.txt"))
            .include_extensions(vec!["md".to_string()])
            .build()?;
        let result = combine(&config, &CancellationToken::new(), None, &DenyOverwrite);
        assert!(matches!(result, Err(Error::NoFilesFound)));
        Ok(())
    }

    #[test]
    fn test_combine_respects_cancellation() -> anyhow::Result<()> {
        let src = project()?;
        let out = tempdir()?;
        let config = ConfigBuilder::new()
            .source(src.path())
            .output_file(out.path().join("bundle.txt"))
            .build()?;
        let token = CancellationToken::new();
        token.cancel();
        let result = combine(&config, &token, None, &DenyOverwrite);
        assert!(matches!(result, Err(Error::Interrupted)));
        Ok(())
    }

    #[test]
    fn test_existing_output_needs_confirmation() -> anyhow::Result<()> {
        let src = project()?;
        let out = tempdir()?;
        let bundle = out.path().join("bundle.txt");
        fs::write(&bundle, "old")?;
        let config = ConfigBuilder::new()
            .source(src.path())
            .output_file(&bundle)
            .build()?;
        let token = CancellationToken::new();

        let denied = combine(&config, &token, None, &DenyOverwrite);
        assert!(matches!(denied, Err(Error::OutputExists { .. })));
        assert_eq!(fs::read_to_string(&bundle)?, "old");

        let asked = std::sync::atomic::AtomicBool::new(false);
        let prompt = |_: &Path| {
            asked.store(true, std::sync::atomic::Ordering::SeqCst);
            true
        };
        combine(&config, &token, None, &prompt)?;
        assert!(asked.load(std::sync::atomic::Ordering::SeqCst));
        assert_ne!(fs::read_to_string(&bundle)?, "old");
        Ok(())
    }

    #[test]
    fn test_output_inside_source_is_not_bundled() -> anyhow::Result<()> {
        let src = project()?;
        let bundle = src.path().join("bundle.txt");
        let config = ConfigBuilder::new()
            .source(src.path())
            .output_file(&bundle)
            .lists(true)
            .build()?;
        let token = CancellationToken::new();
        combine(&config, &token, None, &DenyOverwrite)?;

        let config = ConfigBuilder::new()
            .source(src.path())
            .output_file(&bundle)
            .lists(true)
            .force(true)
            .build()?;
        let result = combine(&config, &token, None, &DenyOverwrite)?;
        assert_eq!(result.files_processed, 2);
        let text = fs::read_to_string(&bundle)?;
        assert!(!text.contains("bundle_filelist.txt"));
        assert!(!text.contains("======= bundle.txt"));
        Ok(())
    }

    #[test]
    fn test_plan_with_timestamped_output() -> anyhow::Result<()> {
        let src = project()?;
        let config = ConfigBuilder::new()
            .source(src.path())
            .output_file(src.path().join("bundle.txt"))
            .add_timestamp(true)
            .build()?;
        let files = plan(&config, &CancellationToken::new())?;
        let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["a.rs", "b.txt"]);
        Ok(())
    }

    #[test]
    fn test_unknown_preset_group() -> anyhow::Result<()> {
        let src = project()?;
        let presets = src.path().join("presets.yaml");
        fs::write(&presets, "docs:\n  presets:\n    md:\n      extensions: [md]\n")?;
        let config = ConfigBuilder::new()
            .source(src.path())
            .output_file(src.path().join("bundle.txt"))
            .preset_file(&presets)
            .preset_group("missing")
            .build()?;
        let err = plan(&config, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
        Ok(())
    }
}
