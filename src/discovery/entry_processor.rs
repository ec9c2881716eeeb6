// src/discovery/entry_processor.rs

use super::patterns::PatternMatcher;
use super::symlinks::{directory_cycle, resolve_link, LinkTarget};
use super::walker::WalkRoot;
use crate::config::DiscoveryConfig;
use crate::core_types::SourceFile;
use crate::errors::{io_error_with_path, Result};
use crate::filtering::{
    effective_size_limit, has_dot_component, is_likely_text, passes_extension_filters,
    passes_size_filter,
};
use crate::presets::PresetRegistry;
use ignore::DirEntry;
use log::{debug, trace, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared, read-only state for evaluating candidates.
pub(super) struct EntryContext<'a> {
    pub config: &'a DiscoveryConfig,
    pub presets: &'a PresetRegistry,
    pub preset_group: Option<&'a str>,
    pub patterns: &'a PatternMatcher,
    /// Files that must never be bundled (the output and its list files).
    pub skip_paths: &'a [PathBuf],
}

/// What a walker entry turned into.
#[derive(Debug)]
pub(super) enum Found {
    File(SourceFile),
    /// A link to a directory, walked after the main pass.
    DirLink(PendingLink),
}

#[derive(Debug, Clone)]
pub(super) struct PendingLink {
    /// Scoped path of the link; becomes the scope of the target's walk.
    pub scoped: String,
    pub target: PathBuf,
    /// Chain of the root the link was found under.
    pub chain: Vec<PathBuf>,
    /// Bundle prefix of that root.
    pub prefix: Option<String>,
}

/// A file that survived the walker-level checks.
pub(super) struct Candidate<'p> {
    pub path: &'p Path,
    pub relative: String,
    /// Path checked against dot rules; relative to its source.
    pub scoped: String,
    pub is_symlink: bool,
    pub from_manifest: bool,
}

/// Processes a single entry from the walk.
///
/// Returns `Ok(None)` for directories and anything filtered out. Errors are
/// per-entry and the caller logs and skips them.
pub(super) fn process_direntry(
    entry_result: std::result::Result<DirEntry, ignore::Error>,
    root: &WalkRoot,
    ctx: &EntryContext<'_>,
) -> Result<Option<Found>> {
    let entry = match entry_result {
        Ok(entry) => entry,
        Err(e) => {
            warn!("Walker error: {}", e);
            return Ok(None);
        }
    };
    let Some(file_type) = entry.file_type() else {
        return Ok(None);
    };
    if file_type.is_dir() {
        return Ok(None);
    }
    let path = entry.path();
    let Some(scoped) = root.scoped_path(path) else {
        warn!("Entry {} is outside its walk root", path.display());
        return Ok(None);
    };
    trace!("Processing entry: {}", scoped);

    let is_symlink = file_type.is_symlink();
    if is_symlink {
        if !ctx.config.include_symlinks {
            debug!("Skipping symlink: {}", path.display());
            return Ok(None);
        }
        match resolve_link(path) {
            LinkTarget::File(_) => {}
            LinkTarget::Directory(target) => {
                if let Some(reason) = directory_cycle(path, &target, &root.chain) {
                    warn!("Skipping symlink cycle at {}: {}", path.display(), reason);
                    return Ok(None);
                }
                return Ok(Some(Found::DirLink(PendingLink {
                    scoped,
                    target,
                    chain: root.chain.clone(),
                    prefix: root.prefix.clone(),
                })));
            }
            LinkTarget::Cycle(reason) => {
                warn!("Skipping symlink cycle at {}: {}", path.display(), reason);
                return Ok(None);
            }
            LinkTarget::Broken(reason) => {
                warn!("Skipping broken symlink {}: {}", path.display(), reason);
                return Ok(None);
            }
        }
    } else if !file_type.is_file() {
        trace!("Skipping special file: {}", path.display());
        return Ok(None);
    }

    if ctx.skip_paths.iter().any(|skip| skip == path) {
        warn!("Skipping {}: it is an output of this run", path.display());
        return Ok(None);
    }
    if !ctx.patterns.is_included(&scoped) {
        debug!("Not matched by include patterns: {}", scoped);
        return Ok(None);
    }

    let relative = root.bundle_path(&scoped);
    evaluate_file(
        ctx,
        Candidate {
            path,
            relative,
            scoped,
            is_symlink,
            from_manifest: false,
        },
    )
    .map(|file| file.map(Found::File))
}

/// Applies the per-file filters shared by walked and manifest-listed files.
///
/// Manifest files skip the extension and dot-path rules; everything honours
/// the size ceiling and the binary check.
pub(super) fn evaluate_file(
    ctx: &EntryContext<'_>,
    candidate: Candidate<'_>,
) -> Result<Option<SourceFile>> {
    let Candidate {
        path,
        relative,
        scoped,
        is_symlink,
        from_manifest,
    } = candidate;
    let config = ctx.config;

    if !from_manifest && !passes_extension_filters(path, config) {
        debug!("Skipping file due to extension filter: {}", relative);
        return Ok(None);
    }

    let preset = ctx.presets.resolve(&relative, ctx.preset_group);
    let include_dot = preset
        .as_ref()
        .and_then(|p| p.include_dot_paths)
        .unwrap_or(config.include_dot_paths);
    if !from_manifest && !include_dot && has_dot_component(&scoped) {
        debug!("Skipping dot path: {}", relative);
        return Ok(None);
    }

    let metadata = fs::metadata(path).map_err(|e| io_error_with_path(e, path))?;
    let limit = effective_size_limit(
        config.max_file_size,
        preset.as_ref().and_then(|p| p.explicit_max_file_size),
        preset.as_ref().and_then(|p| p.inherited_max_file_size),
    );
    if !passes_size_filter(metadata.len(), limit) {
        debug!(
            "Skipping file due to size constraint: {} (Size: {} bytes)",
            relative,
            metadata.len()
        );
        return Ok(None);
    }

    let is_text = is_likely_text(path).map_err(|e| io_error_with_path(e, path))?;
    let include_binary = preset
        .as_ref()
        .and_then(|p| p.include_binary)
        .unwrap_or(config.include_binary);
    if !is_text && !include_binary {
        debug!("Skipping binary file: {}", relative);
        return Ok(None);
    }

    let mut file = SourceFile::new(path.to_path_buf(), relative);
    file.size = metadata.len();
    file.modified = metadata.modified().ok();
    file.is_symlink = is_symlink;
    file.is_binary = !is_text;
    file.from_manifest = from_manifest;
    file.preset = preset.map(Arc::new);
    trace!("Accepted candidate: {}", file.relative_path);
    Ok(Some(file))
}
