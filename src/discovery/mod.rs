//! Discovers the files of a bundle, applying filters in parallel.
//!
//! Source roots are walked with `ignore`'s parallel walker. Manifest entries
//! are expanded and walked the same way. Links to directories are collected
//! during the walk and traversed afterwards, one at a time, so cycle checks
//! see a consistent visited set.
use crate::cancellation::CancellationToken;
use crate::config::DiscoveryConfig;
use crate::core_types::{FileRole, SourceFile};
use crate::errors::{io_error_with_path, Error, Result};
use crate::presets::PresetRegistry;
use crate::utils::{sort_for_bundle, to_posix};
use crossbeam_channel::unbounded;
use ignore::WalkState;
use log::{debug, info, warn};
use std::collections::{HashSet, VecDeque};
use std::path::{Component, Path, PathBuf};
use tracing::instrument;

mod entry_processor;
mod manifest;
mod patterns;
mod symlinks;
mod walker;

use entry_processor::{evaluate_file, process_direntry, Candidate, EntryContext, Found, PendingLink};
use patterns::PatternMatcher;
use walker::{build_walker, WalkRoot};

/// Discovers the files to bundle, in bundle order.
///
/// Include files come first, in the order given, tagged [`FileRole::Include`].
/// Every other file is sorted with [`sort_for_bundle`]. Content is not read
/// at this stage.
///
/// `skip_paths` lists absolute paths that must never be picked up, such as
/// the container being written.
///
/// # Errors
/// Returns `Error::Interrupted` if `token` is cancelled, and an error if a
/// pattern file, the manifest or an include file cannot be read. Problems
/// with individual walked files are logged and the file is skipped.
///
/// # Examples
///
/// ```
/// use dirbundle::cancellation::CancellationToken;
/// use dirbundle::config::DiscoveryConfig;
/// use dirbundle::discovery::discover;
/// use dirbundle::presets::PresetRegistry;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("b.txt"), "b")?;
/// std::fs::write(dir.path().join("README.md"), "intro")?;
/// let config = DiscoveryConfig {
///     sources: vec![dir.path().canonicalize()?],
///     ..DiscoveryConfig::default()
/// };
/// let files = discover(&config, &PresetRegistry::default(), None, &[], &CancellationToken::new())?;
/// let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
/// assert_eq!(paths, vec!["README.md", "b.txt"]);
/// # Ok(())
/// # }
/// ```
#[instrument(level = "debug", skip_all, fields(sources = config.sources.len()))]
pub fn discover(
    config: &DiscoveryConfig,
    presets: &PresetRegistry,
    preset_group: Option<&str>,
    skip_paths: &[PathBuf],
    token: &CancellationToken,
) -> Result<Vec<SourceFile>> {
    if token.is_cancelled() {
        return Err(Error::Interrupted);
    }

    let patterns = PatternMatcher::new(config)?;
    let ctx = EntryContext {
        config,
        presets,
        preset_group,
        patterns: &patterns,
        skip_paths,
    };
    let prune_dot_paths = !config.include_dot_paths && !presets.may_include_dot_paths();

    let mut roots = Vec::new();
    let mut regular = Vec::new();
    let prefix_sources = config.sources.len() > 1;
    for source in &config.sources {
        let prefix = if prefix_sources {
            source.file_name().map(|n| n.to_string_lossy().into_owned())
        } else {
            None
        };
        roots.push(WalkRoot::new(source.clone(), prefix));
    }

    if let Some(manifest_path) = &config.input_file {
        let (base, entries) = manifest::read_manifest(manifest_path)?;
        for entry in entries {
            let relative = match entry.strip_prefix(&base) {
                Ok(inner) if !inner.as_os_str().is_empty() => to_posix(inner),
                _ => entry
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            };
            if entry.is_dir() {
                roots.push(WalkRoot::new(entry, Some(relative).filter(|r| !r.is_empty())));
                continue;
            }
            if skip_paths.iter().any(|skip| skip == &entry) {
                warn!("Skipping {}: it is an output of this run", entry.display());
                continue;
            }
            let candidate = Candidate {
                path: &entry,
                scoped: relative.clone(),
                relative,
                is_symlink: false,
                from_manifest: true,
            };
            match evaluate_file(&ctx, candidate) {
                Ok(Some(file)) => regular.push(file),
                Ok(None) => {}
                Err(e) => warn!("Skipping manifest entry {}: {}", entry.display(), e),
            }
        }
    }

    let mut visited: HashSet<PathBuf> = roots.iter().map(|r| r.root.clone()).collect();
    let mut pending = VecDeque::new();
    for root in &roots {
        let (mut files, links) = walk_parallel(root, &ctx, prune_dot_paths, token)?;
        files.sort_by(|a, b| a.absolute_path.cmp(&b.absolute_path));
        regular.extend(files);
        pending.extend(links);
    }

    while let Some(link) = pending.pop_front() {
        if token.is_cancelled() {
            return Err(Error::Interrupted);
        }
        if visited.contains(&link.target) {
            debug!(
                "Directory {} was already walked, skipping link {}",
                link.target.display(),
                link.scoped
            );
            continue;
        }
        let mut chain = link.chain.clone();
        chain.push(link.target.clone());
        let root = WalkRoot {
            root: link.target.clone(),
            prefix: link.prefix.clone(),
            scope: Some(link.scoped.clone()),
            chain,
        };
        let (mut files, links) = walk_sequential(&root, &ctx, prune_dot_paths, token)?;
        files.sort_by(|a, b| a.absolute_path.cmp(&b.absolute_path));
        regular.extend(files);
        pending.extend(links);
        visited.extend(root.chain);
    }

    sort_for_bundle(&mut regular);
    regular.dedup_by(|later, first| {
        let duplicate = later.relative_path == first.relative_path;
        if duplicate {
            warn!(
                "Two files map to '{}'; keeping {} and skipping {}",
                first.relative_path,
                first.absolute_path.display(),
                later.absolute_path.display()
            );
        }
        duplicate
    });

    let includes = collect_include_files(&config.include_files, &ctx)?;
    let include_paths: HashSet<&Path> = includes.iter().map(|f| f.absolute_path.as_path()).collect();
    regular.retain(|f| !include_paths.contains(f.absolute_path.as_path()));

    info!(
        "Discovery complete: {} file(s), {} include file(s)",
        regular.len(),
        includes.len()
    );
    let mut files = includes;
    files.append(&mut regular);
    Ok(files)
}

type WalkOutput = (Vec<SourceFile>, Vec<PendingLink>);

fn split_found(found: impl IntoIterator<Item = Found>) -> WalkOutput {
    let mut files = Vec::new();
    let mut links = Vec::new();
    for item in found {
        match item {
            Found::File(file) => files.push(file),
            Found::DirLink(link) => links.push(link),
        }
    }
    (files, links)
}

fn walk_parallel(
    root: &WalkRoot,
    ctx: &EntryContext<'_>,
    prune_dot_paths: bool,
    token: &CancellationToken,
) -> Result<WalkOutput> {
    let walker = build_walker(root, ctx.config, ctx.patterns, prune_dot_paths).build_parallel();
    let (tx, rx) = unbounded();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry_result| {
            if token.is_cancelled() {
                return WalkState::Quit;
            }
            match process_direntry(entry_result, root, ctx) {
                Ok(Some(found)) => {
                    if tx.send(found).is_err() {
                        log::error!("Receiver dropped, quitting discovery walk.");
                        return WalkState::Quit;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("{}", e),
            }
            WalkState::Continue
        })
    });
    drop(tx);

    if token.is_cancelled() {
        return Err(Error::Interrupted);
    }
    Ok(split_found(rx))
}

fn walk_sequential(
    root: &WalkRoot,
    ctx: &EntryContext<'_>,
    prune_dot_paths: bool,
    token: &CancellationToken,
) -> Result<WalkOutput> {
    debug!("Walking linked directory {}", root.root.display());
    let mut found = Vec::new();
    for entry_result in build_walker(root, ctx.config, ctx.patterns, prune_dot_paths).build() {
        if token.is_cancelled() {
            return Err(Error::Interrupted);
        }
        match process_direntry(entry_result, root, ctx) {
            Ok(Some(item)) => found.push(item),
            Ok(None) => {}
            Err(e) => warn!("{}", e),
        }
    }
    Ok(split_found(found))
}

/// Bundle path of an include file: its given relative path, or the file name
/// when the path is absolute or climbs out with `..`.
fn include_relative_path(given: &Path, absolute: &Path) -> String {
    let climbs = given.components().any(|c| c == Component::ParentDir);
    if given.is_relative() && !climbs {
        let posix = to_posix(given);
        if !posix.is_empty() {
            return posix;
        }
    }
    absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| to_posix(given))
}

fn collect_include_files(paths: &[PathBuf], ctx: &EntryContext<'_>) -> Result<Vec<SourceFile>> {
    let mut includes: Vec<SourceFile> = Vec::new();
    for given in paths {
        let absolute = given
            .canonicalize()
            .map_err(|e| io_error_with_path(e, given))?;
        if includes.iter().any(|f| f.absolute_path == absolute) {
            continue;
        }
        let metadata = std::fs::metadata(&absolute).map_err(|e| io_error_with_path(e, &absolute))?;
        let mut file = SourceFile::new(absolute.clone(), include_relative_path(given, &absolute));
        file.role = FileRole::Include;
        file.size = metadata.len();
        file.modified = metadata.modified().ok();
        file.preset = ctx
            .presets
            .resolve(&file.relative_path, ctx.preset_group)
            .map(std::sync::Arc::new);
        debug!("Include file: {}", file.relative_path);
        includes.push(file);
    }
    Ok(includes)
}
