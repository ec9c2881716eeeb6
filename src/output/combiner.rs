// src/output/combiner.rs

//! The batched, ordered container writer.
//!
//! Files are read and rendered concurrently in batches of [`BATCH_SIZE`] on a
//! dedicated worker pool. Rendered blocks are committed strictly in input
//! order once their batch has finished. Deduplication happens at commit time,
//! so which of two identical files is kept depends only on the order.

use crate::cancellation::CancellationToken;
use crate::config::OutputConfig;
use crate::constants::BATCH_SIZE;
use crate::core_types::{FileRole, SourceFile};
use crate::encoding::EncodingOptions;
use crate::errors::{io_error_with_path, Error, Result};
use crate::processing::load_content;
use crate::progress::ProgressReporter;
use crate::separator::{new_block_id, render_footer, render_header, BlockMetadata, LineEnding};
use crate::utils::sha256_hex;
use log::{debug, trace, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;

/// Mutable state shared by the workers of one writer.
#[derive(Debug, Default)]
struct WriterState {
    seen_checksums: HashSet<String>,
    issued_ids: HashSet<String>,
}

/// One rendered block, ready to commit.
#[derive(Debug)]
struct RenderedBlock {
    text: String,
    checksum: String,
    had_errors: bool,
    dedup_exempt: bool,
}

/// Counters of a finished write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub written: usize,
    pub duplicates_skipped: usize,
    pub unreadable_skipped: usize,
    pub encoding_errors: usize,
    /// Relative paths of the blocks written, in order.
    pub written_paths: Vec<String>,
}

/// Writes files into a container.
pub struct Combiner<'a> {
    output: &'a OutputConfig,
    encoding: EncodingOptions,
    /// Exempt symlinks from deduplication.
    keep_symlink_duplicates: bool,
    progress: Option<Arc<dyn ProgressReporter>>,
    state: Mutex<WriterState>,
    pool: rayon::ThreadPool,
}

impl<'a> Combiner<'a> {
    /// Creates a writer with its own worker pool of [`BATCH_SIZE`] threads.
    pub fn new(
        output: &'a OutputConfig,
        encoding: EncodingOptions,
        keep_symlink_duplicates: bool,
        progress: Option<Arc<dyn ProgressReporter>>,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(BATCH_SIZE)
            .thread_name(|i| format!("dirbundle-reader-{}", i))
            .build()
            .map_err(|e| Error::Io {
                path: "<worker pool>".to_string(),
                source: io::Error::other(e),
            })?;
        Ok(Self {
            output,
            encoding,
            keep_symlink_duplicates,
            progress,
            state: Mutex::new(WriterState::default()),
            pool,
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn issue_block_id(&self) -> String {
        let mut state = self.lock_state();
        loop {
            let id = new_block_id();
            if state.issued_ids.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Reads, transforms and renders one file. Runs on a worker.
    fn render(&self, file: &SourceFile) -> Result<RenderedBlock> {
        let content = load_content(file, &self.encoding)?;
        let checksum = sha256_hex(content.text.as_bytes());
        let style = file
            .preset
            .as_ref()
            .and_then(|p| p.separator_style)
            .unwrap_or_else(|| self.output.style());
        let line_ending: LineEnding = self.output.line_ending();
        let block_id = style.needs_block_id().then(|| self.issue_block_id());

        let meta = BlockMetadata {
            relative_path: &file.relative_path,
            modified: file.modified,
            size: file.size,
            encoding: content.encoding,
            target_encoding: content.target_encoding,
            had_errors: content.had_errors,
            checksum: &checksum,
            block_id: block_id.as_deref(),
        };
        let header = render_header(style, line_ending, &meta, &content.text)?;
        let footer = render_footer(style, &meta, &content.text);
        let nl = line_ending.as_str();

        let mut text = String::with_capacity(
            header.len() + content.text.len() + footer.len() + 2 * nl.len(),
        );
        text.push_str(&header);
        text.push_str(&content.text);
        text.push_str(nl);
        text.push_str(&footer);
        text.push_str(nl);
        trace!("Rendered {} as {}", file.relative_path, style);

        Ok(RenderedBlock {
            text,
            checksum,
            had_errors: content.had_errors,
            dedup_exempt: file.role == FileRole::Include
                || (file.is_symlink && self.keep_symlink_duplicates),
        })
    }

    /// `true` if the block is new. Records its checksum.
    fn claim_checksum(&self, block: &RenderedBlock) -> bool {
        if !self.output.deduplicate || block.dedup_exempt {
            return true;
        }
        self.lock_state().seen_checksums.insert(block.checksum.clone())
    }

    /// Writes `files`, in order, to `output_path`.
    ///
    /// The file is created (or truncated) first. Files that have disappeared
    /// or cannot be read are skipped with a warning; other errors abort the
    /// write. On cancellation the write stops after the current batch and the
    /// partial file is left in place.
    #[instrument(level = "debug", skip_all, fields(files = files.len(), output = %output_path.display()))]
    pub fn write(
        &self,
        output_path: &Path,
        files: &[SourceFile],
        token: &CancellationToken,
    ) -> Result<WriteStats> {
        let file = File::create(output_path).map_err(|e| io_error_with_path(e, output_path))?;
        let mut writer = BufWriter::new(file);
        let stats = self.write_to(&mut writer, output_path, files, token);
        writer
            .flush()
            .map_err(|e| io_error_with_path(e, output_path))?;
        stats
    }

    /// Writes blocks into any sink. `output_path` is excluded from `files`.
    pub fn write_to<W: Write>(
        &self,
        writer: &mut W,
        output_path: &Path,
        files: &[SourceFile],
        token: &CancellationToken,
    ) -> Result<WriteStats> {
        let mut stats = WriteStats::default();
        if let Some(progress) = &self.progress {
            progress.begin(files.len() as u64);
        }

        let mut done = 0u64;
        for batch in files.chunks(BATCH_SIZE) {
            token.check()?;

            let rendered: Vec<Option<Result<RenderedBlock>>> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|file| {
                        if file.absolute_path == output_path {
                            None
                        } else {
                            Some(self.render(file))
                        }
                    })
                    .collect()
            });

            for (file, result) in batch.iter().zip(rendered) {
                match result {
                    None => warn!(
                        "Skipping {}: it is the output file",
                        file.absolute_path.display()
                    ),
                    Some(Ok(block)) => {
                        if !self.claim_checksum(&block) {
                            debug!("Skipping duplicate content: {}", file.relative_path);
                            stats.duplicates_skipped += 1;
                            continue;
                        }
                        writer
                            .write_all(block.text.as_bytes())
                            .map_err(|e| io_error_with_path(e, output_path))?;
                        stats.written += 1;
                        if block.had_errors {
                            stats.encoding_errors += 1;
                        }
                        stats.written_paths.push(file.relative_path.clone());
                    }
                    Some(Err(e)) if e.is_recoverable_file_error() => {
                        warn!("Skipping {}: {}", file.relative_path, e);
                        stats.unreadable_skipped += 1;
                    }
                    Some(Err(e)) => return Err(e),
                }
            }

            done += batch.len() as u64;
            if let (Some(progress), Some(last)) = (&self.progress, batch.last()) {
                progress.batch_done(done, &last.relative_path);
            }
        }

        if let Some(progress) = &self.progress {
            progress.finish(stats.written, stats.duplicates_skipped);
        }
        debug!(
            "Write complete: {} written, {} duplicate(s), {} unreadable",
            stats.written, stats.duplicates_skipped, stats.unreadable_skipped
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::separator::{parse_machine_marker, MarkerKind, SeparatorStyle};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn source(root: &Path, relative: &str) -> SourceFile {
        let path = root.join(relative);
        let mut file = SourceFile::new(path.clone(), relative);
        file.size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        file
    }

    fn write_all(config: &OutputConfig, files: &[SourceFile]) -> anyhow::Result<(String, WriteStats)> {
        let combiner = Combiner::new(config, EncodingOptions::default(), false, None)?;
        let mut out = Vec::new();
        let stats = combiner.write_to(
            &mut out,
            Path::new("/nonexistent/bundle.txt"),
            files,
            &CancellationToken::new(),
        )?;
        Ok((String::from_utf8(out)?, stats))
    }

    #[test]
    fn test_standard_blocks_in_order() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.txt"), "alpha")?;
        fs::write(dir.path().join("b.txt"), "beta\n")?;
        let files = vec![source(dir.path(), "a.txt"), source(dir.path(), "b.txt")];

        let (text, stats) = write_all(&OutputConfig::default(), &files)?;
        let expected = format!(
            "======= a.txt | CHECKSUM_SHA256: {} ======\nalpha\n\n\
             ======= b.txt | CHECKSUM_SHA256: {} ======\nbeta\n\n\n",
            sha256_hex(b"alpha"),
            sha256_hex(b"beta\n")
        );
        assert_eq!(text, expected);
        assert_eq!(stats.written, 2);
        Ok(())
    }

    #[test]
    fn test_dedup_keeps_first_in_order() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.txt"), "x")?;
        fs::write(dir.path().join("b.txt"), "x")?;
        fs::write(dir.path().join("c.txt"), "y")?;
        let files: Vec<SourceFile> = ["a.txt", "b.txt", "c.txt"]
            .iter()
            .map(|p| source(dir.path(), p))
            .collect();

        let config = OutputConfig {
            separator_style: Some(SeparatorStyle::MachineReadable),
            ..OutputConfig::default()
        };
        let (text, stats) = write_all(&config, &files)?;
        assert_eq!(stats.written_paths, vec!["a.txt", "c.txt"]);
        assert_eq!(stats.duplicates_skipped, 1);

        let ids: Vec<&str> = text
            .lines()
            .filter_map(parse_machine_marker)
            .filter(|(kind, _)| *kind == MarkerKind::BeginContent)
            .map(|(_, id)| id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let no_dedup = OutputConfig {
            deduplicate: false,
            ..config
        };
        let (_, stats) = write_all(&no_dedup, &files)?;
        assert_eq!(stats.written, 3);
        Ok(())
    }

    #[test]
    fn test_include_files_are_never_deduplicated() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("intro.md"), "same")?;
        fs::write(dir.path().join("a.md"), "same")?;
        let mut intro = source(dir.path(), "intro.md");
        intro.role = FileRole::Include;
        let files = vec![source(dir.path(), "a.md"), intro];

        let (_, stats) = write_all(&OutputConfig::default(), &files)?;
        assert_eq!(stats.written, 2);
        Ok(())
    }

    #[test]
    fn test_order_is_stable_across_batches() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut files = Vec::new();
        for i in 0..(BATCH_SIZE * 3 + 4) {
            let name = format!("f{:03}.txt", i);
            fs::write(dir.path().join(&name), format!("content {}", i))?;
            files.push(source(dir.path(), &name));
        }
        let (_, stats) = write_all(&OutputConfig::default(), &files)?;
        let expected: Vec<String> = files.iter().map(|f| f.relative_path.clone()).collect();
        assert_eq!(stats.written_paths, expected);
        Ok(())
    }

    #[test]
    fn test_missing_files_are_skipped() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("here.txt"), "here")?;
        let files = vec![
            source(dir.path(), "gone.txt"),
            source(dir.path(), "here.txt"),
        ];
        let (_, stats) = write_all(&OutputConfig::default(), &files)?;
        assert_eq!(stats.written_paths, vec!["here.txt"]);
        assert_eq!(stats.unreadable_skipped, 1);
        Ok(())
    }

    #[test]
    fn test_output_file_is_skipped_and_cancel_stops() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let output = dir.path().join("bundle.txt");
        fs::write(dir.path().join("a.txt"), "a")?;
        fs::write(&output, "stale")?;
        let files = vec![source(dir.path(), "a.txt"), source(dir.path(), "bundle.txt")];

        let config = OutputConfig::default();
        let combiner = Combiner::new(&config, EncodingOptions::default(), false, None)?;
        let stats = combiner.write(&output, &files, &CancellationToken::new())?;
        assert_eq!(stats.written_paths, vec!["a.txt"]);
        assert!(!fs::read_to_string(&output)?.contains("stale"));

        let token = CancellationToken::new();
        token.cancel();
        let err = combiner
            .write(&PathBuf::from(&output), &files, &token)
            .unwrap_err();
        assert!(matches!(err, Error::Interrupted));
        Ok(())
    }
}
