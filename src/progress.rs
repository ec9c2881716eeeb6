// src/progress.rs

//! Progress reporting for the combiner.
//!
//! The combiner writes in batches and reports after each one. Reporters are
//! shared with the worker pool, so they take `&self`.

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives batch-level progress from the combiner.
///
/// # Examples
///
/// ```
/// use dirbundle::progress::ProgressReporter;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// #[derive(Default)]
/// struct Counter {
///     handled: AtomicU64,
/// }
///
/// impl ProgressReporter for Counter {
///     fn begin(&self, _total: u64) {}
///     fn batch_done(&self, handled: u64, _last_path: &str) {
///         self.handled.store(handled, Ordering::Relaxed);
///     }
///     fn finish(&self, _written: usize, _duplicates: usize) {}
/// }
///
/// let counter = Counter::default();
/// counter.begin(12);
/// counter.batch_done(10, "src/lib.rs");
/// assert_eq!(counter.handled.load(Ordering::Relaxed), 10);
/// ```
pub trait ProgressReporter: Send + Sync {
    /// Called once with the number of candidate files, before the first batch.
    fn begin(&self, total: u64);
    /// Called after each batch. `handled` counts candidates seen so far,
    /// whether written, deduplicated or skipped.
    fn batch_done(&self, handled: u64, last_path: &str);
    /// Called once after the last batch.
    fn finish(&self, written: usize, duplicates: usize);
}

/// Reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    fn begin(&self, _total: u64) {}
    fn batch_done(&self, _handled: u64, _last_path: &str) {}
    fn finish(&self, _written: usize, _duplicates: usize) {}
}

/// Reports through the `log` facade at debug level. Used when stderr is not
/// a terminal.
#[derive(Debug, Default)]
pub struct LogProgress {
    total: AtomicU64,
}

impl ProgressReporter for LogProgress {
    fn begin(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        debug!("Bundling {} candidate file(s)", total);
    }

    fn batch_done(&self, handled: u64, last_path: &str) {
        let total = self.total.load(Ordering::Relaxed);
        debug!("Batch done: {}/{} (last: {})", handled, total, last_path);
    }

    fn finish(&self, written: usize, duplicates: usize) {
        debug!("Bundle finished: {} written, {} duplicate(s)", written, duplicates);
    }
}

/// A terminal progress bar.
#[cfg(feature = "progress")]
#[derive(Clone)]
pub struct IndicatifProgress {
    bar: ProgressBar,
}

#[cfg(feature = "progress")]
impl IndicatifProgress {
    const TEMPLATE: &'static str =
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}";

    pub fn new() -> Self {
        let style = ProgressStyle::default_bar()
            .template(Self::TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        let bar = ProgressBar::hidden();
        bar.set_style(style);
        Self { bar }
    }
}

#[cfg(feature = "progress")]
impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "progress")]
impl ProgressReporter for IndicatifProgress {
    fn begin(&self, total: u64) {
        self.bar
            .set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_length(total);
        self.bar.set_message("bundling");
    }

    fn batch_done(&self, handled: u64, last_path: &str) {
        self.bar.set_position(handled);
        self.bar.set_message(last_path.to_string());
    }

    fn finish(&self, written: usize, duplicates: usize) {
        let msg = if duplicates > 0 {
            format!("{} file(s) bundled, {} duplicate(s) skipped", written, duplicates)
        } else {
            format!("{} file(s) bundled", written)
        };
        self.bar.finish_with_message(msg);
    }
}
