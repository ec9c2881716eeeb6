// src/output/prompt.rs

//! Confirmation before an existing container is overwritten.

use std::io::{self, BufRead, Write};
use std::path::Path;

/// Decides whether an existing output file may be replaced.
///
/// The combiner asks once, before anything is written. Closures of the form
/// `Fn(&Path) -> bool` implement this trait too.
///
/// # Examples
///
/// ```
/// use dirbundle::output::{AllowOverwrite, DenyOverwrite, OverwritePrompt};
/// use std::path::Path;
///
/// assert!(AllowOverwrite.confirm(Path::new("bundle.txt")));
/// assert!(!DenyOverwrite.confirm(Path::new("bundle.txt")));
///
/// let only_tmp = |path: &Path| path.starts_with("/tmp");
/// assert!(only_tmp.confirm(Path::new("/tmp/bundle.txt")));
/// ```
pub trait OverwritePrompt: Send + Sync {
    /// Returns `true` to overwrite `path`.
    fn confirm(&self, path: &Path) -> bool;
}

/// Never overwrites. The default for library callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyOverwrite;

impl OverwritePrompt for DenyOverwrite {
    fn confirm(&self, _path: &Path) -> bool {
        false
    }
}

/// Always overwrites, as with `--force`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowOverwrite;

impl OverwritePrompt for AllowOverwrite {
    fn confirm(&self, _path: &Path) -> bool {
        true
    }
}

impl<F> OverwritePrompt for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn confirm(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Asks on stderr and reads the answer from stdin. Anything but yes declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

impl OverwritePrompt for ConsolePrompt {
    fn confirm(&self, path: &Path) -> bool {
        let mut stderr = io::stderr();
        if write!(stderr, "Output file '{}' exists. Overwrite? [y/N] ", path.display())
            .and_then(|_| stderr.flush())
            .is_err()
        {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(e) => {
                log::warn!("Could not read confirmation: {}", e);
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
