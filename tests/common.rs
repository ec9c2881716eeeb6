// tests/common.rs

use assert_cmd::Command;
use std::fs;
use std::path::Path;

// Helper function to get the binary command. `assert_cmd::Command` so tests
// can feed stdin to the overwrite prompt.
#[allow(dead_code)] // This is used by many integration tests, but not all.
pub fn dirbundle_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("dirbundle"))
}

/// Creates `relative` below `root`, including parent directories.
#[allow(dead_code)]
pub fn create_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) -> std::io::Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// Counts the lines of `text` that start with `prefix`.
#[allow(dead_code)]
pub fn count_lines_starting_with(text: &str, prefix: &str) -> usize {
    text.lines().filter(|l| l.starts_with(prefix)).count()
}
