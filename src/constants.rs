// src/constants.rs

/// Number of files read concurrently per batch; also the worker pool size.
pub const BATCH_SIZE: usize = 10;

/// Maximum number of symlink hops followed before a chain is treated as a cycle.
pub const MAX_SYMLINK_DEPTH: usize = 40;

/// Number of bytes inspected when sniffing for binary content.
pub const BINARY_SNIFF_BYTES: usize = 8 * 1024;

/// Number of bytes fed to the statistical charset detector.
pub const DETECTION_SAMPLE_BYTES: usize = 64 * 1024;

/// Statistical guesses below this confidence fall back to UTF-8.
pub const MIN_DETECTION_CONFIDENCE: f32 = 0.7;

/// A Windows-1252 guess is kept only above this confidence.
pub const WINDOWS_1252_CONFIDENCE: f32 = 0.9;

/// A Windows-1252 guess for a documentation file is kept only above this confidence.
pub const WINDOWS_1252_DOC_CONFIDENCE: f32 = 0.95;

/// Share of replacement characters tolerated before trying fallback charsets.
pub const MAX_REPLACEMENT_RATIO: f32 = 0.05;

/// Extensions treated as documentation, where UTF-8 is strongly preferred.
pub const DOC_EXTENSIONS: &[&str] = &[
    "md", "markdown", "mdx", "rst", "txt", "adoc", "asciidoc", "org", "textile",
];

/// Directory names skipped unless default excludes are disabled.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    ".tox",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    "target",
    "build",
    "dist",
];

/// File names skipped unless default excludes are disabled.
pub const DEFAULT_EXCLUDED_FILES: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "poetry.lock",
];

/// Project-specific ignore file auto-loaded from each source directory.
pub const PROJECT_IGNORE_FILENAME: &str = ".dirbundleignore";

/// Suffix of the sibling file listing all bundled files.
pub const FILELIST_SUFFIX: &str = "_filelist.txt";

/// Suffix of the sibling file listing all bundled directories.
pub const DIRLIST_SUFFIX: &str = "_dirlist.txt";

/// Marker appended to content cut short by `max_lines`.
pub const TRUNCATION_MARKER: &str = "[... truncated after {n} lines ...]";

/// Prefix of every MachineReadable marker line.
pub const MACHINE_MARKER_PREFIX: &str = "DIRBUNDLE";

/// Width of the rule lines used by the Detailed style.
pub const DETAILED_RULE_WIDTH: usize = 88;
