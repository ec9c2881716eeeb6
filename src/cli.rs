// src/cli.rs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Bundles a tree of text files into one container file and splits it back.
///
/// `combine` walks one or more source directories (or reads an explicit file
/// list), applies filters, presets and encoding rules, and writes every file
/// into a single container using one of four separator styles. `split`
/// restores the files from such a container, verifying paths and checksums.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Combine files into a single container.
    Combine(CombineArgs),
    /// Extract the files stored in a container.
    Split(SplitArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CombineArgs {
    // --- Input ---
    /// Source directory to bundle (repeatable).
    #[arg(short = 's', long = "source", value_name = "DIR")]
    pub sources: Vec<PathBuf>,

    /// File listing paths or globs to bundle, one per line (`#` starts a comment).
    #[arg(short = 'i', long = "input-file", value_name = "FILE")]
    pub input_file: Option<PathBuf>,

    /// File placed at the start of the bundle, in the given order (repeatable).
    #[arg(long = "include-file", value_name = "FILE")]
    pub include_files: Vec<PathBuf>,

    // --- Output ---
    /// Path of the container to write.
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Separator style: standard, detailed, markdown or machinereadable.
    #[arg(long, value_name = "STYLE")]
    pub separator_style: Option<String>,

    /// Line ending for separator lines: lf or crlf.
    #[arg(long, value_name = "EOL")]
    pub line_ending: Option<String>,

    /// Validate every file against this charset (utf-8, utf-16, utf-16-le, utf-16-be, ascii, latin-1, windows-1252).
    #[arg(long, value_name = "ENCODING")]
    pub target_encoding: Option<String>,

    /// Fail instead of substituting replacement characters on encoding errors.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub abort_on_encoding_error: bool,

    /// Keep blocks with duplicate content.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_dedup: bool,

    /// Also write `<stem>_filelist.txt` and `<stem>_dirlist.txt` next to the output.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub lists: bool,

    /// Append `_YYYYMMDD_HHMMSS` to the output file name.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub add_timestamp: bool,

    /// Overwrite the output without asking.
    #[arg(short = 'f', long, action = clap::ArgAction::SetTrue)]
    pub force: bool,

    /// List the files that would be bundled without writing anything.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub dry_run: bool,

    // --- Filtering ---
    /// Maximum file size to include (e.g., "50KB", "1MiB").
    #[arg(long, value_name = "SIZE")]
    pub max_file_size: Option<String>,

    /// Include only files with these extensions (comma separated or repeatable).
    #[arg(long, value_name = "EXT", num_args = 1.., value_delimiter = ',')]
    pub include_extensions: Option<Vec<String>>,

    /// Exclude files with these extensions. Takes precedence over inclusion.
    #[arg(long, value_name = "EXT", num_args = 1.., value_delimiter = ',')]
    pub exclude_extensions: Option<Vec<String>>,

    /// Gitignore-style patterns to exclude.
    #[arg(long, value_name = "GLOB", num_args = 1..)]
    pub exclude_patterns: Vec<String>,

    /// Gitignore-style patterns a file must match to be included.
    #[arg(long, value_name = "GLOB", num_args = 1..)]
    pub include_patterns: Vec<String>,

    /// File of gitignore-style exclude patterns (repeatable).
    #[arg(long = "exclude-paths-file", value_name = "FILE")]
    pub exclude_paths_files: Vec<PathBuf>,

    /// File of gitignore-style include patterns (repeatable).
    #[arg(long = "include-paths-file", value_name = "FILE")]
    pub include_paths_files: Vec<PathBuf>,

    /// Do not skip VCS metadata, dependency and build directories.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_default_excludes: bool,

    /// Do not read `.gitignore` and `.dirbundleignore` files.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_auto_ignore: bool,

    /// Include files and directories whose names start with a dot.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub include_dot_paths: bool,

    /// Include files detected as binary.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub include_binary: bool,

    /// Include symlinked files (cycles are always skipped).
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub include_symlinks: bool,

    // --- Security & Presets ---
    /// Scan for secrets before writing: none, warn, skip or abort.
    #[arg(long, value_name = "MODE")]
    pub security_check: Option<String>,

    /// YAML preset file (repeatable).
    #[arg(long = "preset", value_name = "FILE")]
    pub preset_files: Vec<PathBuf>,

    /// Only consult this preset group.
    #[arg(long, value_name = "NAME")]
    pub preset_group: Option<String>,

    /// Ignore all preset files.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub disable_presets: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    /// Container file to extract.
    #[arg(value_name = "CONTAINER")]
    pub container: PathBuf,

    /// Directory the files are written to.
    #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
    pub destination: PathBuf,

    /// Separator style of the container. Detected when omitted.
    #[arg(long, value_name = "STYLE")]
    pub style: Option<String>,

    /// Overwrite existing files.
    #[arg(short = 'f', long, action = clap::ArgAction::SetTrue)]
    pub force: bool,

    /// Write each file in its recorded original encoding instead of UTF-8.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub respect_encoding: bool,

    /// Modification time of extracted files: current or original.
    #[arg(long, value_name = "MODE", default_value = "current")]
    pub timestamp_mode: String,

    /// Compare each body with its recorded checksum.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub verify_checksums: bool,

    /// List the files that would be written without writing them.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub dry_run: bool,
}
