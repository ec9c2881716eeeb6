//! Defines the library's error types.
//!
//! The `Error` enum is a closed set of failure kinds. Callers match on the kind
//! to decide whether to recover (skip a file, fall back to another encoding) or
//! to propagate the failure to the top level.

use std::path::Path;
use thiserror::Error;

/// A specialized `Result` type for `dirbundle` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while combining or splitting a bundle.
#[derive(Error, Debug)]
pub enum Error {
    /// A source, manifest, preset file or container does not exist.
    #[error("Path not found: '{path}'")]
    NotFound {
        /// The missing path.
        path: String,
    },

    /// A path exists but cannot be read or written.
    #[error("Permission denied: '{path}'")]
    PermissionDenied {
        /// The inaccessible path.
        path: String,
    },

    /// Any other I/O failure, with the path that caused it.
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        /// The path that caused the I/O error.
        path: String,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    /// A decode or encode step failed while strict encoding handling was requested.
    #[error("Encoding error in '{path}' ({encoding}): {reason}")]
    Encoding {
        /// The file being decoded or encoded.
        path: String,
        /// The charset involved.
        encoding: String,
        /// What went wrong.
        reason: String,
    },

    /// Invalid or contradictory configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A preset file could not be parsed or contains invalid values.
    #[error("Invalid preset file '{path}': {reason}")]
    Preset {
        /// The preset file.
        path: String,
        /// Parser or validation message.
        reason: String,
    },

    /// The secret scanner flagged content and the run was configured to abort.
    #[error("Security check failed: {count} potential secret(s) found. {summary}")]
    Security {
        /// Number of findings.
        count: usize,
        /// Human-readable summary of the first findings.
        summary: String,
    },

    /// The container file does not follow the expected grammar.
    #[error("Malformed container at line {line}: {reason}")]
    Container {
        /// One-based line number where parsing failed.
        line: usize,
        /// What was expected.
        reason: String,
    },

    /// A MachineReadable metadata block could not be serialized or parsed.
    #[error("Invalid block metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// The output file already exists and overwriting was declined.
    #[error("Output file '{path}' already exists and was not overwritten")]
    OutputExists {
        /// The existing output path.
        path: String,
    },

    /// Error indicating that the operation was cancelled by the user (e.g., Ctrl+C).
    #[error("Operation cancelled by user (Ctrl+C)")]
    Interrupted,

    /// Error indicating that no files were found that matched the given criteria.
    #[error("No files found matching the specified criteria.")]
    NoFilesFound,
}

/// Errors raised while validating configuration options.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Two options cannot be used together.
    #[error("Options '{option1}' and '{option2}' cannot be used together")]
    Conflict {
        /// First option name.
        option1: String,
        /// Second option name.
        option2: String,
    },
    /// An option requires another option to be set.
    #[error("Option '{option}' requires '{required}'")]
    MissingDependency {
        /// The dependent option.
        option: String,
        /// The required option.
        required: String,
    },
    /// An option value could not be parsed or is out of range.
    #[error("Invalid value for '{option}': {reason}")]
    InvalidValue {
        /// The option name.
        option: String,
        /// Why the value is invalid.
        reason: String,
    },
    /// Neither a source directory nor an input manifest was given.
    #[error("No input given: provide at least one source directory or an input file list")]
    MissingInput,
    /// No output path was given.
    #[error("No output path given")]
    MissingOutput,
}

/// Helper function to turn an `std::io::Error` into an `Error` with path context.
///
/// `NotFound` and `PermissionDenied` are mapped onto their dedicated variants so
/// callers can apply the skip-or-propagate policy by matching on the kind.
///
/// # Examples
///
/// ```
/// use dirbundle::errors::{io_error_with_path, Error};
/// use std::io;
///
/// let err = io_error_with_path(io::Error::new(io::ErrorKind::NotFound, "gone"), "a/b.txt");
/// assert!(matches!(err, Error::NotFound { .. }));
/// ```
pub fn io_error_with_path<P: AsRef<Path>>(source: std::io::Error, path: P) -> Error {
    let path = path.as_ref().display().to_string();
    match source.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound { path },
        std::io::ErrorKind::PermissionDenied => Error::PermissionDenied { path },
        _ => Error::Io { path, source },
    }
}

impl Error {
    /// Returns `true` for per-file failures that discovery and reading may skip.
    pub fn is_recoverable_file_error(&self) -> bool {
        matches!(self, Error::PermissionDenied { .. } | Error::NotFound { .. })
    }
}
