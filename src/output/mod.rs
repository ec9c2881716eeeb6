// src/output/mod.rs

//! Everything that writes a combine run to disk: the ordered container
//! writer, output naming, the sibling list files, overwrite confirmation and
//! the dry-run listing.

mod combiner;
mod dry_run;
mod lists;
mod prompt;

pub use combiner::{Combiner, WriteStats};
pub use dry_run::write_dry_run_output;
pub use lists::{list_paths, timestamped_path, write_lists};
pub use prompt::{AllowOverwrite, ConsolePrompt, DenyOverwrite, OverwritePrompt};
