//! Small path, checksum and size helpers shared by the combiner and the splitter.

mod checksum;
mod paths;
mod size;

pub use checksum::sha256_hex;
pub use paths::{
    ancestor_directories, compare_bundle_order, compare_directory_order, is_descendant,
    remove_nested_paths, sanitize_relative_path, sort_for_bundle, to_posix,
};
pub use size::{format_size, parse_size};
