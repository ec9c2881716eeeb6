// src/filtering/mod.rs

//! Provides standalone functions for file filtering logic.
//!
//! These functions are used by the discovery stage to decide which candidates
//! enter the bundle. They are exposed publicly so they can be reused on their own.

mod blocklist;
mod dot_paths;
mod extension;
mod size;
mod text_detection;

pub use blocklist::{is_default_excluded_dir, is_default_excluded_file};
pub use dot_paths::{has_dot_component, is_dot_name};
pub use extension::passes_extension_filters;
pub use size::{effective_size_limit, passes_size_filter};
pub use text_detection::{is_likely_text, is_likely_text_from_buffer};
