// src/config/builder_logic.rs

use super::ConfigBuilder;
use crate::errors::{ConfigError, Result};

/// Validates combinations of options on the `ConfigBuilder`.
pub(super) fn validate_builder_options(builder: &ConfigBuilder) -> Result<()> {
    if builder.preset_group.is_some() && builder.disable_presets.unwrap_or(false) {
        return Err(ConfigError::Conflict {
            option1: "--preset-group".to_string(),
            option2: "--disable-presets".to_string(),
        }
        .into());
    }
    if builder.preset_group.is_some() && builder.preset_files.is_empty() {
        return Err(ConfigError::MissingDependency {
            option: "--preset-group".to_string(),
            required: "--preset".to_string(),
        }
        .into());
    }
    if builder.sources.is_empty() && builder.input_file.is_none() {
        return Err(ConfigError::MissingInput.into());
    }
    if builder.output_file.is_none() && !builder.dry_run.unwrap_or(false) {
        return Err(ConfigError::MissingOutput.into());
    }
    Ok(())
}

