use super::types::{Preset, PresetGroup};
use crate::errors::{io_error_with_path, Error, Result};
use crate::processing::filters::CustomProcessor;
use log::debug;
use std::fs;
use std::path::Path;

/// The only preset file format version understood.
pub const PRESET_FORMAT_VERSION: u64 = 1;

fn preset_error(path: &str, reason: impl Into<String>) -> Error {
    Error::Preset {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn normalize_extensions(extensions: &mut [String]) {
    for ext in extensions.iter_mut() {
        *ext = ext.trim().trim_start_matches('.').to_lowercase();
    }
}

fn validate_preset(source: &str, name: &str, preset: &mut Preset) -> std::result::Result<(), String> {
    normalize_extensions(&mut preset.extensions);
    for pattern in &preset.patterns {
        glob::Pattern::new(pattern)
            .map_err(|e| format!("preset '{}': invalid pattern '{}': {}", name, pattern, e))?;
    }
    if let Some(processor) = &preset.custom_processor {
        CustomProcessor::from_name(processor, &preset.processor_args)
            .map_err(|e| format!("preset '{}': {}", name, e))?;
    }
    if preset.max_lines == Some(0) {
        return Err(format!("preset '{}': max_lines must be at least 1", name));
    }
    debug!("Validated preset '{}' from {}", name, source);
    Ok(())
}

/// Parses the text of a preset file.
///
/// The root is a mapping from group name to group. A top-level `version` key,
/// if present, must equal [`PRESET_FORMAT_VERSION`]. Groups keep the order in
/// which they are declared.
pub fn parse_preset_groups(text: &str, source: &str) -> Result<Vec<PresetGroup>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let root: serde_yaml::Mapping =
        serde_yaml::from_str(text).map_err(|e| preset_error(source, e.to_string()))?;

    let mut groups = Vec::new();
    for (key, value) in root {
        let name = key
            .as_str()
            .ok_or_else(|| preset_error(source, "group names must be strings"))?
            .to_string();
        if name == "version" {
            match value.as_u64() {
                Some(PRESET_FORMAT_VERSION) => continue,
                _ => {
                    return Err(preset_error(
                        source,
                        format!("unsupported version {:?}, expected {}", value, PRESET_FORMAT_VERSION),
                    ))
                }
            }
        }

        let mut group: PresetGroup = serde_yaml::from_value(value)
            .map_err(|e| preset_error(source, format!("group '{}': {}", name, e)))?;
        group.name = name;
        for (preset_name, preset) in group.presets.iter_mut() {
            validate_preset(source, preset_name, preset).map_err(|e| preset_error(source, e))?;
        }
        if let Some(settings) = group.global_settings.as_mut() {
            normalize_extensions(&mut settings.include_extensions);
            normalize_extensions(&mut settings.exclude_extensions);
            let entries = std::mem::take(&mut settings.extension_settings);
            for (ext, mut entry) in entries {
                validate_preset(source, &ext, &mut entry).map_err(|e| preset_error(source, e))?;
                settings
                    .extension_settings
                    .insert(ext.trim_start_matches('.').to_lowercase(), entry);
            }
        }
        groups.push(group);
    }
    Ok(groups)
}

/// Reads and parses one preset file.
pub fn load_preset_file(path: &Path) -> Result<Vec<PresetGroup>> {
    let text = fs::read_to_string(path).map_err(|e| io_error_with_path(e, path))?;
    let groups = parse_preset_groups(&text, &path.display().to_string())?;
    debug!("Loaded {} preset group(s) from {}", groups.len(), path.display());
    Ok(groups)
}
