//! Preset groups: per-file-type overrides and transformations loaded from YAML.
//!
//! A preset file maps group names to groups. Each group has a priority, an
//! optional `global_settings` record and an ordered set of presets, one of
//! which may be named `default`. [`PresetRegistry`] sorts the groups and
//! resolves the effective preset for a file.

mod loader;
mod merge;
mod types;

pub use loader::{load_preset_file, parse_preset_groups, PRESET_FORMAT_VERSION};
pub use merge::{merge_global_settings, merge_with_extension_defaults, ResolvedPreset};
pub use types::{Action, GlobalSettings, Preset, PresetGroup};

use crate::errors::Result;
use log::{debug, warn};
use std::cmp::Reverse;
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct CompiledGroup {
    group: PresetGroup,
    /// Glob patterns of each named preset, index-aligned with `group.presets`.
    patterns: Vec<Vec<glob::Pattern>>,
}

impl CompiledGroup {
    fn new(group: PresetGroup) -> Self {
        let patterns = group
            .presets
            .iter()
            .map(|(name, preset)| {
                preset
                    .patterns
                    .iter()
                    .filter_map(|p| match glob::Pattern::new(p) {
                        Ok(pattern) => Some(pattern),
                        Err(e) => {
                            warn!("Ignoring invalid pattern '{}' in preset '{}': {}", p, name, e);
                            None
                        }
                    })
                    .collect()
            })
            .collect();
        Self { group, patterns }
    }

    /// First named preset matching the file, else the group's default.
    fn find(&self, extension: Option<&str>, file_name: &str, relative_path: &str) -> Option<(&str, &Preset)> {
        let named = self
            .group
            .presets
            .iter()
            .zip(&self.patterns)
            .filter(|((name, _), _)| name != "default")
            .find(|((_, preset), patterns)| {
                extension.is_some_and(|ext| preset.extensions.iter().any(|e| e == ext))
                    || patterns
                        .iter()
                        .any(|p| p.matches(file_name) || p.matches(relative_path))
            })
            .map(|((name, preset), _)| (name.as_str(), preset));
        named.or_else(|| self.group.default_preset().map(|p| ("default", p)))
    }
}

/// All loaded preset groups, sorted by descending priority, plus their merged
/// global settings.
#[derive(Debug, Default)]
pub struct PresetRegistry {
    groups: Vec<CompiledGroup>,
    global: GlobalSettings,
}

impl PresetRegistry {
    /// Builds a registry. Groups of equal priority keep their given order.
    pub fn new(mut groups: Vec<PresetGroup>) -> Self {
        groups.sort_by_key(|g| Reverse(g.priority));
        let global = merge_global_settings(&groups);
        Self {
            groups: groups.into_iter().map(CompiledGroup::new).collect(),
            global,
        }
    }

    /// Loads every preset file in order. A group redefined by a later file
    /// replaces the earlier definition.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut groups: Vec<PresetGroup> = Vec::new();
        for path in paths {
            for group in load_preset_file(path)? {
                if let Some(pos) = groups.iter().position(|g| g.name == group.name) {
                    warn!(
                        "Preset group '{}' from {} replaces an earlier definition",
                        group.name,
                        path.display()
                    );
                    groups.remove(pos);
                }
                groups.push(group);
            }
        }
        Ok(Self::new(groups))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Settings merged across all enabled groups.
    pub fn global_settings(&self) -> &GlobalSettings {
        &self.global
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g.group.name == name)
    }

    /// Group names in resolution order.
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.group.name.as_str()).collect()
    }

    /// `true` if any preset could let a dot path in, so the walker must not
    /// prune hidden directories up front.
    pub fn may_include_dot_paths(&self) -> bool {
        self.groups
            .iter()
            .flat_map(|g| g.group.presets.iter().map(|(_, p)| p))
            .chain(self.global.extension_settings.values())
            .any(|p| p.include_dot_paths == Some(true))
    }

    /// Resolves the effective preset for a file.
    ///
    /// With `group`, only that group is consulted; otherwise enabled groups
    /// are tried in priority order and the first one with a matching named
    /// preset or a default wins. The result is merged with the extension
    /// entry of the global settings. With no preset at all, the extension
    /// entry alone applies. `None` means no overrides.
    ///
    /// # Examples
    /// ```
    /// use dirbundle::presets::{parse_preset_groups, PresetRegistry};
    ///
    /// let yaml = "docs:\n  presets:\n    markdown:\n      extensions: [md]\n      max_lines: 5\n";
    /// let registry = PresetRegistry::new(parse_preset_groups(yaml, "inline").unwrap());
    /// let resolved = registry.resolve("guide/intro.md", None).unwrap();
    /// assert_eq!(resolved.source, "docs/markdown");
    /// assert_eq!(resolved.max_lines, Some(5));
    /// assert!(registry.resolve("main.rs", None).is_none());
    /// ```
    pub fn resolve(&self, relative_path: &str, group: Option<&str>) -> Option<ResolvedPreset> {
        let path = Path::new(relative_path);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(relative_path);

        let matched = self
            .groups
            .iter()
            .filter(|g| match group {
                Some(requested) => g.group.name == requested,
                None => g.group.enabled,
            })
            .find_map(|g| {
                g.find(extension.as_deref(), file_name, relative_path)
                    .map(|(name, preset)| (format!("{}/{}", g.group.name, name), preset))
            });

        let entry = extension
            .as_deref()
            .and_then(|ext| self.global.extension_settings.get(ext));

        let resolved = match (matched, entry) {
            (Some((source, preset)), entry) => {
                merge_with_extension_defaults(source, Some(preset), entry)
            }
            (None, Some(entry)) => merge_with_extension_defaults(
                format!("extension_settings.{}", extension.as_deref().unwrap_or_default()),
                None,
                Some(entry),
            ),
            (None, None) => return None,
        };
        debug!("Preset '{}' applies to {}", resolved.source, relative_path);
        Some(resolved)
    }
}
