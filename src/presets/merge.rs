use super::types::{Action, GlobalSettings, Preset, PresetGroup};
use crate::processing::filters::CustomProcessor;
use crate::security::SecurityMode;
use crate::separator::SeparatorStyle;
use log::warn;

fn union_into(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

impl GlobalSettings {
    /// Folds a lower-priority group's settings into `self`.
    ///
    /// Scalars already set are kept, lists are unioned in order, and
    /// extension entries are added only for extensions not yet present.
    pub fn absorb(&mut self, lower: &GlobalSettings) {
        self.encoding = self.encoding.or(lower.encoding);
        self.separator_style = self.separator_style.or(lower.separator_style);
        self.line_ending = self.line_ending.or(lower.line_ending);
        self.max_file_size = self.max_file_size.or(lower.max_file_size);
        self.security_check = self.security_check.or(lower.security_check);
        self.include_dot_paths = self.include_dot_paths.or(lower.include_dot_paths);
        self.include_binary = self.include_binary.or(lower.include_binary);
        union_into(&mut self.include_patterns, &lower.include_patterns);
        union_into(&mut self.exclude_patterns, &lower.exclude_patterns);
        union_into(&mut self.include_extensions, &lower.include_extensions);
        union_into(&mut self.exclude_extensions, &lower.exclude_extensions);
        for (ext, entry) in &lower.extension_settings {
            self.extension_settings
                .entry(ext.clone())
                .or_insert_with(|| entry.clone());
        }
    }
}

/// Merges the global settings of `groups`, which must already be sorted by
/// descending priority. Disabled groups are ignored.
pub fn merge_global_settings<'a>(groups: impl IntoIterator<Item = &'a PresetGroup>) -> GlobalSettings {
    let mut merged = GlobalSettings::default();
    for group in groups.into_iter().filter(|g| g.enabled) {
        if let Some(settings) = &group.global_settings {
            merged.absorb(settings);
        }
    }
    merged
}

/// The effective overrides for one file: the matched preset merged with the
/// extension defaults from the global settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPreset {
    /// `group/preset`, or `extension_settings.<ext>` when only the extension entry applied.
    pub source: String,
    pub actions: Vec<Action>,
    pub strip_tags: Vec<String>,
    pub preserve_tags: Vec<String>,
    pub separator_style: Option<SeparatorStyle>,
    pub max_lines: Option<usize>,
    /// Size ceiling set on the matched preset itself; wins outright.
    pub explicit_max_file_size: Option<u64>,
    /// Size ceiling from the extension defaults; the smaller of it and the global ceiling applies.
    pub inherited_max_file_size: Option<u64>,
    pub security_check: Option<SecurityMode>,
    pub include_dot_paths: Option<bool>,
    pub include_binary: Option<bool>,
    pub strip_metadata: bool,
    pub custom_processor: Option<CustomProcessor>,
}

impl ResolvedPreset {
    /// `true` unless the preset turns secret scanning off for this file.
    pub fn allows_security_scan(&self) -> bool {
        self.security_check != Some(SecurityMode::Off)
    }
}

fn processor_of(preset: &Preset, source: &str) -> Option<CustomProcessor> {
    let name = preset.custom_processor.as_deref()?;
    match CustomProcessor::from_name(name, &preset.processor_args) {
        Ok(processor) => Some(processor),
        Err(reason) => {
            // Loading validates names, so this only triggers for hand-built presets.
            warn!("Ignoring custom processor in '{}': {}", source, reason);
            None
        }
    }
}

/// Merges a matched preset with the extension entry for the same file type.
///
/// Values set on the preset win. `actions` and `strip_tags` come from the
/// extension entry only when the preset leaves them empty; `preserve_tags`
/// are unioned.
pub fn merge_with_extension_defaults(
    source: String,
    preset: Option<&Preset>,
    extension_entry: Option<&Preset>,
) -> ResolvedPreset {
    let empty = Preset::default();
    let local = preset.unwrap_or(&empty);
    let inherited = extension_entry.unwrap_or(&empty);

    let mut preserve_tags = local.preserve_tags.clone();
    union_into(&mut preserve_tags, &inherited.preserve_tags);

    let pick = |own: &Vec<String>, other: &Vec<String>| {
        if own.is_empty() {
            other.clone()
        } else {
            own.clone()
        }
    };

    let (explicit_max_file_size, inherited_max_file_size) = if preset.is_some() {
        (local.max_file_size, inherited.max_file_size)
    } else {
        (None, inherited.max_file_size)
    };

    ResolvedPreset {
        actions: if local.actions.is_empty() {
            inherited.actions.clone()
        } else {
            local.actions.clone()
        },
        strip_tags: pick(&local.strip_tags, &inherited.strip_tags),
        preserve_tags,
        separator_style: local.separator_style.or(inherited.separator_style),
        max_lines: local.max_lines.or(inherited.max_lines),
        explicit_max_file_size,
        inherited_max_file_size,
        security_check: local.security_check.or(inherited.security_check),
        include_dot_paths: local.include_dot_paths.or(inherited.include_dot_paths),
        include_binary: local.include_binary.or(inherited.include_binary),
        strip_metadata: local.strip_metadata.or(inherited.strip_metadata).unwrap_or(false),
        custom_processor: processor_of(local, &source).or_else(|| processor_of(inherited, &source)),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(priority: i64, settings: GlobalSettings) -> PresetGroup {
        PresetGroup {
            priority,
            global_settings: Some(settings),
            ..Default::default()
        }
    }

    #[test]
    fn test_global_settings_merge_by_priority() {
        let high = GlobalSettings {
            separator_style: Some(SeparatorStyle::Markdown),
            exclude_patterns: vec!["*.log".into()],
            ..Default::default()
        };
        let mut low = GlobalSettings {
            separator_style: Some(SeparatorStyle::Detailed),
            max_file_size: Some(100),
            exclude_patterns: vec!["*.tmp".into(), "*.log".into()],
            ..Default::default()
        };
        low.extension_settings.insert("md".into(), Preset::default());

        let mut disabled = group(
            -1,
            GlobalSettings {
                include_binary: Some(true),
                ..Default::default()
            },
        );
        disabled.enabled = false;

        let groups = [group(10, high), group(1, low), disabled];
        let merged = merge_global_settings(&groups);
        assert_eq!(merged.separator_style, Some(SeparatorStyle::Markdown));
        assert_eq!(merged.max_file_size, Some(100));
        assert_eq!(merged.exclude_patterns, vec!["*.log", "*.tmp"]);
        assert!(merged.extension_settings.contains_key("md"));
        assert_eq!(merged.include_binary, None);
    }

    #[test]
    fn test_local_values_win_and_lists_inherit_when_empty() {
        let local = Preset {
            preserve_tags: vec!["pre".into()],
            max_file_size: Some(500),
            separator_style: Some(SeparatorStyle::Standard),
            ..Default::default()
        };
        let entry = Preset {
            actions: vec![Action::StripTags],
            strip_tags: vec!["nav".into()],
            preserve_tags: vec!["code".into(), "pre".into()],
            separator_style: Some(SeparatorStyle::Markdown),
            max_file_size: Some(50),
            strip_metadata: Some(true),
            ..Default::default()
        };
        let resolved = merge_with_extension_defaults("g/html".into(), Some(&local), Some(&entry));
        assert_eq!(resolved.actions, vec![Action::StripTags]);
        assert_eq!(resolved.strip_tags, vec!["nav"]);
        assert_eq!(resolved.preserve_tags, vec!["pre", "code"]);
        assert_eq!(resolved.separator_style, Some(SeparatorStyle::Standard));
        assert_eq!(resolved.explicit_max_file_size, Some(500));
        assert_eq!(resolved.inherited_max_file_size, Some(50));
        assert!(resolved.strip_metadata);
    }

    #[test]
    fn test_local_actions_are_not_extended() {
        let local = Preset {
            actions: vec![Action::Minify],
            ..Default::default()
        };
        let entry = Preset {
            actions: vec![Action::StripComments, Action::RemoveEmptyLines],
            ..Default::default()
        };
        let resolved = merge_with_extension_defaults("g/js".into(), Some(&local), Some(&entry));
        assert_eq!(resolved.actions, vec![Action::Minify]);
    }

    #[test]
    fn test_security_off_disables_scan() {
        let local = Preset {
            security_check: Some(SecurityMode::Off),
            ..Default::default()
        };
        let resolved = merge_with_extension_defaults("g/p".into(), Some(&local), None);
        assert!(!resolved.allows_security_scan());
        assert!(ResolvedPreset::default().allows_security_scan());
    }
}
