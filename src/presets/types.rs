// Typed records for preset files. Every field is optional so a preset only
// states what it overrides.

use crate::encoding::Charset;
use crate::security::SecurityMode;
use crate::separator::{LineEnding, SeparatorStyle};
use crate::utils::parse_size;
use serde::{de, Deserialize, Deserializer};
use std::collections::BTreeMap;

macro_rules! deserialize_from_str {
    ($($ty:ty),* $(,)?) => {$(
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    )*};
}

deserialize_from_str!(SeparatorStyle, LineEnding, SecurityMode, Charset);

/// A transformation step applied to file content, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Remove HTML tags, honouring `strip_tags` and `preserve_tags`.
    StripTags,
    /// Format-aware minification for HTML, CSS and JavaScript.
    Minify,
    /// Language-aware comment removal.
    #[serde(alias = "remove_comments")]
    StripComments,
    CompressWhitespace,
    #[serde(alias = "remove_empty_lines_action")]
    RemoveEmptyLines,
    JoinParagraphs,
    /// Run the preset's `custom_processor` at this position.
    Custom,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Bytes(u64),
    Text(String),
}

/// Accepts either a byte count or a size string such as `"50KB"`.
fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<SizeValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(SizeValue::Bytes(n)) => Ok(Some(n)),
        Some(SizeValue::Text(s)) => parse_size(&s).map(Some).map_err(de::Error::custom),
    }
}

/// A rule set that selects files by extension or glob and transforms them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Preset {
    pub description: Option<String>,
    /// Extensions without the leading dot; matched case-insensitively.
    pub extensions: Vec<String>,
    /// Globs matched against the file name and the relative path.
    pub patterns: Vec<String>,
    pub actions: Vec<Action>,
    /// Elements removed with their content by `strip_tags`.
    pub strip_tags: Vec<String>,
    /// Tags `strip_tags` keeps.
    pub preserve_tags: Vec<String>,
    pub separator_style: Option<SeparatorStyle>,
    pub max_lines: Option<usize>,
    #[serde(deserialize_with = "deserialize_size")]
    pub max_file_size: Option<u64>,
    pub security_check: Option<SecurityMode>,
    pub include_dot_paths: Option<bool>,
    pub include_binary: Option<bool>,
    pub strip_metadata: Option<bool>,
    pub custom_processor: Option<String>,
    pub processor_args: BTreeMap<String, serde_yaml::Value>,
}

/// Project-wide defaults contributed by a preset group.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    pub encoding: Option<Charset>,
    pub separator_style: Option<SeparatorStyle>,
    pub line_ending: Option<LineEnding>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub include_extensions: Vec<String>,
    pub exclude_extensions: Vec<String>,
    #[serde(deserialize_with = "deserialize_size")]
    pub max_file_size: Option<u64>,
    pub security_check: Option<SecurityMode>,
    pub include_dot_paths: Option<bool>,
    pub include_binary: Option<bool>,
    /// Per-extension defaults merged into whichever preset matches a file.
    pub extension_settings: BTreeMap<String, Preset>,
}

fn default_enabled() -> bool {
    true
}

/// A named, prioritised collection of presets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PresetGroup {
    /// Taken from the group's key in the preset file.
    #[serde(skip)]
    pub name: String,
    pub description: Option<String>,
    /// Higher priorities are consulted first.
    pub priority: i64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub global_settings: Option<GlobalSettings>,
    /// Presets in declaration order. The one named `default` is the fallback.
    #[serde(deserialize_with = "deserialize_ordered_presets")]
    pub presets: Vec<(String, Preset)>,
}

impl Default for PresetGroup {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            priority: 0,
            enabled: true,
            global_settings: None,
            presets: Vec::new(),
        }
    }
}

impl PresetGroup {
    /// The preset used for files no named preset matches.
    pub fn default_preset(&self) -> Option<&Preset> {
        self.presets
            .iter()
            .find(|(name, _)| name == "default")
            .map(|(_, preset)| preset)
    }

    /// Presets other than `default`, in declaration order.
    pub fn named_presets(&self) -> impl Iterator<Item = (&str, &Preset)> {
        self.presets
            .iter()
            .filter(|(name, _)| name != "default")
            .map(|(name, preset)| (name.as_str(), preset))
    }
}

// A YAML mapping keeps insertion order, which a BTreeMap would lose.
fn deserialize_ordered_presets<'de, D>(deserializer: D) -> Result<Vec<(String, Preset)>, D::Error>
where
    D: Deserializer<'de>,
{
    let mapping = serde_yaml::Mapping::deserialize(deserializer)?;
    mapping
        .into_iter()
        .map(|(key, value)| {
            let name = key
                .as_str()
                .ok_or_else(|| de::Error::custom("preset names must be strings"))?
                .to_string();
            let preset: Preset = serde_yaml::from_value(value)
                .map_err(|e| de::Error::custom(format!("preset '{}': {}", name, e)))?;
            Ok((name, preset))
        })
        .collect()
}
