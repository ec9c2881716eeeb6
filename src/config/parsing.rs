// src/config/parsing.rs

use crate::encoding::Charset;
use crate::errors::ConfigError;
use crate::utils::parse_size;
use std::str::FromStr;

fn invalid(option: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        option: option.to_string(),
        reason: reason.into(),
    }
}

/// Parses the optional max size string into bytes.
pub(super) fn parse_max_size(max_size_str: Option<&str>) -> Result<Option<u64>, ConfigError> {
    max_size_str
        .map(|s| parse_size(s).map_err(|e| invalid("--max-file-size", e)))
        .transpose()
}

/// Parses an optional value whose `FromStr` error is a message.
pub(super) fn parse_choice<T>(value: Option<&str>, option: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr<Err = String>,
{
    value
        .map(|s| s.parse::<T>().map_err(|e| invalid(option, e)))
        .transpose()
}

/// Parses a target charset, rejecting charsets that are not conversion targets.
pub(super) fn parse_target_encoding(value: Option<&str>) -> Result<Option<Charset>, ConfigError> {
    let Some(charset) = parse_choice::<Charset>(value, "--target-encoding")? else {
        return Ok(None);
    };
    if !charset.is_conversion_target() {
        return Err(invalid(
            "--target-encoding",
            format!(
                "'{}' is not supported; expected one of: {}",
                charset,
                super::supported_targets().join(", ")
            ),
        ));
    }
    Ok(Some(charset))
}

/// Normalizes extensions to lowercase without a leading dot, splitting on commas.
pub(super) fn normalize_extensions(exts: Option<Vec<String>>) -> Option<Vec<String>> {
    exts.map(|v| {
        v.iter()
            .flat_map(|s| s.split(','))
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
