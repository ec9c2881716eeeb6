//! The four container styles and the header/footer grammar shared by the
//! combiner (which renders it) and the splitter (which parses it).

mod language;
mod render;

pub use language::{fence_for, language_for_extension};
pub use render::{
    encoding_descriptor, format_local_timestamp, render_footer, render_header, BlockMetadata,
    MachineMetadata,
};

use crate::constants::MACHINE_MARKER_PREFIX;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Container grammar used to delimit files in a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeparatorStyle {
    /// One rule line with path and checksum.
    #[default]
    Standard,
    /// A boxed header with date, size, type, encoding and checksum.
    Detailed,
    /// A heading, a metadata line and a fenced code block.
    Markdown,
    /// JSON metadata between BEGIN/END markers keyed by a block identifier.
    MachineReadable,
}

impl SeparatorStyle {
    pub const ALL: [SeparatorStyle; 4] = [
        SeparatorStyle::Standard,
        SeparatorStyle::Detailed,
        SeparatorStyle::Markdown,
        SeparatorStyle::MachineReadable,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SeparatorStyle::Standard => "standard",
            SeparatorStyle::Detailed => "detailed",
            SeparatorStyle::Markdown => "markdown",
            SeparatorStyle::MachineReadable => "machinereadable",
        }
    }

    /// `true` if blocks of this style need a fresh block identifier.
    pub fn needs_block_id(&self) -> bool {
        *self == SeparatorStyle::MachineReadable
    }
}

impl fmt::Display for SeparatorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SeparatorStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "standard" => Ok(SeparatorStyle::Standard),
            "detailed" => Ok(SeparatorStyle::Detailed),
            "markdown" | "md" => Ok(SeparatorStyle::Markdown),
            "machinereadable" | "machine" => Ok(SeparatorStyle::MachineReadable),
            _ => Err(format!(
                "Unknown separator style '{}'. Expected one of: standard, detailed, markdown, machinereadable",
                s
            )),
        }
    }
}

/// Line terminator used for separator lines. File bodies are never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

impl FromStr for LineEnding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lf" | "unix" | "\n" => Ok(LineEnding::Lf),
            "crlf" | "windows" | "\r\n" => Ok(LineEnding::Crlf),
            other => Err(format!("Unknown line ending '{}'. Expected lf or crlf", other)),
        }
    }
}

/// Generates a fresh block identifier.
pub fn new_block_id() -> String {
    Uuid::new_v4().to_string()
}

/// The four marker lines of a MachineReadable block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    BeginMetadata,
    EndMetadata,
    BeginContent,
    EndContent,
}

impl MarkerKind {
    fn label(&self) -> &'static str {
        match self {
            MarkerKind::BeginMetadata => "BEGIN_FILE_METADATA_BLOCK",
            MarkerKind::EndMetadata => "END_FILE_METADATA_BLOCK",
            MarkerKind::BeginContent => "BEGIN_FILE_CONTENT_BLOCK",
            MarkerKind::EndContent => "END_FILE_CONTENT_BLOCK",
        }
    }
}

/// Renders a MachineReadable marker line, without line terminator.
///
/// # Examples
/// ```
/// use dirbundle::separator::{machine_marker, MarkerKind};
///
/// assert_eq!(
///     machine_marker(MarkerKind::EndContent, "abc"),
///     "--- DIRBUNDLE_END_FILE_CONTENT_BLOCK_abc ---"
/// );
/// ```
pub fn machine_marker(kind: MarkerKind, block_id: &str) -> String {
    format!("--- {}_{}_{} ---", MACHINE_MARKER_PREFIX, kind.label(), block_id)
}

/// Parses a marker line back into its kind and block identifier.
pub fn parse_machine_marker(line: &str) -> Option<(MarkerKind, &str)> {
    let inner = line
        .trim_end_matches(['\r', '\n'])
        .strip_prefix("--- ")?
        .strip_suffix(" ---")?
        .strip_prefix(MACHINE_MARKER_PREFIX)?
        .strip_prefix('_')?;
    [
        MarkerKind::BeginMetadata,
        MarkerKind::EndMetadata,
        MarkerKind::BeginContent,
        MarkerKind::EndContent,
    ]
    .into_iter()
    .find_map(|kind| {
        let id = inner.strip_prefix(kind.label())?.strip_prefix('_')?;
        (!id.is_empty()).then_some((kind, id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_parsing_is_lenient() {
        assert_eq!(
            "Machine-Readable".parse::<SeparatorStyle>(),
            Ok(SeparatorStyle::MachineReadable)
        );
        assert_eq!("DETAILED".parse::<SeparatorStyle>(), Ok(SeparatorStyle::Detailed));
        assert!("fancy".parse::<SeparatorStyle>().is_err());
        for style in SeparatorStyle::ALL {
            assert_eq!(style.name().parse::<SeparatorStyle>(), Ok(style));
        }
    }

    #[test]
    fn test_marker_round_trip() {
        let id = new_block_id();
        for kind in [
            MarkerKind::BeginMetadata,
            MarkerKind::EndMetadata,
            MarkerKind::BeginContent,
            MarkerKind::EndContent,
        ] {
            let line = machine_marker(kind, &id);
            assert_eq!(parse_machine_marker(&line), Some((kind, id.as_str())));
        }
        assert_eq!(parse_machine_marker("--- SOMETHING_ELSE ---"), None);
    }

    #[test]
    fn test_block_ids_are_unique() {
        assert_ne!(new_block_id(), new_block_id());
    }

    #[test]
    fn test_line_endings() {
        assert_eq!("CRLF".parse::<LineEnding>(), Ok(LineEnding::Crlf));
        assert_eq!(LineEnding::default().as_str(), "\n");
    }
}
