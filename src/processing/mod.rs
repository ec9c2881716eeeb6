//! Handles the processing stage of the `dirbundle` pipeline.
//!
//! Each file is decoded through the encoding handler and then passed through
//! the filter chain built from its resolved preset. The combiner calls
//! [`load_content`] from its worker pool, one file per task.

use crate::core_types::{FileContent, SourceFile};
use crate::encoding::{read_and_decode, EncodingOptions};
use crate::errors::Result;
use crate::presets::{Action, ResolvedPreset};
use log::{debug, trace};

pub mod filters;

use filters::{
    comment_style_for_extension, CompressWhitespaceFilter, ContentFilter, CustomProcessorFilter,
    JoinParagraphsFilter, MinifyFilter, MinifyKind, RemoveCommentsFilter, RemoveEmptyLinesFilter,
    StripMetadataFilter, StripTagsFilter, TruncateLinesFilter,
};

/// Builds the ordered filter chain for a file.
///
/// Metadata stripping runs first, then the preset's actions in declaration
/// order, then `max_lines` truncation. A custom processor runs at the
/// position of its `custom` action, or after all actions if none is listed.
/// Actions that do not apply to the file type are skipped.
///
/// # Examples
/// ```
/// use dirbundle::presets::{Action, ResolvedPreset};
/// use dirbundle::processing::build_filter_chain;
///
/// let preset = ResolvedPreset {
///     actions: vec![Action::StripComments, Action::RemoveEmptyLines],
///     max_lines: Some(10),
///     ..Default::default()
/// };
/// let names: Vec<&str> = build_filter_chain(&preset, Some("rs"))
///     .iter()
///     .map(|f| f.name())
///     .collect();
/// assert_eq!(
///     names,
///     vec!["RemoveCommentsFilter", "RemoveEmptyLinesFilter", "TruncateLinesFilter"]
/// );
/// ```
pub fn build_filter_chain(
    preset: &ResolvedPreset,
    extension: Option<&str>,
) -> Vec<Box<dyn ContentFilter>> {
    let mut chain: Vec<Box<dyn ContentFilter>> = Vec::new();
    if preset.strip_metadata {
        chain.push(Box::new(StripMetadataFilter));
    }

    let custom = preset.custom_processor.as_ref().map(|processor| CustomProcessorFilter {
        processor: processor.clone(),
        extension: extension.map(str::to_string),
    });
    let mut custom = custom.map(|f| Box::new(f) as Box<dyn ContentFilter>);

    for action in &preset.actions {
        let filter: Option<Box<dyn ContentFilter>> = match action {
            Action::StripTags => Some(Box::new(StripTagsFilter {
                strip: preset.strip_tags.clone(),
                preserve: preset.preserve_tags.clone(),
            })),
            Action::Minify => MinifyKind::for_extension(extension)
                .map(|kind| Box::new(MinifyFilter(kind)) as Box<dyn ContentFilter>),
            Action::StripComments => comment_style_for_extension(extension)
                .map(|style| Box::new(RemoveCommentsFilter(style)) as Box<dyn ContentFilter>),
            Action::CompressWhitespace => Some(Box::new(CompressWhitespaceFilter)),
            Action::RemoveEmptyLines => Some(Box::new(RemoveEmptyLinesFilter)),
            Action::JoinParagraphs => Some(Box::new(JoinParagraphsFilter)),
            Action::Custom => custom.take(),
        };
        match filter {
            Some(filter) => chain.push(filter),
            None => debug!(
                "Action {:?} does not apply to extension {:?}; skipped",
                action, extension
            ),
        }
    }

    if let Some(filter) = custom {
        chain.push(filter);
    }
    if let Some(max_lines) = preset.max_lines {
        chain.push(Box::new(TruncateLinesFilter { max_lines }));
    }
    chain
}

/// Runs `content` through `filters` in order.
pub fn apply_filters(
    mut content: String,
    filters: &[Box<dyn ContentFilter>],
    relative_path: &str,
) -> String {
    for filter in filters {
        content = filter.apply(&content);
        trace!("Applied filter '{}' to {}", filter.name(), relative_path);
    }
    content
}

/// Reads a file, decodes it and applies its preset's transformations.
///
/// Binary files included on request are decoded but never transformed.
pub fn load_content(file: &SourceFile, options: &EncodingOptions) -> Result<FileContent> {
    let mut content = read_and_decode(&file.absolute_path, options)?;
    match &file.preset {
        Some(preset) if !file.is_binary => {
            let chain = build_filter_chain(preset, file.extension().as_deref());
            if !chain.is_empty() {
                content.text = apply_filters(content.text, &chain, &file.relative_path);
            }
        }
        Some(_) => debug!(
            "Skipping transformations for binary file {}",
            file.relative_path
        ),
        None => {}
    }
    Ok(content)
}
