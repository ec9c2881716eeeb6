//! Provides a trait and implementations for transforming file content.
//!
//! Each preset action maps to one filter; a file's filters are applied in the
//! order the preset declares them.

use std::fmt;

mod comments;
mod custom;
mod empty_lines;
mod html;
mod metadata;
mod minify;
mod paragraphs;
mod whitespace;

pub use comments::{
    comment_style_for_extension, remove_c_style_comments, remove_hash_comments,
    remove_markup_comments, CommentStyle,
};
pub use custom::{extract_functions, truncate_chars, CustomProcessor};
pub use empty_lines::remove_empty_lines;
pub use html::strip_tags;
pub use metadata::strip_metadata;
pub use minify::{minify, MinifyKind};
pub use paragraphs::join_paragraphs;
pub use whitespace::compress_whitespace;

use crate::constants::TRUNCATION_MARKER;

/// A trait for content transformation filters.
///
/// Filters are applied sequentially to the decoded text of each file.
pub trait ContentFilter: Send + Sync {
    /// Applies the filter to the given content string.
    fn apply(&self, content: &str) -> String;
    /// Returns a descriptive name for the filter.
    fn name(&self) -> &'static str;
}

impl fmt::Debug for Box<dyn ContentFilter> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentFilter").field(&self.name()).finish()
    }
}

/// Removes comments using the syntax of the file's language.
#[derive(Debug)]
pub struct RemoveCommentsFilter(pub CommentStyle);

impl ContentFilter for RemoveCommentsFilter {
    fn apply(&self, content: &str) -> String {
        match self.0 {
            CommentStyle::CStyle => remove_c_style_comments(content),
            CommentStyle::Hash { triple_quotes } => remove_hash_comments(content, triple_quotes),
            CommentStyle::Markup => remove_markup_comments(content),
        }
    }
    fn name(&self) -> &'static str {
        "RemoveCommentsFilter"
    }
}

/// Filter to remove lines containing only whitespace.
#[derive(Debug)]
pub struct RemoveEmptyLinesFilter;

impl ContentFilter for RemoveEmptyLinesFilter {
    fn apply(&self, content: &str) -> String {
        remove_empty_lines(content)
    }
    fn name(&self) -> &'static str {
        "RemoveEmptyLinesFilter"
    }
}

/// Strips HTML tags, dropping `strip` elements with their content and keeping `preserve` tags.
#[derive(Debug)]
pub struct StripTagsFilter {
    pub strip: Vec<String>,
    pub preserve: Vec<String>,
}

impl ContentFilter for StripTagsFilter {
    fn apply(&self, content: &str) -> String {
        strip_tags(content, &self.strip, &self.preserve)
    }
    fn name(&self) -> &'static str {
        "StripTagsFilter"
    }
}

#[derive(Debug)]
pub struct MinifyFilter(pub MinifyKind);

impl ContentFilter for MinifyFilter {
    fn apply(&self, content: &str) -> String {
        minify(content, self.0)
    }
    fn name(&self) -> &'static str {
        "MinifyFilter"
    }
}

#[derive(Debug)]
pub struct CompressWhitespaceFilter;

impl ContentFilter for CompressWhitespaceFilter {
    fn apply(&self, content: &str) -> String {
        compress_whitespace(content)
    }
    fn name(&self) -> &'static str {
        "CompressWhitespaceFilter"
    }
}

#[derive(Debug)]
pub struct JoinParagraphsFilter;

impl ContentFilter for JoinParagraphsFilter {
    fn apply(&self, content: &str) -> String {
        join_paragraphs(content)
    }
    fn name(&self) -> &'static str {
        "JoinParagraphsFilter"
    }
}

/// Removes YAML front matter and trailing scraper footers.
#[derive(Debug)]
pub struct StripMetadataFilter;

impl ContentFilter for StripMetadataFilter {
    fn apply(&self, content: &str) -> String {
        strip_metadata(content)
    }
    fn name(&self) -> &'static str {
        "StripMetadataFilter"
    }
}

/// Runs a named custom processor. `extension` selects language-specific behaviour.
#[derive(Debug)]
pub struct CustomProcessorFilter {
    pub processor: CustomProcessor,
    pub extension: Option<String>,
}

impl ContentFilter for CustomProcessorFilter {
    fn apply(&self, content: &str) -> String {
        self.processor.run(content, self.extension.as_deref())
    }
    fn name(&self) -> &'static str {
        "CustomProcessorFilter"
    }
}

/// Keeps the first `max_lines` lines and appends a visible truncation marker.
#[derive(Debug)]
pub struct TruncateLinesFilter {
    pub max_lines: usize,
}

impl ContentFilter for TruncateLinesFilter {
    fn apply(&self, content: &str) -> String {
        if content.lines().count() <= self.max_lines {
            return content.to_string();
        }
        let mut kept: Vec<&str> = content.lines().take(self.max_lines).collect();
        let marker = TRUNCATION_MARKER.replace("{n}", &self.max_lines.to_string());
        kept.push(&marker);
        kept.join("\n")
    }
    fn name(&self) -> &'static str {
        "TruncateLinesFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_comments_filter_dispatches_on_style() {
        let c = RemoveCommentsFilter(CommentStyle::CStyle);
        assert_eq!(c.apply("code // comment\nmore code"), "code\nmore code");
        let py = RemoveCommentsFilter(CommentStyle::Hash {
            triple_quotes: true,
        });
        assert_eq!(py.apply("x = 1  # note\ny = 2"), "x = 1\ny = 2");
    }

    #[test]
    fn test_truncate_lines_filter() {
        let filter = TruncateLinesFilter { max_lines: 2 };
        assert_eq!(
            filter.apply("a\nb\nc\nd"),
            "a\nb\n[... truncated after 2 lines ...]"
        );
        assert_eq!(filter.apply("a\nb\n"), "a\nb\n");
    }

    #[test]
    fn test_filter_debug_uses_name() {
        let filter: Box<dyn ContentFilter> = Box::new(JoinParagraphsFilter);
        assert_eq!(format!("{:?}", filter), "ContentFilter(\"JoinParagraphsFilter\")");
    }
}
