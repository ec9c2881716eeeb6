use once_cell::sync::Lazy;
use regex::Regex;

static FOOTER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*[*_]*(source url|original url|scraped at|scraped on|retrieved|retrieved at|fetched at|downloaded from|crawled at)[*_]*\s*:",
    )
    .unwrap()
});
static RULE_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(-{3,}|\*{3,}|_{3,})\s*$").unwrap());

/// Byte offset just past the YAML front matter, if `content` starts with one.
fn front_matter_end(content: &str) -> Option<usize> {
    let first_len = content.find('\n')? + 1;
    if content[..first_len].trim_end() != "---" {
        return None;
    }
    let mut offset = first_len;
    for line in content[first_len..].split_inclusive('\n') {
        offset += line.len();
        let t = line.trim_end();
        if t == "---" || t == "..." {
            return Some(offset);
        }
    }
    None
}

/// Removes a leading YAML front matter block and trailing scraper footer
/// lines such as `Source URL: ...` or `Scraped at: ...`, together with a rule
/// line directly above them.
///
/// # Examples
/// ```
/// use dirbundle::processing::filters::strip_metadata;
///
/// let page = "---\ntitle: Docs\n---\n\n# Docs\nBody\n\n---\nSource URL: https://x\nScraped at: 2024-01-01\n";
/// assert_eq!(strip_metadata(page), "# Docs\nBody");
/// ```
pub fn strip_metadata(content: &str) -> String {
    let body = match front_matter_end(content) {
        Some(end) => &content[end..],
        None => content,
    };

    let mut lines: Vec<&str> = body.lines().collect();
    let trim_blank = |lines: &mut Vec<&str>| {
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
    };

    trim_blank(&mut lines);
    let mut removed_footer = false;
    while lines.last().is_some_and(|l| FOOTER_LINE_RE.is_match(l)) {
        lines.pop();
        removed_footer = true;
        trim_blank(&mut lines);
    }
    if removed_footer && lines.last().is_some_and(|l| RULE_LINE_RE.is_match(l)) {
        lines.pop();
        trim_blank(&mut lines);
    }

    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::strip_metadata;

    #[test]
    fn test_unclosed_front_matter_is_kept() {
        let text = "---\ntitle: x\nbody";
        assert_eq!(strip_metadata(text), text);
    }

    #[test]
    fn test_rule_without_footer_is_kept() {
        let text = "Intro\n\n---\n\nMore";
        assert_eq!(strip_metadata(text), text);
    }

    #[test]
    fn test_bold_footer_labels() {
        let text = "Body\n**Source URL:** https://example.com";
        assert_eq!(strip_metadata(text), "Body");
    }
}
