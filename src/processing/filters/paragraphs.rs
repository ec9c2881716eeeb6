use once_cell::sync::Lazy;
use regex::Regex;

static LIST_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s{0,3}([-*+]|\d{1,9}[.)])\s+").unwrap());
static RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s{0,3}[-*_](\s*[-*_]){2,}\s*$").unwrap());

fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    line.len() - t.len() <= 3 && (t.starts_with("```") || t.starts_with("~~~"))
}

/// Lines that always stand on their own.
fn is_block_line(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with('#')
        || t.starts_with('>')
        || t.starts_with('|')
        || t.starts_with('<')
        || RULE_RE.is_match(line)
}

fn has_hard_break(line: &str) -> bool {
    line.ends_with("  ") || line.ends_with('\\')
}

/// Joins the wrapped lines of each Markdown paragraph into one line.
///
/// Fenced code, headings, block quotes, tables, HTML blocks and rules are left
/// alone. A list item absorbs its continuation lines. Hard breaks (two
/// trailing spaces or a backslash) end the joined line. Indented code outside
/// a paragraph is copied verbatim.
///
/// # Examples
/// ```
/// use dirbundle::processing::filters::join_paragraphs;
///
/// let md = "# Title\nfirst line\nsecond line\n\n- item\n  wraps here\n";
/// assert_eq!(
///     join_paragraphs(md),
///     "# Title\nfirst line second line\n\n- item wraps here"
/// );
/// ```
pub fn join_paragraphs(content: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let mut in_fence = false;

    fn flush(out: &mut Vec<String>, current: &mut Option<String>) {
        if let Some(paragraph) = current.take() {
            out.push(paragraph);
        }
    }

    for line in content.lines() {
        if in_fence {
            out.push(line.to_string());
            in_fence = !is_fence(line);
            continue;
        }
        if is_fence(line) {
            flush(&mut out, &mut current);
            out.push(line.to_string());
            in_fence = true;
            continue;
        }
        if line.trim().is_empty() {
            flush(&mut out, &mut current);
            out.push(String::new());
            continue;
        }
        if is_block_line(line) {
            flush(&mut out, &mut current);
            out.push(line.to_string());
            continue;
        }
        if LIST_ITEM_RE.is_match(line) {
            flush(&mut out, &mut current);
            current = Some(line.trim_end().to_string());
        } else if let Some(paragraph) = current.as_mut() {
            paragraph.push(' ');
            paragraph.push_str(line.trim());
        } else if line.starts_with("    ") || line.starts_with('\t') {
            out.push(line.to_string());
            continue;
        } else {
            current = Some(line.trim_end().to_string());
        }
        if has_hard_break(line) {
            flush(&mut out, &mut current);
        }
    }
    flush(&mut out, &mut current);

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::join_paragraphs;

    #[test]
    fn test_fenced_code_untouched() {
        let md = "Intro\ntext\n```rust\nlet a = 1;\nlet b = 2;\n```\nafter\nwards";
        assert_eq!(
            join_paragraphs(md),
            "Intro text\n```rust\nlet a = 1;\nlet b = 2;\n```\nafter wards"
        );
    }

    #[test]
    fn test_tables_and_quotes_untouched() {
        let md = "| a | b |\n|---|---|\n| 1 | 2 |\n> quoted\n> more";
        assert_eq!(join_paragraphs(md), md);
    }

    #[test]
    fn test_hard_break_ends_line() {
        let md = "line one\\\nline two\nline three";
        assert_eq!(join_paragraphs(md), "line one\\\nline two line three");
    }

    #[test]
    fn test_numbered_items_stay_separate() {
        let md = "1. first\n2. second\n   continued";
        assert_eq!(join_paragraphs(md), "1. first\n2. second continued");
    }

    #[test]
    fn test_indented_code_block() {
        let md = "Para\n\n    code line\n    more code";
        assert_eq!(join_paragraphs(md), "Para\n\n    code line\n    more code");
    }
}
