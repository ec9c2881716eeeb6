use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Comment syntax of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `//` line comments and `/* ... */` block comments.
    CStyle,
    /// `#` line comments. With `triple_quotes`, `"""`/`'''` strings are left intact.
    Hash { triple_quotes: bool },
    /// `<!-- ... -->` comments.
    Markup,
}

/// Picks the comment syntax for a lowercase extension, if known.
pub fn comment_style_for_extension(extension: Option<&str>) -> Option<CommentStyle> {
    let style = match extension? {
        "py" | "pyw" | "pyi" => CommentStyle::Hash {
            triple_quotes: true,
        },
        "sh" | "bash" | "zsh" | "rb" | "pl" | "r" | "yaml" | "yml" | "toml" | "ini" | "cfg"
        | "conf" | "mk" | "cmake" | "ps1" | "dockerfile" => CommentStyle::Hash {
            triple_quotes: false,
        },
        "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" | "rs" | "js" | "mjs" | "cjs" | "ts"
        | "tsx" | "jsx" | "java" | "go" | "cs" | "swift" | "kt" | "kts" | "scala" | "dart"
        | "php" | "css" | "scss" | "less" | "proto" | "groovy" | "zig" => CommentStyle::CStyle,
        "html" | "htm" | "xml" | "xhtml" | "svg" | "vue" | "md" | "markdown" => {
            CommentStyle::Markup
        }
        _ => return None,
    };
    Some(style)
}

/// Trims trailing whitespace per line and leading/trailing newlines overall,
/// preserving the indentation of the first line.
fn tidy(result: &str) -> String {
    result
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<&str>>()
        .join("\n")
        .trim_matches(|c: char| c == '\r' || c == '\n')
        .to_string()
}

/// Removes C/C++ style comments (// and /* ... */) using a state machine.
///
/// Comment markers inside string and character literals are left alone, and
/// escapes are honoured. A character literal never spans a line break, so Rust
/// lifetimes cannot swallow the rest of the file. Lines are right-trimmed and
/// surrounding newlines removed afterwards.
///
/// # Examples
/// ```
/// use dirbundle::processing::filters::remove_c_style_comments;
/// let code = r#"
///     let x = 1; // A comment
///     /* Another comment */
///     let y = "// kept";
/// "#;
///
/// let expected = "    let x = 1;\n\n    let y = \"// kept\";";
/// assert_eq!(remove_c_style_comments(code), expected);
/// ```
pub fn remove_c_style_comments(content: &str) -> String {
    enum State {
        Normal,
        MaybeSlash,
        LineComment,
        BlockComment,
        MaybeEndBlockComment,
        StringLiteral,
        StringEscape,
        CharLiteral,
        CharEscape,
    }

    let mut result = String::with_capacity(content.len());
    let mut state = State::Normal;

    for c in content.chars() {
        state = match state {
            State::Normal | State::MaybeSlash => {
                let after_slash = matches!(state, State::MaybeSlash);
                match (after_slash, c) {
                    (true, '/') => State::LineComment,
                    (true, '*') => State::BlockComment,
                    (false, '/') => State::MaybeSlash,
                    (held, _) => {
                        if held {
                            result.push('/');
                        }
                        result.push(c);
                        match c {
                            '"' => State::StringLiteral,
                            '\'' => State::CharLiteral,
                            _ => State::Normal,
                        }
                    }
                }
            }
            State::LineComment => {
                if c == '\n' {
                    result.push(c);
                    State::Normal
                } else {
                    State::LineComment
                }
            }
            State::BlockComment => {
                if c == '*' {
                    State::MaybeEndBlockComment
                } else {
                    State::BlockComment
                }
            }
            State::MaybeEndBlockComment => match c {
                '/' => State::Normal,
                '*' => State::MaybeEndBlockComment,
                _ => State::BlockComment,
            },
            State::StringLiteral => {
                result.push(c);
                match c {
                    '"' => State::Normal,
                    '\\' => State::StringEscape,
                    _ => State::StringLiteral,
                }
            }
            State::StringEscape => {
                result.push(c);
                State::StringLiteral
            }
            State::CharLiteral => {
                result.push(c);
                match c {
                    '\'' | '\n' => State::Normal,
                    '\\' => State::CharEscape,
                    _ => State::CharLiteral,
                }
            }
            State::CharEscape => {
                result.push(c);
                State::CharLiteral
            }
        };
    }

    if matches!(state, State::MaybeSlash) {
        result.push('/');
    }

    let processed = tidy(&result);
    debug!(
        "C-style comment removal applied. Original len: {}, New len: {}",
        content.len(),
        processed.len()
    );
    processed
}

/// Removes `#` comments, leaving string literals intact.
///
/// With `triple_quotes` (Python), `"""` and `'''` strings, docstrings included,
/// are copied verbatim and `#` starts a comment anywhere outside a string.
/// Without it (shell, YAML, TOML, ...), `#` only starts a comment at the start
/// of a line or after whitespace, so `$#` and URL fragments survive. A shebang
/// on the first line is kept.
///
/// # Examples
/// ```
/// use dirbundle::processing::filters::remove_hash_comments;
///
/// let py = "def f():\n    \"\"\"Doc # not a comment.\"\"\"\n    return 1  # one\n";
/// assert_eq!(
///     remove_hash_comments(py, true),
///     "def f():\n    \"\"\"Doc # not a comment.\"\"\"\n    return 1"
/// );
/// assert_eq!(remove_hash_comments("echo $# # count", false), "echo $#");
/// ```
pub fn remove_hash_comments(content: &str, triple_quotes: bool) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut result = String::with_capacity(content.len());
    let mut i = 0;
    let mut quote: Option<(char, bool)> = None; // (quote char, is triple)

    if content.starts_with("#!") {
        let end = chars.iter().position(|&c| c == '\n').unwrap_or(chars.len());
        result.extend(&chars[..end]);
        i = end;
    }

    while i < chars.len() {
        let c = chars[i];
        let is_triple = |at: usize, q: char| triple_quotes && chars[at..].starts_with(&[q, q, q]);
        match quote {
            Some((q, triple)) => {
                if c == '\\' && i + 1 < chars.len() {
                    result.push(c);
                    result.push(chars[i + 1]);
                    i += 2;
                    continue;
                }
                if triple && is_triple(i, q) {
                    result.extend([q, q, q]);
                    quote = None;
                    i += 3;
                    continue;
                }
                if !triple && (c == q || c == '\n') {
                    quote = None;
                }
                result.push(c);
                i += 1;
            }
            None => match c {
                '"' | '\'' => {
                    if is_triple(i, c) {
                        result.extend([c, c, c]);
                        quote = Some((c, true));
                        i += 3;
                    } else {
                        result.push(c);
                        quote = Some((c, false));
                        i += 1;
                    }
                }
                '#' if triple_quotes || i == 0 || chars[i - 1].is_whitespace() => {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                }
                _ => {
                    result.push(c);
                    i += 1;
                }
            },
        }
    }

    tidy(&result)
}

static MARKUP_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Removes `<!-- ... -->` comments.
pub fn remove_markup_comments(content: &str) -> String {
    tidy(&MARKUP_COMMENT_RE.replace_all(content, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_line_comment_simple() {
        assert_eq!(remove_c_style_comments("code // comment\nmore code"), "code\nmore code");
    }

    #[test]
    fn test_remove_block_comment_multiline() {
        let input = "code /* comment\n more comment */ more code";
        assert_eq!(remove_c_style_comments(input), "code  more code");
    }

    #[test]
    fn test_comment_markers_in_strings() {
        let input = r#"let s = "// not a comment"; /* also " not start */"#;
        assert_eq!(remove_c_style_comments(input), r#"let s = "// not a comment";"#);
    }

    #[test]
    fn test_escaped_quotes_in_strings() {
        let input = r#"let s = "string with \" quote"; // comment"#;
        assert_eq!(remove_c_style_comments(input), r#"let s = "string with \" quote";"#);
    }

    #[test]
    fn test_division_operator() {
        let input = "a = b / c; // divide\nx = y / *p; /* ptr divide */";
        assert_eq!(remove_c_style_comments(input), "a = b / c;\nx = y / *p;");
    }

    #[test]
    fn test_lifetime_does_not_hide_next_line_comment() {
        let input = "fn f<'a>(x: &'a str) {}\nfn g(y: &'b u8) {}\n// gone\nlet z = 1;";
        assert_eq!(
            remove_c_style_comments(input),
            "fn f<'a>(x: &'a str) {}\nfn g(y: &'b u8) {}\n\nlet z = 1;"
        );
    }

    #[test]
    fn test_unterminated_block_and_trailing_slash() {
        assert_eq!(remove_c_style_comments("code /* comment"), "code");
        assert_eq!(remove_c_style_comments("code /"), "code /");
    }

    #[test]
    fn test_hash_comments_respect_strings() {
        let input = "url = \"http://x/#frag\"  # trailing\n# full line\nvalue = 'a#b'";
        assert_eq!(
            remove_hash_comments(input, true),
            "url = \"http://x/#frag\"\n\nvalue = 'a#b'"
        );
    }

    #[test]
    fn test_hash_comments_keep_shebang() {
        let input = "#!/usr/bin/env bash\n# setup\necho hi # greet";
        assert_eq!(remove_hash_comments(input, false), "#!/usr/bin/env bash\n\necho hi");
    }

    #[test]
    fn test_multiline_docstring_kept() {
        let input = "'''\nModule # doc\n'''\nimport os  # os";
        assert_eq!(remove_hash_comments(input, true), "'''\nModule # doc\n'''\nimport os");
    }

    #[test]
    fn test_markup_comments() {
        assert_eq!(
            remove_markup_comments("<p>a</p><!-- hidden\nnote -->\n<p>b</p>"),
            "<p>a</p>\n<p>b</p>"
        );
    }

    #[test]
    fn test_style_lookup() {
        assert_eq!(comment_style_for_extension(Some("rs")), Some(CommentStyle::CStyle));
        assert_eq!(
            comment_style_for_extension(Some("py")),
            Some(CommentStyle::Hash {
                triple_quotes: true
            })
        );
        assert_eq!(comment_style_for_extension(Some("bin")), None);
        assert_eq!(comment_style_for_extension(None), None);
    }
}
