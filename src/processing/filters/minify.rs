use super::comments::remove_c_style_comments;
use once_cell::sync::Lazy;
use regex::Regex;

/// Which minifier to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinifyKind {
    Html,
    Css,
    Js,
}

impl MinifyKind {
    /// Chooses a minifier from a lowercase extension.
    pub fn for_extension(extension: Option<&str>) -> Option<Self> {
        match extension? {
            "html" | "htm" | "xhtml" => Some(Self::Html),
            "css" => Some(Self::Css),
            "js" | "mjs" | "cjs" => Some(Self::Js),
            _ => None,
        }
    }
}

static CSS_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static CSS_PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*([{}:;,>])\s*").unwrap());
static HTML_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static HTML_RAW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(pre|textarea|script)\b[^>]*>.*?</(pre|textarea|script)\s*>").unwrap()
});
static BETWEEN_TAGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").unwrap());

/// Minifies `content` as HTML, CSS or JavaScript.
pub fn minify(content: &str, kind: MinifyKind) -> String {
    match kind {
        MinifyKind::Css => minify_css(content),
        MinifyKind::Html => minify_html(content),
        MinifyKind::Js => minify_js(content),
    }
}

fn minify_css(content: &str) -> String {
    let text = CSS_COMMENT_RE.replace_all(content, "");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    let text = CSS_PUNCT_RE.replace_all(&text, "$1");
    text.replace(";}", "}").trim().to_string()
}

fn collapse_html(fragment: &str) -> String {
    let text = WHITESPACE_RE.replace_all(fragment, " ");
    BETWEEN_TAGS_RE.replace_all(&text, "><").into_owned()
}

// Whitespace inside <pre>, <textarea> and <script> is significant and copied as-is.
fn minify_html(content: &str) -> String {
    let content = HTML_COMMENT_RE.replace_all(content, "");
    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for raw in HTML_RAW_RE.find_iter(&content) {
        out.push_str(&collapse_html(&content[last..raw.start()]));
        out.push_str(raw.as_str());
        last = raw.end();
    }
    out.push_str(&collapse_html(&content[last..]));
    out.trim().to_string()
}

// Line structure is kept so automatic semicolon insertion still holds.
fn minify_js(content: &str) -> String {
    remove_c_style_comments(content)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
