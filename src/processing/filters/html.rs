use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

/// Elements removed with their content when a preset names none.
const DEFAULT_STRIP_TAGS: &[&str] = &["script", "style"];

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)</?([A-Za-z][A-Za-z0-9:-]*)\b[^>]*>").unwrap());
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*(\n[ \t]*){2,}").unwrap());

fn element_regex(tag: &str) -> Option<Regex> {
    let tag = regex::escape(tag);
    let pattern = format!(r"(?is)<{tag}\b[^>]*/>|<{tag}\b[^>]*>.*?</{tag}\s*>");
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Skipping strip tag '{}': {}", tag, e);
            None
        }
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Reduces HTML to its text.
///
/// Elements named in `strip` (or `script` and `style` when empty) are removed
/// together with their content. Every other tag is removed but its content
/// kept, unless the tag is listed in `preserve`. Comments are dropped, common
/// entities decoded, and runs of blank lines collapsed to one.
///
/// # Examples
/// ```
/// use dirbundle::processing::filters::strip_tags;
///
/// let html = "<div><script>x()</script><p>Hi <b>there</b></p></div>";
/// assert_eq!(strip_tags(html, &[], &[]), "Hi there");
/// assert_eq!(strip_tags(html, &[], &["b".to_string()]), "Hi <b>there</b>");
/// ```
pub fn strip_tags(content: &str, strip: &[String], preserve: &[String]) -> String {
    let mut text = COMMENT_RE.replace_all(content, "").into_owned();

    let strip: Vec<&str> = if strip.is_empty() {
        DEFAULT_STRIP_TAGS.to_vec()
    } else {
        strip.iter().map(String::as_str).collect()
    };
    for re in strip.iter().filter_map(|tag| element_regex(tag)) {
        text = re.replace_all(&text, "").into_owned();
    }

    let text = TAG_RE.replace_all(&text, |caps: &regex::Captures| {
        let name = caps[1].to_lowercase();
        if preserve.iter().any(|p| p.eq_ignore_ascii_case(&name)) {
            caps[0].to_string()
        } else {
            String::new()
        }
    });

    let text = decode_entities(&text);
    BLANK_RUN_RE
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}
