// Named processors that presets can refer to with `custom_processor`.

use crate::security::redact_secrets;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

const DEFAULT_MAX_CHARS: usize = 4000;

/// A built-in processor selected by name from a preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomProcessor {
    /// `truncate`: keeps the first `max_chars` characters.
    Truncate { max_chars: usize },
    /// `redact_secrets`: masks values matched by the secret patterns.
    RedactSecrets,
    /// `extract_functions`: keeps only function and class definitions.
    ExtractFunctions,
}

impl CustomProcessor {
    /// Looks up a processor by name, reading its arguments from `args`.
    ///
    /// # Examples
    /// ```
    /// use dirbundle::processing::filters::CustomProcessor;
    /// use std::collections::BTreeMap;
    ///
    /// let mut args = BTreeMap::new();
    /// args.insert("max_chars".to_string(), serde_yaml::Value::from(10));
    /// assert_eq!(
    ///     CustomProcessor::from_name("truncate", &args),
    ///     Ok(CustomProcessor::Truncate { max_chars: 10 })
    /// );
    /// assert!(CustomProcessor::from_name("nope", &args).is_err());
    /// ```
    pub fn from_name(
        name: &str,
        args: &BTreeMap<String, serde_yaml::Value>,
    ) -> Result<Self, String> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "truncate" => {
                let max_chars = match args.get("max_chars") {
                    None => DEFAULT_MAX_CHARS,
                    Some(v) => v
                        .as_u64()
                        .map(|n| n as usize)
                        .ok_or_else(|| "processor_args.max_chars must be a positive integer".to_string())?,
                };
                Ok(Self::Truncate { max_chars })
            }
            "redact_secrets" => Ok(Self::RedactSecrets),
            "extract_functions" => Ok(Self::ExtractFunctions),
            other => Err(format!(
                "unknown custom processor '{}' (expected truncate, redact_secrets or extract_functions)",
                other
            )),
        }
    }

    /// Runs the processor. `extension` is the file's lowercase extension.
    pub fn run(&self, content: &str, extension: Option<&str>) -> String {
        match self {
            Self::Truncate { max_chars } => truncate_chars(content, *max_chars),
            Self::RedactSecrets => redact_secrets(content),
            Self::ExtractFunctions => extract_functions(content, extension),
        }
    }
}

/// Keeps at most `max_chars` characters, marking the cut.
///
/// # Examples
/// ```
/// use dirbundle::processing::filters::truncate_chars;
///
/// assert_eq!(truncate_chars("short", 10), "short");
/// assert_eq!(truncate_chars("abcdef", 3), "abc\n[... truncated after 3 characters ...]");
/// ```
pub fn truncate_chars(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        None => content.to_string(),
        Some((cut, _)) => format!(
            "{}\n[... truncated after {} characters ...]",
            &content[..cut],
            max_chars
        ),
    }
}

static PY_DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)(async\s+def|def|class)\s+\w+").unwrap());
static PY_DECORATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*@\w").unwrap());
static BRACE_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(export\s+)?(default\s+)?(pub(\([\w:]+\))?\s+)?((async|unsafe|const|static|extern|public|private|protected|internal|override|virtual|final|abstract)\s+)*(fn|function\*?|func|class|struct|enum|trait|impl|interface)\b",
    )
    .unwrap()
});
static ARROW_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(export\s+)?(const|let|var)\s+\w+\s*=\s*(async\s+)?(\([^)]*\)|\w+)\s*=>").unwrap()
});

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn extract_python(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let start = i;
        while i < lines.len() && PY_DECORATOR_RE.is_match(lines[i]) {
            i += 1;
        }
        let Some(caps) = lines.get(i).and_then(|l| PY_DEF_RE.captures(l)) else {
            i = start + 1;
            continue;
        };
        let base = caps[1].len();
        let mut end = i + 1;
        while end < lines.len()
            && (lines[end].trim().is_empty() || indent_of(lines[end]) > base)
        {
            end += 1;
        }
        while end > i + 1 && lines[end - 1].trim().is_empty() {
            end -= 1;
        }
        blocks.push(lines[start..end].join("\n"));
        i = end;
    }
    blocks
}

fn extract_braced(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if !(BRACE_DEF_RE.is_match(lines[i]) || ARROW_DEF_RE.is_match(lines[i])) {
            i += 1;
            continue;
        }
        let mut depth: i64 = 0;
        let mut opened = false;
        let mut end = i;
        while end < lines.len() {
            for c in lines[end].chars() {
                match c {
                    '{' => {
                        depth += 1;
                        opened = true;
                    }
                    '}' => depth -= 1,
                    _ => {}
                }
            }
            end += 1;
            if (opened && depth <= 0) || (!opened && lines[end - 1].trim_end().ends_with(';')) {
                break;
            }
        }
        blocks.push(lines[i..end].join("\n"));
        i = end;
    }
    blocks
}

/// Keeps only function and type definitions, separated by blank lines.
///
/// Python-like files are split by indentation, everything else by brace
/// depth. Content with no recognisable definition is returned unchanged.
pub fn extract_functions(content: &str, extension: Option<&str>) -> String {
    let blocks = match extension {
        Some("py" | "pyw" | "pyi") => extract_python(content),
        _ => extract_braced(content),
    };
    if blocks.is_empty() {
        debug!("extract_functions found no definitions; keeping content");
        return content.to_string();
    }
    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_python_with_decorator() {
        let py = "import os\n\n@cache\ndef f(x):\n    return x\n\nVALUE = 1\n\nclass A:\n    def m(self):\n        pass\n";
        assert_eq!(
            extract_functions(py, Some("py")),
            "@cache\ndef f(x):\n    return x\n\nclass A:\n    def m(self):\n        pass"
        );
    }

    #[test]
    fn test_extract_rust_functions() {
        let rs = "use std::fmt;\n\npub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n\nconst X: i32 = 1;\n\nfn noop() {}\n";
        assert_eq!(
            extract_functions(rs, Some("rs")),
            "pub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n\nfn noop() {}"
        );
    }

    #[test]
    fn test_extract_js_arrow() {
        let js = "const a = 1;\nconst f = (x) => {\n  return x;\n};\n";
        assert_eq!(
            extract_functions(js, Some("js")),
            "const f = (x) => {\n  return x;\n};"
        );
    }

    #[test]
    fn test_extract_nothing_keeps_content() {
        assert_eq!(extract_functions("just text", Some("txt")), "just text");
    }

    #[test]
    fn test_redact_processor() {
        let p = CustomProcessor::from_name("redact-secrets", &BTreeMap::new());
        assert_eq!(p, Ok(CustomProcessor::RedactSecrets));
        let out = CustomProcessor::RedactSecrets.run("api_key = \"abcd1234efgh5678\"", None);
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("abcd1234efgh5678"));
    }

    #[test]
    fn test_truncate_rejects_bad_arg() {
        let mut args = BTreeMap::new();
        args.insert("max_chars".to_string(), serde_yaml::Value::from("lots"));
        assert!(CustomProcessor::from_name("truncate", &args).is_err());
    }
}
