// Fenced-code-block helpers for the Markdown style.

/// Maps a lowercase extension to a fenced-code-block language tag.
///
/// Unknown extensions are used as the tag verbatim; no extension gives `""`.
///
/// # Examples
/// ```
/// use dirbundle::separator::language_for_extension;
///
/// assert_eq!(language_for_extension(Some("py")), "python");
/// assert_eq!(language_for_extension(Some("zig")), "zig");
/// assert_eq!(language_for_extension(None), "");
/// ```
pub fn language_for_extension(extension: Option<&str>) -> String {
    let Some(ext) = extension else {
        return String::new();
    };
    let tag = match ext {
        "rs" => "rust",
        "py" | "pyw" | "pyi" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" | "mts" | "cts" => "typescript",
        "jsx" => "jsx",
        "tsx" => "tsx",
        "md" | "markdown" | "mdx" => "markdown",
        "yml" | "yaml" => "yaml",
        "sh" | "bash" | "zsh" => "bash",
        "ps1" => "powershell",
        "h" | "c" => "c",
        "hpp" | "hh" | "cc" | "cpp" | "cxx" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "kt" | "kts" => "kotlin",
        "htm" | "html" => "html",
        "txt" | "text" => "text",
        "dockerfile" => "dockerfile",
        other => other,
    };
    tag.to_string()
}

/// Chooses a backtick fence that cannot be closed by anything inside `body`:
/// at least three backticks, and one more than the longest run in the body.
///
/// # Examples
/// ```
/// use dirbundle::separator::fence_for;
///
/// assert_eq!(fence_for("plain"), "```");
/// assert_eq!(fence_for("has ```` four"), "`````");
/// ```
pub fn fence_for(body: &str) -> String {
    let mut longest = 0usize;
    let mut current = 0usize;
    for c in body.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}
