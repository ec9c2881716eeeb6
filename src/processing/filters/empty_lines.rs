/// Drops every line that is empty or whitespace-only.
///
/// Lines are rejoined with `\n`; `\r\n` input is normalised by `str::lines`.
///
/// # Examples
/// ```
/// use dirbundle::processing::filters::remove_empty_lines;
///
/// assert_eq!(remove_empty_lines("Line 1\n\n  \t  \r\nLine 4\n"), "Line 1\nLine 4");
/// ```
pub fn remove_empty_lines(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.lines().filter(|line| !line.trim().is_empty()) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::remove_empty_lines;

    #[test]
    fn test_indentation_is_kept() {
        assert_eq!(remove_empty_lines("fn a() {\n\n    b();\n}"), "fn a() {\n    b();\n}");
    }

    #[test]
    fn test_all_blank_gives_empty() {
        assert_eq!(remove_empty_lines("\n \n\t\n"), "");
    }
}
