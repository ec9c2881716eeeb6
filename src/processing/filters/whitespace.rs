/// Collapses runs of spaces and tabs inside each line to a single space and
/// runs of blank lines to a single blank line. Leading indentation is kept,
/// trailing whitespace and blank lines at either end are dropped.
///
/// # Examples
/// ```
/// use dirbundle::processing::filters::compress_whitespace;
///
/// let text = "\n\nfn  main()   {\n\n\n    let  x = 1;  \n}\n\n";
/// assert_eq!(compress_whitespace(text), "fn main() {\n\n    let x = 1;\n}");
/// ```
pub fn compress_whitespace(content: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
            continue;
        }
        let indent = &line[..line.len() - line.trim_start().len()];
        let body = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
        lines.push(format!("{indent}{body}"));
        previous_blank = false;
    }

    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
