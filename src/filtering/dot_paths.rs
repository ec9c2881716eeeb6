// src/filtering/dot_paths.rs

/// Returns `true` for names starting with `.`, excluding `.` and `..` themselves.
#[inline]
pub fn is_dot_name(name: &str) -> bool {
    name.starts_with('.') && name != "." && name != ".."
}

/// Returns `true` if any component of a POSIX relative path is a dot name.
///
/// # Examples
///
/// ```
/// use dirbundle::filtering::has_dot_component;
///
/// assert!(has_dot_component(".github/workflows/ci.yml"));
/// assert!(has_dot_component("src/.env"));
/// assert!(!has_dot_component("src/main.rs"));
/// ```
pub fn has_dot_component(relative_path: &str) -> bool {
    relative_path.split('/').any(is_dot_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_name() {
        assert!(is_dot_name(".gitignore"));
        assert!(!is_dot_name("."));
        assert!(!is_dot_name(".."));
        assert!(!is_dot_name("file.txt"));
    }

    #[test]
    fn test_dot_component_anywhere() {
        assert!(has_dot_component("a/.hidden/b.txt"));
        assert!(!has_dot_component("a/b.c/d.txt"));
    }
}
