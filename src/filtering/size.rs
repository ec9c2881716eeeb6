// src/filtering/size.rs

/// Checks if a file size is within an optional limit. The limit is inclusive.
#[inline]
pub fn passes_size_filter(size: u64, limit: Option<u64>) -> bool {
    limit.map_or(true, |max| size <= max)
}

/// Combines the size ceilings that apply to one file.
///
/// `explicit` is a value set on the matched preset itself and wins outright.
/// Otherwise the smaller of the global ceiling and any value `inherited` from
/// the extension defaults applies.
///
/// # Examples
///
/// ```
/// use dirbundle::filtering::effective_size_limit;
///
/// assert_eq!(effective_size_limit(Some(100), Some(500), None), Some(500));
/// assert_eq!(effective_size_limit(Some(100), None, Some(50)), Some(50));
/// assert_eq!(effective_size_limit(None, None, Some(50)), Some(50));
/// assert_eq!(effective_size_limit(None, None, None), None);
/// ```
pub fn effective_size_limit(
    global: Option<u64>,
    explicit: Option<u64>,
    inherited: Option<u64>,
) -> Option<u64> {
    if explicit.is_some() {
        return explicit;
    }
    match (global, inherited) {
        (Some(g), Some(i)) => Some(g.min(i)),
        (g, i) => g.or(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_no_limit() {
        assert!(passes_size_filter(u64::MAX, None));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(passes_size_filter(10, Some(10)));
        assert!(!passes_size_filter(11, Some(10)));
    }

    #[test]
    fn test_size_zero_limit() {
        assert!(passes_size_filter(0, Some(0)));
        assert!(!passes_size_filter(1, Some(0)));
    }

    #[test]
    fn test_explicit_override_can_raise_the_ceiling() {
        assert_eq!(effective_size_limit(Some(10), Some(1_000), Some(5)), Some(1_000));
        assert_eq!(effective_size_limit(Some(10), None, Some(1_000)), Some(10));
    }
}
