use byte_unit::Byte;
use std::str::FromStr;

/// Parses a human-readable size such as `"50KB"`, `"2MiB"` or `"1024"` into bytes.
///
/// Decimal suffixes use powers of 1000, binary suffixes (`KiB`, `MiB`) powers of 1024.
///
/// # Examples
/// ```
/// use dirbundle::utils::parse_size;
///
/// assert_eq!(parse_size("10k").unwrap(), 10_000);
/// assert_eq!(parse_size("2MiB").unwrap(), 2 * 1024 * 1024);
/// assert!(parse_size("lots").is_err());
/// ```
pub fn parse_size(input: &str) -> Result<u64, String> {
    let trimmed = input.trim();
    let bytes = Byte::from_str(trimmed)
        .map_err(|e| format!("Invalid size format '{}': {}", trimmed, e))?;
    u64::try_from(bytes.as_u128()).map_err(|_| format!("Size '{}' is too large", trimmed))
}

/// Formats a byte count for headers, e.g. `"512 B"`, `"1.50 KB"`, `"3.20 MB"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for candidate in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = candidate;
    }
    format!("{:.2} {}", value, unit)
}
