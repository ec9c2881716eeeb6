// src/filtering/text_detection.rs

use crate::constants::BINARY_SNIFF_BYTES;
use crate::encoding::{filename_hint, Charset};
use content_inspector::ContentType;
use std::{fs::File, io::Read, path::Path};

/// Checks if a byte buffer is likely text-based.
///
/// Unlike a plain UTF-8 check, this accepts legacy single-byte text (Latin-1,
/// Windows-1252): only content `content_inspector` classifies as binary is
/// rejected. UTF-16 is recognised by its byte-order mark, or by `path` carrying
/// a UTF-16 filename hint, since UTF-16 text is full of NUL bytes.
///
/// # Examples
/// ```
/// use dirbundle::filtering::is_likely_text_from_buffer;
/// use std::path::Path;
///
/// assert!(is_likely_text_from_buffer(b"plain text", Path::new("a.txt")));
/// assert!(is_likely_text_from_buffer(&[b'c', b'a', b'f', 0xE9], Path::new("a.txt")));
/// assert!(!is_likely_text_from_buffer(b"bin\0ary", Path::new("a.bin")));
/// assert!(is_likely_text_from_buffer(&[b'h', 0, b'i', 0], Path::new("notes_utf16le.txt")));
/// ```
pub fn is_likely_text_from_buffer(buffer: &[u8], path: &Path) -> bool {
    match content_inspector::inspect(buffer) {
        ContentType::BINARY => matches!(
            filename_hint(path),
            Some(Charset::Utf16Le | Charset::Utf16Be)
        ),
        _ => true,
    }
}

/// Checks if the file content is likely text-based by reading its head.
///
/// Reads at most [`BINARY_SNIFF_BYTES`] bytes; the handle is closed before returning.
///
/// # Errors
/// Returns an `Err` on I/O error (e.g., file not found, permission denied).
pub fn is_likely_text(path: &Path) -> std::io::Result<bool> {
    let file = File::open(path)?;
    let mut buffer = Vec::with_capacity(BINARY_SNIFF_BYTES);
    file.take(BINARY_SNIFF_BYTES as u64).read_to_end(&mut buffer)?;
    Ok(is_likely_text_from_buffer(&buffer, path))
}
