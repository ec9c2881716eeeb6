//! Per-file charset detection, decoding with fallbacks, and target conversion.
//!
//! Every read goes through [`read_and_decode`]: detect the charset, decode with
//! a progressive fallback chain (unless strict), then optionally validate the
//! text against a target charset by an encode/decode round trip.

mod charset;
mod detect;

pub use charset::Charset;
pub use detect::{detect_encoding, filename_hint, Detection, DetectionMethod};

use crate::constants::MAX_REPLACEMENT_RATIO;
use crate::core_types::FileContent;
use crate::errors::{io_error_with_path, Error, Result};
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How files are decoded and whether their text is constrained to a target charset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodingOptions {
    /// Charset the content must be representable in, if any.
    pub target: Option<Charset>,
    /// Fail instead of substituting replacement characters.
    pub strict: bool,
}

/// Reads `path` fully and decodes it according to `options`.
///
/// The file handle is closed before decoding starts.
pub fn read_and_decode(path: &Path, options: &EncodingOptions) -> Result<FileContent> {
    let bytes = read_bytes(path)?;
    decode_bytes(&bytes, path, options)
}

/// Reads a file into memory, closing the handle before returning.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| io_error_with_path(e, path))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| io_error_with_path(e, path))?;
    drop(file);
    Ok(bytes)
}

/// Decodes already-read bytes. `path` supplies filename hints and error context.
pub fn decode_bytes(bytes: &[u8], path: &Path, options: &EncodingOptions) -> Result<FileContent> {
    let detection = detect_encoding(bytes, path);
    debug!(
        "Detected {} for '{}' via {:?}",
        detection.charset,
        path.display(),
        detection.method
    );
    let (text, encoding, mut had_errors) =
        decode_with_fallback(bytes, detection.charset, options.strict, path)?;

    let mut content = FileContent {
        text,
        encoding,
        target_encoding: None,
        had_errors: false,
    };
    if let Some(target) = options.target {
        content.target_encoding = Some(target);
        if !target.same_repertoire(&encoding) {
            let (converted, lossy) = convert_to_target(&content.text, target);
            if lossy {
                if options.strict {
                    return Err(Error::Encoding {
                        path: path.display().to_string(),
                        encoding: target.name().to_string(),
                        reason: "content contains characters the target charset cannot represent"
                            .to_string(),
                    });
                }
                warn!(
                    "'{}' has characters not representable in {}; replaced with '?'",
                    path.display(),
                    target
                );
                had_errors = true;
            }
            content.text = converted;
        }
    }
    content.had_errors = had_errors;
    Ok(content)
}

/// Decodes `bytes` as `charset`, falling back progressively when that fails.
///
/// The chain is: strict decode, replacement decode (kept if replacement
/// characters stay under [`MAX_REPLACEMENT_RATIO`]), UTF-8 and Windows-1252,
/// then Latin-1, which accepts every byte. In strict mode the first failure is
/// returned as [`Error::Encoding`]. Returns the text, the charset actually
/// used, and whether anything was substituted or a fallback was needed.
pub fn decode_with_fallback(
    bytes: &[u8],
    charset: Charset,
    strict: bool,
    path: &Path,
) -> Result<(String, Charset, bool)> {
    let (text, had_errors) = charset.decode(bytes);
    if !had_errors {
        return Ok((text, charset, false));
    }
    if strict {
        return Err(Error::Encoding {
            path: path.display().to_string(),
            encoding: charset.name().to_string(),
            reason: "invalid byte sequence".to_string(),
        });
    }

    let ratio = replacement_ratio(&text);
    if ratio <= MAX_REPLACEMENT_RATIO {
        warn!(
            "'{}' is not valid {}; decoded with replacement characters",
            path.display(),
            charset
        );
        return Ok((text, charset, true));
    }

    for fallback in [Charset::Utf8, Charset::Windows1252] {
        if fallback == charset {
            continue;
        }
        if let Some(text) = fallback.decode_strict(bytes) {
            warn!(
                "'{}' could not be decoded as {}; fell back to {}",
                path.display(),
                charset,
                fallback
            );
            return Ok((text, fallback, true));
        }
    }

    warn!(
        "'{}' could not be decoded as {}; fell back to latin-1",
        path.display(),
        charset
    );
    let (text, _) = Charset::Latin1.decode(bytes);
    Ok((text, Charset::Latin1, true))
}

/// Validates `text` against `target` by encoding and decoding it again.
///
/// Characters the target cannot represent come back as `?`; the flag reports
/// whether that happened.
///
/// # Examples
/// ```
/// use dirbundle::encoding::{convert_to_target, Charset};
///
/// assert_eq!(convert_to_target("café", Charset::Latin1), ("café".to_string(), false));
/// assert_eq!(convert_to_target("café", Charset::Ascii), ("caf?".to_string(), true));
/// ```
pub fn convert_to_target(text: &str, target: Charset) -> (String, bool) {
    let (bytes, unmappable) = target.encode(text);
    let (round_tripped, decode_errors) = target.decode(&bytes);
    (round_tripped, unmappable || decode_errors)
}

fn replacement_ratio(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let replaced = text.chars().filter(|&c| c == '\u{FFFD}').count();
    replaced as f32 / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_utf16_le_via_filename_hint() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("notes_utf16le.txt");
        fs::write(&path, Charset::Utf16Le.encode("hello ✓").0)?;

        let content = read_and_decode(&path, &EncodingOptions::default())?;
        assert_eq!(content.text, "hello ✓");
        assert_eq!(content.encoding, Charset::Utf16Le);
        assert!(!content.had_errors);
        Ok(())
    }

    #[test]
    fn test_sparse_invalid_bytes_keep_declared_charset() {
        let mut bytes = b"a".repeat(100);
        bytes.push(0xFF);
        let (text, charset, flagged) =
            decode_with_fallback(&bytes, Charset::Utf8, false, Path::new("x.txt")).unwrap();
        assert_eq!(charset, Charset::Utf8);
        assert!(flagged);
        assert!(text.ends_with('\u{FFFD}'));
    }

    #[test]
    fn test_dense_invalid_bytes_fall_back() {
        let bytes = [0xE9u8, 0xE8, 0xE0, b'a'];
        let (text, charset, flagged) =
            decode_with_fallback(&bytes, Charset::Utf8, false, Path::new("x.txt")).unwrap();
        assert_eq!(charset, Charset::Windows1252);
        assert_eq!(text, "éèàa");
        assert!(flagged);
    }

    #[test]
    fn test_latin1_is_last_resort() {
        let bytes = [0x81u8, 0x8D, 0xFF];
        let (text, charset, _) =
            decode_with_fallback(&bytes, Charset::Utf8, false, Path::new("x.txt")).unwrap();
        assert_eq!(charset, Charset::Latin1);
        assert_eq!(text.chars().count(), 3);
    }

    #[test]
    fn test_strict_mode_propagates() {
        let err = decode_with_fallback(&[0xFF], Charset::Utf8, true, Path::new("bad.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }));
    }

    #[test]
    fn test_target_conversion_flags_loss() {
        let options = EncodingOptions {
            target: Some(Charset::Ascii),
            strict: false,
        };
        let content = decode_bytes("naïve".as_bytes(), Path::new("a.txt"), &options).unwrap();
        assert_eq!(content.text, "na?ve");
        assert_eq!(content.encoding, Charset::Utf8);
        assert_eq!(content.target_encoding, Some(Charset::Ascii));
        assert!(content.had_errors);

        let strict = EncodingOptions {
            strict: true,
            ..options
        };
        assert!(decode_bytes("naïve".as_bytes(), Path::new("a.txt"), &strict).is_err());
    }

    #[test]
    fn test_unicode_target_is_lossless() {
        let options = EncodingOptions {
            target: Some(Charset::Utf16Le),
            strict: true,
        };
        let content = decode_bytes("日本".as_bytes(), Path::new("a.txt"), &options).unwrap();
        assert_eq!(content.text, "日本");
        assert!(!content.had_errors);
    }
}
