use super::charset::Charset;
use crate::constants::{
    DETECTION_SAMPLE_BYTES, DOC_EXTENSIONS, MIN_DETECTION_CONFIDENCE, WINDOWS_1252_CONFIDENCE,
    WINDOWS_1252_DOC_CONFIDENCE,
};
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use log::trace;
use std::path::Path;

/// Which stage of the pipeline produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    ByteOrderMark,
    FilenameHint,
    StrictUtf8,
    Statistical,
    /// The statistical guess was rejected and UTF-8 assumed.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub charset: Charset,
    pub confidence: f32,
    pub method: DetectionMethod,
}

impl Detection {
    fn certain(charset: Charset, method: DetectionMethod) -> Self {
        Self {
            charset,
            confidence: 1.0,
            method,
        }
    }
}

/// Guesses the charset of `bytes`, using `path` only for its file name hints and extension.
///
/// # Examples
/// ```
/// use dirbundle::encoding::{detect_encoding, Charset, DetectionMethod};
/// use std::path::Path;
///
/// let bom = [0xEF, 0xBB, 0xBF, b'h', b'i'];
/// assert_eq!(detect_encoding(&bom, Path::new("a.txt")).charset, Charset::Utf8Sig);
///
/// let plain = detect_encoding("héllo".as_bytes(), Path::new("a.txt"));
/// assert_eq!(plain.charset, Charset::Utf8);
/// assert_eq!(plain.method, DetectionMethod::StrictUtf8);
/// ```
pub fn detect_encoding(bytes: &[u8], path: &Path) -> Detection {
    if let Some(charset) = sniff_bom(bytes) {
        return Detection::certain(charset, DetectionMethod::ByteOrderMark);
    }
    if let Some(charset) = filename_hint(path) {
        return Detection::certain(charset, DetectionMethod::FilenameHint);
    }
    if std::str::from_utf8(bytes).is_ok() {
        return Detection::certain(Charset::Utf8, DetectionMethod::StrictUtf8);
    }

    let sample = &bytes[..bytes.len().min(DETECTION_SAMPLE_BYTES)];
    let mut detector = EncodingDetector::new();
    detector.feed(sample, sample.len() == bytes.len());
    let guess = detector.guess(None, false);
    let confidence = assess_confidence(sample, guess);
    let charset = Charset::from_encoding(guess).normalized();
    trace!(
        "Statistical guess for '{}': {} (confidence {:.2})",
        path.display(),
        charset,
        confidence
    );

    let fallback = Detection {
        charset: Charset::Utf8,
        confidence,
        method: DetectionMethod::Fallback,
    };
    if confidence < MIN_DETECTION_CONFIDENCE {
        return fallback;
    }
    if charset == Charset::Windows1252 {
        let threshold = if is_doc_file(path) {
            WINDOWS_1252_DOC_CONFIDENCE
        } else {
            WINDOWS_1252_CONFIDENCE
        };
        if confidence <= threshold {
            return fallback;
        }
    }
    Detection {
        charset,
        confidence,
        method: DetectionMethod::Statistical,
    }
}

fn sniff_bom(bytes: &[u8]) -> Option<Charset> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some(Charset::Utf8Sig)
    } else if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        Some(Charset::Utf16)
    } else {
        None
    }
}

/// Charset implied by markers in the file name, e.g. `notes_latin1.txt`.
pub fn filename_hint(path: &Path) -> Option<Charset> {
    let name = path.file_name()?.to_string_lossy().to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| name.contains(n));
    if has(&["latin1", "latin-1", "iso-8859-1", "iso8859-1"]) {
        Some(Charset::Latin1)
    } else if has(&["utf16le", "utf-16-le", "utf16-le", "utf-16le"]) {
        Some(Charset::Utf16Le)
    } else if has(&["utf16be", "utf-16-be", "utf16-be", "utf-16be"]) {
        Some(Charset::Utf16Be)
    } else if has(&["cp1252", "windows-1252", "win1252"]) {
        Some(Charset::Windows1252)
    } else {
        None
    }
}

fn is_doc_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DOC_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

const TYPOGRAPHIC: &[char] = &[
    '€', '–', '—', '‘', '’', '‚', '“', '”', '„', '…', '•', '°', '©', '®', '™', '«', '»', '§', '¶',
    '·', '¡', '¿', '£', '¥', '¢', '×', '÷', '±', '\u{00A0}',
];

/// Scores how plausible the decoded sample looks, between 0 and 1.
///
/// Non-ASCII characters that are letters or common typography count in favour;
/// C1 controls, stray control bytes and replacement characters count against.
fn assess_confidence(sample: &[u8], encoding: &'static Encoding) -> f32 {
    let (text, _) = encoding.decode_without_bom_handling(sample);
    let mut non_ascii = 0usize;
    let mut plausible = 0usize;
    let mut suspicious = 0usize;
    for c in text.chars() {
        if c.is_ascii() {
            if c.is_ascii_control() && !matches!(c, '\n' | '\r' | '\t' | '\x0c') {
                suspicious += 1;
            }
            continue;
        }
        non_ascii += 1;
        if c == '\u{FFFD}' || c.is_control() {
            suspicious += 1;
        } else if c.is_alphabetic() || TYPOGRAPHIC.contains(&c) {
            plausible += 1;
        }
    }
    if non_ascii == 0 {
        return if suspicious == 0 { 1.0 } else { 0.5 };
    }
    let suspicious_ratio = (suspicious as f32 / non_ascii as f32).min(1.0);
    let plausible_ratio = plausible as f32 / non_ascii as f32;
    ((1.0 - suspicious_ratio) * (0.5 + 0.5 * plausible_ratio)).clamp(0.0, 1.0)
}
