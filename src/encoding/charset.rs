use encoding_rs::{
    EncoderResult, Encoding, ISO_8859_8, ISO_8859_8_I, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252,
    WINDOWS_1255,
};
use std::fmt;
use std::str::FromStr;

/// A character encoding a file can be read from or converted to.
///
/// `Utf8Sig` and `Utf16` carry a byte-order mark on disk; `Utf16Le` and
/// `Utf16Be` do not. `Latin1` is true ISO-8859-1 (every byte maps to the code
/// point of the same value), unlike the WHATWG label which aliases Windows-1252.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Utf8Sig,
    Utf16,
    Utf16Le,
    Utf16Be,
    Ascii,
    Latin1,
    Windows1252,
    /// Any other charset known to `encoding_rs`.
    Legacy(&'static Encoding),
}

impl Charset {
    /// Canonical lowercase name, as recorded in container metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Utf8Sig => "utf-8-sig",
            Charset::Utf16 => "utf-16",
            Charset::Utf16Le => "utf-16-le",
            Charset::Utf16Be => "utf-16-be",
            Charset::Ascii => "ascii",
            Charset::Latin1 => "latin-1",
            Charset::Windows1252 => "windows-1252",
            Charset::Legacy(encoding) => encoding.name(),
        }
    }

    /// Parses a user-supplied or recorded charset label.
    ///
    /// # Examples
    /// ```
    /// use dirbundle::encoding::Charset;
    ///
    /// assert_eq!(Charset::from_label("UTF_16_LE"), Some(Charset::Utf16Le));
    /// assert_eq!(Charset::from_label("iso-8859-1"), Some(Charset::Latin1));
    /// assert_eq!(Charset::from_label("cp1252"), Some(Charset::Windows1252));
    /// assert_eq!(Charset::from_label("no-such-charset"), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Charset> {
        let normalized = label.trim().to_lowercase().replace('_', "-");
        let charset = match normalized.as_str() {
            "utf-8" | "utf8" => Charset::Utf8,
            "utf-8-sig" | "utf8-sig" | "utf-8-bom" => Charset::Utf8Sig,
            "utf-16" | "utf16" => Charset::Utf16,
            "utf-16-le" | "utf-16le" | "utf16le" | "utf16-le" => Charset::Utf16Le,
            "utf-16-be" | "utf-16be" | "utf16be" | "utf16-be" => Charset::Utf16Be,
            "ascii" | "us-ascii" => Charset::Ascii,
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => Charset::Latin1,
            "windows-1252" | "cp1252" | "win1252" => Charset::Windows1252,
            other => Charset::from_encoding(Encoding::for_label(other.as_bytes())?),
        };
        Some(charset)
    }

    /// Maps an `encoding_rs` encoding onto the matching variant.
    pub fn from_encoding(encoding: &'static Encoding) -> Charset {
        if encoding == UTF_8 {
            Charset::Utf8
        } else if encoding == UTF_16LE {
            Charset::Utf16Le
        } else if encoding == UTF_16BE {
            Charset::Utf16Be
        } else if encoding == WINDOWS_1252 {
            Charset::Windows1252
        } else {
            Charset::Legacy(encoding)
        }
    }

    /// Collapses near-synonymous detector results onto the charset we record.
    pub fn normalized(self) -> Charset {
        match self {
            Charset::Ascii => Charset::Utf8,
            Charset::Legacy(e) if e == ISO_8859_8 || e == ISO_8859_8_I => {
                Charset::Legacy(WINDOWS_1255)
            }
            other => other,
        }
    }

    /// `true` for charsets accepted as conversion targets.
    pub fn is_conversion_target(&self) -> bool {
        !matches!(self, Charset::Utf8Sig | Charset::Legacy(_))
    }

    /// `true` if text in `self` and `other` is interchangeable without conversion.
    pub fn same_repertoire(&self, other: &Charset) -> bool {
        self == other || (self.is_unicode() && other.is_unicode())
    }

    fn is_unicode(&self) -> bool {
        matches!(
            self,
            Charset::Utf8 | Charset::Utf8Sig | Charset::Utf16 | Charset::Utf16Le | Charset::Utf16Be
        )
    }

    /// Decodes `bytes`, substituting U+FFFD for invalid sequences.
    ///
    /// Returns the text and whether any substitution happened.
    pub fn decode(&self, bytes: &[u8]) -> (String, bool) {
        match self {
            Charset::Utf8 => decode_with(UTF_8, bytes),
            Charset::Utf8Sig => decode_with(UTF_8, bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)),
            Charset::Utf16 => {
                if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
                    decode_with(UTF_16BE, rest)
                } else {
                    decode_with(UTF_16LE, bytes.strip_prefix(UTF16_LE_BOM).unwrap_or(bytes))
                }
            }
            Charset::Utf16Le => decode_with(UTF_16LE, bytes),
            Charset::Utf16Be => decode_with(UTF_16BE, bytes),
            Charset::Ascii => {
                let had_errors = !bytes.is_ascii();
                let text = bytes
                    .iter()
                    .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
                    .collect();
                (text, had_errors)
            }
            Charset::Latin1 => (bytes.iter().map(|&b| b as char).collect(), false),
            Charset::Windows1252 => decode_with(WINDOWS_1252, bytes),
            Charset::Legacy(encoding) => decode_with(encoding, bytes),
        }
    }

    /// Decodes `bytes`, returning `None` if anything would have to be substituted.
    ///
    /// Windows-1252 rejects the five byte values the code page leaves undefined.
    pub fn decode_strict(&self, bytes: &[u8]) -> Option<String> {
        if *self == Charset::Windows1252
            && bytes
                .iter()
                .any(|b| matches!(b, 0x81 | 0x8D | 0x8F | 0x90 | 0x9D))
        {
            return None;
        }
        let (text, had_errors) = self.decode(bytes);
        (!had_errors).then_some(text)
    }

    /// Encodes `text`, replacing unrepresentable characters with `?`.
    ///
    /// Returns the bytes and whether any replacement happened. BOM-carrying
    /// charsets emit their byte-order mark.
    pub fn encode(&self, text: &str) -> (Vec<u8>, bool) {
        match self {
            Charset::Utf8 => (text.as_bytes().to_vec(), false),
            Charset::Utf8Sig => {
                let mut out = UTF8_BOM.to_vec();
                out.extend_from_slice(text.as_bytes());
                (out, false)
            }
            Charset::Utf16 => {
                let mut out = UTF16_LE_BOM.to_vec();
                out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
                (out, false)
            }
            Charset::Utf16Le => (text.encode_utf16().flat_map(u16::to_le_bytes).collect(), false),
            Charset::Utf16Be => (text.encode_utf16().flat_map(u16::to_be_bytes).collect(), false),
            Charset::Ascii => encode_by_limit(text, 0x7F),
            Charset::Latin1 => encode_by_limit(text, 0xFF),
            Charset::Windows1252 => encode_legacy(text, WINDOWS_1252),
            Charset::Legacy(encoding) => encode_legacy(text, encoding),
        }
    }
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> (String, bool) {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    (text.into_owned(), had_errors)
}

fn encode_by_limit(text: &str, max: u32) -> (Vec<u8>, bool) {
    let mut had_errors = false;
    let bytes = text
        .chars()
        .map(|c| {
            if (c as u32) <= max {
                c as u32 as u8
            } else {
                had_errors = true;
                b'?'
            }
        })
        .collect();
    (bytes, had_errors)
}

// `Encoding::encode` substitutes HTML numeric references; we want `?` instead.
fn encode_legacy(text: &str, encoding: &'static Encoding) -> (Vec<u8>, bool) {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut had_errors = false;
    let mut remaining = text;
    loop {
        let capacity = encoder
            .max_buffer_length_from_utf8_without_replacement(remaining.len())
            .unwrap_or(remaining.len() * 4 + 16);
        let mut buffer = vec![0u8; capacity.max(16)];
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(remaining, &mut buffer, true);
        out.extend_from_slice(&buffer[..written]);
        remaining = &remaining[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(_) => {
                had_errors = true;
                out.push(b'?');
            }
        }
    }
    (out, had_errors)
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Charset::from_label(s).ok_or_else(|| format!("Unknown encoding '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_label_agree() {
        for charset in [
            Charset::Utf8,
            Charset::Utf8Sig,
            Charset::Utf16,
            Charset::Utf16Le,
            Charset::Utf16Be,
            Charset::Ascii,
            Charset::Latin1,
            Charset::Windows1252,
            Charset::Legacy(WINDOWS_1255),
        ] {
            assert_eq!(Charset::from_label(charset.name()), Some(charset));
        }
    }

    #[test]
    fn test_normalization_table() {
        assert_eq!(Charset::Ascii.normalized(), Charset::Utf8);
        assert_eq!(
            Charset::Legacy(ISO_8859_8).normalized(),
            Charset::Legacy(WINDOWS_1255)
        );
        assert_eq!(Charset::Windows1252.normalized(), Charset::Windows1252);
    }

    #[test]
    fn test_utf16_with_bom_round_trip() {
        let (bytes, lossy) = Charset::Utf16.encode("hé");
        assert!(!lossy);
        assert_eq!(bytes, vec![0xFF, 0xFE, b'h', 0x00, 0xE9, 0x00]);
        assert_eq!(Charset::Utf16.decode(&bytes), ("hé".to_string(), false));
    }

    #[test]
    fn test_utf16_big_endian_bom_is_honoured() {
        let bytes = [0xFE, 0xFF, 0x00, b'o', 0x00, b'k'];
        assert_eq!(Charset::Utf16.decode(&bytes).0, "ok");
    }

    #[test]
    fn test_latin1_maps_every_byte() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let (text, had_errors) = Charset::Latin1.decode(&bytes);
        assert!(!had_errors);
        assert_eq!(text.chars().count(), 256);
        assert_eq!(Charset::Latin1.encode(&text).0, bytes);
    }

    #[test]
    fn test_unmappable_characters_become_question_marks() {
        assert_eq!(Charset::Ascii.encode("naïve"), (b"na?ve".to_vec(), true));
        assert_eq!(Charset::Windows1252.encode("€ ok"), (vec![0x80, b' ', b'o', b'k'], false));
        assert_eq!(Charset::Windows1252.encode("日"), (b"?".to_vec(), true));
    }

    #[test]
    fn test_windows_1252_strict_rejects_undefined_bytes() {
        assert!(Charset::Windows1252.decode_strict(&[b'a', 0x81]).is_none());
        assert_eq!(
            Charset::Windows1252.decode_strict(&[0x80]).as_deref(),
            Some("€")
        );
    }

    #[test]
    fn test_conversion_targets() {
        assert!(Charset::Utf16Le.is_conversion_target());
        assert!(Charset::Latin1.is_conversion_target());
        assert!(!Charset::Legacy(WINDOWS_1255).is_conversion_target());
    }
}
