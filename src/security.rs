// src/security.rs

use crate::core_types::{SecurityFinding, SourceFile};
use crate::encoding::{read_and_decode, EncodingOptions};
use crate::errors::{Error, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How a run responds to potential secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityMode {
    /// Do not scan.
    #[default]
    Off,
    /// Fail the run before anything is written.
    Abort,
    /// Drop every flagged file from the bundle.
    Skip,
    /// Bundle everything and log a consolidated warning afterwards.
    Warn,
}

impl FromStr for SecurityMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" | "disabled" => Ok(SecurityMode::Off),
            "abort" => Ok(SecurityMode::Abort),
            "skip" => Ok(SecurityMode::Skip),
            "warn" => Ok(SecurityMode::Warn),
            other => Err(format!(
                "Unknown security mode '{}'. Expected one of: none, abort, skip, warn",
                other
            )),
        }
    }
}

/// Category of a detected secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKind {
    Password,
    SecretKey,
    ApiKey,
    Token,
    PrivateKey,
    AwsCredential,
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SecretKind::Password => "password",
            SecretKind::SecretKey => "secret key",
            SecretKind::ApiKey => "API key",
            SecretKind::Token => "token",
            SecretKind::PrivateKey => "private key",
            SecretKind::AwsCredential => "AWS credential",
        };
        f.write_str(label)
    }
}

/// A pluggable line-oriented secret detector.
pub trait SecretDetector: Send + Sync + fmt::Debug {
    /// Classifies a single line, returning the first matching kind.
    fn detect_line(&self, line: &str) -> Option<SecretKind>;

    /// Scans a whole text and reports one finding per flagged line.
    fn scan_text(&self, path: &str, text: &str) -> Vec<SecurityFinding> {
        text.lines()
            .enumerate()
            .filter_map(|(idx, line)| {
                self.detect_line(line).map(|kind| SecurityFinding {
                    path: path.to_string(),
                    kind,
                    line: idx + 1,
                    message: format!("Potential {} on line {}", kind, idx + 1),
                })
            })
            .collect()
    }
}

struct SecretPattern {
    kind: SecretKind,
    pattern: Lazy<Regex>,
}

// Checked in order; the first match classifies the line. Each pattern captures
// the sensitive part as `secret` so redaction can keep the surrounding key.
static PATTERNS: [SecretPattern; 6] = [
    SecretPattern {
        kind: SecretKind::PrivateKey,
        pattern: Lazy::new(|| {
            Regex::new(r"(?P<secret>-----BEGIN[A-Z ]*PRIVATE KEY-----)").unwrap()
        }),
    },
    SecretPattern {
        kind: SecretKind::AwsCredential,
        pattern: Lazy::new(|| {
            Regex::new(
                r#"(?i)(?:\b(?P<secret>AKIA[0-9A-Z]{16})\b|aws_?(?:secret_)?(?:access_)?key(?:_id)?["']?\s*[:=]\s*["']?(?P<secret2>[A-Za-z0-9/+=]{16,}))"#,
            )
            .unwrap()
        }),
    },
    SecretPattern {
        kind: SecretKind::Password,
        pattern: Lazy::new(|| {
            Regex::new(r#"(?i)(?:password|passwd|pwd)["']?\s*[:=]\s*["']?(?P<secret>[^\s"']{4,})"#)
                .unwrap()
        }),
    },
    SecretPattern {
        kind: SecretKind::SecretKey,
        pattern: Lazy::new(|| {
            Regex::new(
                r#"(?i)(?:secret[_-]?key|client[_-]?secret|secret)["']?\s*[:=]\s*["']?(?P<secret>[^\s"']{8,})"#,
            )
            .unwrap()
        }),
    },
    SecretPattern {
        kind: SecretKind::ApiKey,
        pattern: Lazy::new(|| {
            Regex::new(r#"(?i)api[_-]?key["']?\s*[:=]\s*["']?(?P<secret>[A-Za-z0-9_\-]{16,})"#)
                .unwrap()
        }),
    },
    SecretPattern {
        kind: SecretKind::Token,
        pattern: Lazy::new(|| {
            Regex::new(
                r#"(?i)(?:(?:access[_-]?token|auth[_-]?token|bearer|token)["']?(?:\s*[:=]\s*|\s+)["']?(?P<secret>[A-Za-z0-9_\-.]{16,})|\b(?P<secret2>gh[pousr]_[A-Za-z0-9]{36,}))"#,
            )
            .unwrap()
        }),
    },
];

/// Regex-based fallback detector for common credential shapes.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternDetector;

impl SecretDetector for PatternDetector {
    fn detect_line(&self, line: &str) -> Option<SecretKind> {
        PATTERNS
            .iter()
            .find(|p| p.pattern.is_match(line))
            .map(|p| p.kind)
    }
}

/// Replaces the sensitive part of every pattern match with `[REDACTED]`.
///
/// # Examples
/// ```
/// use dirbundle::security::redact_secrets;
///
/// let out = redact_secrets("password = hunter22\nname = bob");
/// assert_eq!(out, "password = [REDACTED]\nname = bob");
/// ```
pub fn redact_secrets(text: &str) -> String {
    let mut out = text.to_string();
    for p in PATTERNS.iter() {
        out = p
            .pattern
            .replace_all(&out, |caps: &Captures| {
                let whole = &caps[0];
                let offset = caps.get(0).map_or(0, |m| m.start());
                match caps.name("secret").or_else(|| caps.name("secret2")) {
                    Some(secret) => format!(
                        "{}[REDACTED]{}",
                        &whole[..secret.start() - offset],
                        &whole[secret.end() - offset..]
                    ),
                    None => "[REDACTED]".to_string(),
                }
            })
            .into_owned();
    }
    out
}

/// Scans candidate files and applies the configured response mode.
#[derive(Debug, Clone)]
pub struct SecurityScanner {
    mode: SecurityMode,
    detector: Arc<dyn SecretDetector>,
}

impl SecurityScanner {
    pub fn new(mode: SecurityMode) -> Self {
        Self::with_detector(mode, Arc::new(PatternDetector))
    }

    /// Uses a custom detector instead of the built-in patterns.
    pub fn with_detector(mode: SecurityMode, detector: Arc<dyn SecretDetector>) -> Self {
        Self { mode, detector }
    }

    pub fn mode(&self) -> SecurityMode {
        self.mode
    }

    /// Reads and scans every file for which `should_scan` returns `true`.
    ///
    /// Files that cannot be read are left for the writer to report. Findings are
    /// returned in file order.
    pub fn scan<F>(&self, files: &[SourceFile], should_scan: F) -> Vec<SecurityFinding>
    where
        F: Fn(&SourceFile) -> bool + Sync,
    {
        if self.mode == SecurityMode::Off {
            return Vec::new();
        }
        let scan_options = EncodingOptions::default();
        files
            .par_iter()
            .filter(|file| should_scan(file))
            .map(|file| match read_and_decode(&file.absolute_path, &scan_options) {
                Ok(content) => self.detector.scan_text(&file.relative_path, &content.text),
                Err(e) => {
                    debug!("Security scan could not read '{}': {}", file.relative_path, e);
                    Vec::new()
                }
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }

    /// Applies the response mode to the scan results.
    ///
    /// `Abort` fails with [`Error::Security`]; `Skip` removes every flagged path;
    /// `Warn` and `Off` return the files untouched.
    pub fn enforce(
        &self,
        files: Vec<SourceFile>,
        findings: &[SecurityFinding],
    ) -> Result<Vec<SourceFile>> {
        if findings.is_empty() {
            return Ok(files);
        }
        match self.mode {
            SecurityMode::Abort => Err(Error::Security {
                count: findings.len(),
                summary: summarize(findings),
            }),
            SecurityMode::Skip => {
                let flagged: BTreeSet<&str> = findings.iter().map(|f| f.path.as_str()).collect();
                for path in &flagged {
                    warn!("Skipping '{}': potential secrets detected", path);
                }
                Ok(files
                    .into_iter()
                    .filter(|f| !flagged.contains(f.relative_path.as_str()))
                    .collect())
            }
            SecurityMode::Warn | SecurityMode::Off => Ok(files),
        }
    }
}

/// Logs one consolidated warning for all findings of a finished run.
pub fn report_findings(findings: &[SecurityFinding]) {
    if findings.is_empty() {
        return;
    }
    let files: BTreeSet<&str> = findings.iter().map(|f| f.path.as_str()).collect();
    warn!(
        "Potential secrets found in {} file(s) ({} finding(s)): {}",
        files.len(),
        findings.len(),
        summarize(findings)
    );
}

fn summarize(findings: &[SecurityFinding]) -> String {
    const SHOWN: usize = 5;
    let mut parts: Vec<String> = findings
        .iter()
        .take(SHOWN)
        .map(|f| format!("{}:{} ({})", f.path, f.line, f.kind))
        .collect();
    if findings.len() > SHOWN {
        parts.push(format!("and {} more", findings.len() - SHOWN));
    }
    parts.join(", ")
}
