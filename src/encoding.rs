//! Text encodings tried when reading tabular files.
//!
//! Korean CSV exports come in several encodings. [`decode_with_ladder`]
//! tries each encoding of a ladder in order and keeps the first one that
//! decodes strictly *and* is accepted by the caller's parser.

use encoding_rs::EUC_KR;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// UTF-8 byte order mark.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A supported text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextEncoding {
    /// UTF-8 with an optional leading byte order mark.
    Utf8Sig,
    /// Plain UTF-8.
    Utf8,
    /// Windows code page 949 (Unified Hangul Code).
    Cp949,
    /// EUC-KR restricted to the KS X 1001 byte ranges.
    EucKr,
    /// ISO-8859-1; decodes any byte sequence.
    Latin1,
}

impl TextEncoding {
    /// The default ladder, most specific first.
    pub const LADDER: [TextEncoding; 5] = [
        TextEncoding::Utf8Sig,
        TextEncoding::Utf8,
        TextEncoding::Cp949,
        TextEncoding::EucKr,
        TextEncoding::Latin1,
    ];

    /// Returns the conventional label of the encoding.
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Cp949 => "cp949",
            TextEncoding::EucKr => "euc-kr",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// Decodes `bytes` without replacement characters.
    ///
    /// Returns the reason on malformed input.
    pub fn decode(self, bytes: &[u8]) -> Result<String, String> {
        match self {
            TextEncoding::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                decode_utf8(body)
            }
            TextEncoding::Utf8 => decode_utf8(bytes),
            TextEncoding::Cp949 => decode_cp949(bytes),
            TextEncoding::EucKr => {
                check_ks_x_1001(bytes)?;
                decode_cp949(bytes)
            }
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8-sig" | "utf8-sig" => Ok(TextEncoding::Utf8Sig),
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "cp949" | "windows-949" | "uhc" => Ok(TextEncoding::Cp949),
            "euc-kr" | "euckr" => Ok(TextEncoding::EucKr),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            other => Err(format!("unknown encoding: {other}")),
        }
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| e.to_string())
}

fn decode_cp949(bytes: &[u8]) -> Result<String, String> {
    EUC_KR
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| "malformed cp949 sequence".to_string())
}

/// EUC-KR lead and trail bytes (KS X 1001 rows and cells).
#[inline]
fn is_ks_x_1001_byte(byte: u8) -> bool {
    (0xA1..=0xFE).contains(&byte)
}

/// Rejects byte sequences that use the CP949 extension ranges.
fn check_ks_x_1001(bytes: &[u8]) -> Result<(), String> {
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if byte < 0x80 {
            i += 1;
            continue;
        }
        if !is_ks_x_1001_byte(byte) {
            return Err(format!("invalid euc-kr lead byte 0x{byte:02X} at offset {i}"));
        }
        match bytes.get(i + 1) {
            Some(&trail) if is_ks_x_1001_byte(trail) => i += 2,
            Some(&trail) => {
                return Err(format!(
                    "invalid euc-kr trail byte 0x{trail:02X} at offset {}",
                    i + 1
                ))
            }
            None => return Err(format!("truncated euc-kr sequence at offset {i}")),
        }
    }
    Ok(())
}

/// Outcome of one rung of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodingAttempt {
    /// The encoding tried.
    pub encoding: TextEncoding,
    /// Whether decoding and parsing both succeeded.
    pub success: bool,
    /// Why the attempt failed.
    pub error: Option<String>,
}

impl EncodingAttempt {
    /// A successful attempt.
    pub fn succeeded(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            success: true,
            error: None,
        }
    }

    /// A failed attempt.
    pub fn failed(encoding: TextEncoding, error: impl Into<String>) -> Self {
        Self {
            encoding,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Result of walking the ladder.
#[derive(Debug)]
pub struct LadderOutcome<T> {
    /// The accepted encoding and the parser's value, if any rung succeeded.
    pub accepted: Option<(TextEncoding, T)>,
    /// Every attempt, in order.
    pub attempts: Vec<EncodingAttempt>,
}

/// Tries each encoding until one decodes and passes `parse`.
///
/// `parse` receives the decoded text and returns the reason on failure.
/// `on_attempt` is called after every attempt.
pub fn decode_with_ladder<T, P, O>(
    bytes: &[u8],
    ladder: &[TextEncoding],
    mut parse: P,
    mut on_attempt: O,
) -> LadderOutcome<T>
where
    P: FnMut(String) -> Result<T, String>,
    O: FnMut(&EncodingAttempt),
{
    let mut attempts = Vec::with_capacity(ladder.len());

    for &encoding in ladder {
        let result = encoding.decode(bytes).and_then(&mut parse);
        let attempt = match &result {
            Ok(_) => EncodingAttempt::succeeded(encoding),
            Err(reason) => EncodingAttempt::failed(encoding, reason.clone()),
        };
        on_attempt(&attempt);
        attempts.push(attempt);

        if let Ok(value) = result {
            return LadderOutcome {
                accepted: Some((encoding, value)),
                attempts,
            };
        }
    }

    LadderOutcome {
        accepted: None,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // "뉴스" in EUC-KR / CP949
    const NEWS_EUC_KR: &[u8] = &[0xB4, 0xBA, 0xBD, 0xBA];
    // "똠" exists only in the CP949 extension (lead 0x8C)
    const CP949_ONLY: &[u8] = &[0x8C, 0x63];

    #[test]
    fn test_utf8_sig_strips_bom() {
        let bytes = [UTF8_BOM, "content".as_bytes()].concat();
        assert_eq!(TextEncoding::Utf8Sig.decode(&bytes).unwrap(), "content");
        assert_eq!(TextEncoding::Utf8Sig.decode(b"plain").unwrap(), "plain");
        assert_eq!(TextEncoding::Utf8.decode(&bytes).unwrap(), "\u{FEFF}content");
    }

    #[test]
    fn test_utf8_rejects_korean_legacy_bytes() {
        assert!(TextEncoding::Utf8Sig.decode(NEWS_EUC_KR).is_err());
        assert!(TextEncoding::Utf8.decode(NEWS_EUC_KR).is_err());
    }

    #[test]
    fn test_cp949_decodes() {
        assert_eq!(TextEncoding::Cp949.decode(NEWS_EUC_KR).unwrap(), "뉴스");
        assert_eq!(TextEncoding::Cp949.decode(CP949_ONLY).unwrap(), "똠");
    }

    #[test]
    fn test_euc_kr_rejects_extension_bytes() {
        assert_eq!(TextEncoding::EucKr.decode(NEWS_EUC_KR).unwrap(), "뉴스");
        let err = TextEncoding::EucKr.decode(CP949_ONLY).unwrap_err();
        assert!(err.contains("0x8C"));
        assert!(TextEncoding::EucKr.decode(&[0xB4]).is_err());
    }

    #[test]
    fn test_latin1_accepts_anything() {
        assert_eq!(TextEncoding::Latin1.decode(&[0x41, 0xE9, 0xFF]).unwrap(), "Aéÿ");
    }

    #[test]
    fn test_ladder_stops_at_first_success() {
        let mut seen = Vec::new();
        let outcome = decode_with_ladder(
            NEWS_EUC_KR,
            &TextEncoding::LADDER,
            |text| Ok(text),
            |a| seen.push(a.encoding),
        );
        let (encoding, text) = outcome.accepted.unwrap();
        assert_eq!(encoding, TextEncoding::Cp949);
        assert_eq!(text, "뉴스");
        assert_eq!(outcome.attempts.len(), 3);
        assert!(!outcome.attempts[0].success);
        assert!(outcome.attempts[2].success);
        assert_eq!(
            seen,
            vec![TextEncoding::Utf8Sig, TextEncoding::Utf8, TextEncoding::Cp949]
        );
    }

    #[test]
    fn test_parse_failure_moves_to_next_rung() {
        let outcome = decode_with_ladder(
            b"abc",
            &[TextEncoding::Utf8, TextEncoding::Latin1],
            |text| {
                if text.is_empty() {
                    Ok(text)
                } else {
                    Err("rejected".to_string())
                }
            },
            |_| {},
        );
        assert!(outcome.accepted.is_none());
        assert_eq!(outcome.attempts.len(), 2);
        assert_eq!(outcome.attempts[1].error.as_deref(), Some("rejected"));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("CP949".parse::<TextEncoding>().unwrap(), TextEncoding::Cp949);
        assert_eq!("utf_8_sig".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8Sig);
        assert!("ascii".parse::<TextEncoding>().is_err());
    }
}
