//! Korean / non-Korean language detection.
//!
//! A [`LanguageDetector`] first consults an injected
//! [`LanguageIdentifier`] and falls back to a Hangul-ratio heuristic when
//! the identifier is absent, fails, or is unsure.

use crate::error::{Error, Result};
use crate::normalize::is_hangul_syllable;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Texts shorter than this (trimmed, in chars) are treated as English.
pub const MIN_DETECT_CHARS: usize = 3;

/// Share of Hangul syllables above which a text counts as Korean.
pub const KOREAN_RATIO_THRESHOLD: f64 = 0.1;

/// Detected language.
///
/// `English` stands for every non-Korean language; the English tokenizer
/// handles them all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Korean
    Korean,
    /// English or any other non-Korean language
    English,
}

impl Language {
    /// Returns the ISO 639-1 code (`"ko"` or `"en"`).
    pub fn code(self) -> &'static str {
        match self {
            Language::Korean => "ko",
            Language::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A probabilistic language identification backend.
///
/// Implementations return `Err` when they cannot commit to an answer; the
/// detector then uses the heuristic.
pub trait LanguageIdentifier: Send + Sync {
    /// Identifies the language of `text`.
    fn identify(&self, text: &str) -> Result<Language>;
}

/// [`LanguageIdentifier`] backed by the `whatlang` trigram models.
#[cfg(feature = "langdetect")]
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangIdentifier;

#[cfg(feature = "langdetect")]
impl LanguageIdentifier for WhatlangIdentifier {
    fn identify(&self, text: &str) -> Result<Language> {
        let info = whatlang::detect(text)
            .ok_or_else(|| Error::Analyzer("no language detected".into()))?;

        if !info.is_reliable() {
            return Err(Error::Analyzer(format!(
                "unreliable detection ({:?}, confidence {:.2})",
                info.lang(),
                info.confidence()
            )));
        }

        Ok(if info.lang() == whatlang::Lang::Kor {
            Language::Korean
        } else {
            Language::English
        })
    }
}

/// Korean / non-Korean classifier with an optional identifier backend.
#[derive(Clone, Default)]
pub struct LanguageDetector {
    identifier: Option<Arc<dyn LanguageIdentifier>>,
}

impl fmt::Debug for LanguageDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageDetector")
            .field("identifier", &self.identifier.is_some())
            .finish()
    }
}

impl LanguageDetector {
    /// Creates a detector that consults `identifier` first.
    pub fn new(identifier: Option<Arc<dyn LanguageIdentifier>>) -> Self {
        Self { identifier }
    }

    /// Detects the language of `text`. Never fails.
    pub fn detect(&self, text: &str) -> Language {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_DETECT_CHARS {
            return Language::English;
        }

        if let Some(identifier) = &self.identifier {
            match identifier.identify(trimmed) {
                Ok(lang) => return lang,
                Err(e) => debug!(target: "newsprep::lang", "identifier fell back to heuristic: {}", e),
            }
        }

        detect_by_hangul_ratio(trimmed)
    }
}

/// Ratio of Hangul syllables to all characters.
pub fn hangul_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let korean = text.chars().filter(|&c| is_hangul_syllable(c)).count();
    korean as f64 / total as f64
}

/// Heuristic path: Korean when Hangul syllables exceed 10% of the text.
pub fn detect_by_hangul_ratio(text: &str) -> Language {
    if hangul_ratio(text) > KOREAN_RATIO_THRESHOLD {
        Language::Korean
    } else {
        Language::English
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Language);

    impl LanguageIdentifier for Fixed {
        fn identify(&self, _text: &str) -> Result<Language> {
            Ok(self.0)
        }
    }

    struct Failing;

    impl LanguageIdentifier for Failing {
        fn identify(&self, _text: &str) -> Result<Language> {
            Err(Error::Analyzer("model not loaded".into()))
        }
    }

    #[test]
    fn test_short_text_defaults_to_english() {
        let detector = LanguageDetector::new(Some(Arc::new(Fixed(Language::Korean))));
        assert_eq!(detector.detect(""), Language::English);
        assert_eq!(detector.detect("  가 "), Language::English);
        assert_eq!(detector.detect("가나"), Language::English);
    }

    #[test]
    fn test_identifier_wins_when_it_answers() {
        let detector = LanguageDetector::new(Some(Arc::new(Fixed(Language::Korean))));
        assert_eq!(detector.detect("plain english text"), Language::Korean);
    }

    #[test]
    fn test_failing_identifier_falls_back() {
        let detector = LanguageDetector::new(Some(Arc::new(Failing)));
        assert_eq!(detector.detect("오늘 날씨가 좋습니다"), Language::Korean);
        assert_eq!(detector.detect("the weather is nice"), Language::English);
    }

    #[test]
    fn test_heuristic_threshold() {
        // 1 syllable in 10 chars = exactly 10%: not Korean
        assert_eq!(detect_by_hangul_ratio("가abcdefghi"), Language::English);
        // 2 syllables in 10 chars = 20%: Korean
        assert_eq!(detect_by_hangul_ratio("가나abcdefgh"), Language::Korean);
        assert_eq!(detect_by_hangul_ratio(""), Language::English);
    }

    #[test]
    fn test_jamo_alone_is_not_korean() {
        // Compatibility jamo are outside the syllable block
        assert_eq!(detect_by_hangul_ratio("ㅋㅋㅋㅋㅋ"), Language::English);
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::Korean.code(), "ko");
        assert_eq!(Language::English.to_string(), "en");
    }

    #[cfg(feature = "langdetect")]
    #[test]
    fn test_whatlang_identifier() {
        let detector = LanguageDetector::new(Some(Arc::new(WhatlangIdentifier)));
        assert_eq!(
            detector.detect("오늘 서울의 날씨는 맑고 기온은 평년보다 높겠습니다"),
            Language::Korean
        );
        assert_eq!(
            detector.detect("The central bank raised interest rates again this morning"),
            Language::English
        );
    }
}
