//! Language-aware tokenization.
//!
//! [`Tokenizer`] validates a cell, detects its language and hands the text
//! to the [`KoreanTokenizer`] or the [`EnglishTokenizer`]. Optional
//! analyzers are injected through [`Capabilities`]; when one is missing or
//! fails, a whitespace fallback is used and no error escapes.
//!
//! # Example
//!
//! ```
//! use newsprep::tokenize::{Capabilities, Tokenizer};
//!
//! let tokenizer = Tokenizer::new(Capabilities::builtin());
//! let tokens = tokenizer.tokenize_text("This is a test sentence with enough words.");
//! assert_eq!(tokens, vec!["test", "sentence", "enough", "word"]);
//! ```

pub mod english;
pub mod korean;
pub mod stopwords;

pub use english::{EnglishTokenizer, Lemmatizer, RuleLemmatizer};
pub use korean::{JosaSplitter, KoreanTokenizer, MorphAnalyzer};

use crate::cell::{CellClass, NonTextKind, RawCell};
use crate::lang::{Language, LanguageDetector, LanguageIdentifier};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Inputs shorter than this (trimmed, in chars) produce no tokens.
pub const DEFAULT_MIN_INPUT_CHARS: usize = 3;

/// Tokens shorter than this (in chars) are dropped.
pub const DEFAULT_MIN_TOKEN_CHARS: usize = 2;

/// Optional analyzers used by the tokenizer.
#[derive(Clone, Default)]
pub struct Capabilities {
    /// Probabilistic language identifier.
    pub language_identifier: Option<Arc<dyn LanguageIdentifier>>,
    /// Korean morpheme splitter.
    pub morph_analyzer: Option<Arc<dyn MorphAnalyzer>>,
    /// English lemmatizer.
    pub lemmatizer: Option<Arc<dyn Lemmatizer>>,
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("language_identifier", &self.language_identifier.is_some())
            .field("morph_analyzer", &self.morph_analyzer.is_some())
            .field("lemmatizer", &self.lemmatizer.is_some())
            .finish()
    }
}

impl Capabilities {
    /// Every analyzer bundled with the crate.
    pub fn builtin() -> Self {
        #[cfg(feature = "langdetect")]
        let language_identifier: Option<Arc<dyn LanguageIdentifier>> =
            Some(Arc::new(crate::lang::WhatlangIdentifier));
        #[cfg(not(feature = "langdetect"))]
        let language_identifier: Option<Arc<dyn LanguageIdentifier>> = None;

        Self {
            language_identifier,
            morph_analyzer: Some(Arc::new(JosaSplitter)),
            lemmatizer: Some(Arc::new(RuleLemmatizer)),
        }
    }

    /// No analyzers; every stage uses its fallback.
    pub fn none() -> Self {
        Self::default()
    }

    /// Sets the language identifier.
    pub fn with_language_identifier(mut self, identifier: Arc<dyn LanguageIdentifier>) -> Self {
        self.language_identifier = Some(identifier);
        self
    }

    /// Removes the language identifier (Hangul heuristic only).
    pub fn without_language_identifier(mut self) -> Self {
        self.language_identifier = None;
        self
    }

    /// Sets the Korean morph analyzer.
    pub fn with_morph_analyzer(mut self, analyzer: Arc<dyn MorphAnalyzer>) -> Self {
        self.morph_analyzer = Some(analyzer);
        self
    }

    /// Removes the Korean morph analyzer (whitespace split).
    pub fn without_morph_analyzer(mut self) -> Self {
        self.morph_analyzer = None;
        self
    }

    /// Sets the English lemmatizer.
    pub fn with_lemmatizer(mut self, lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        self.lemmatizer = Some(lemmatizer);
        self
    }

    /// Removes the English lemmatizer (whitespace split).
    pub fn without_lemmatizer(mut self) -> Self {
        self.lemmatizer = None;
        self
    }
}

/// Language-dispatching tokenizer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    detector: LanguageDetector,
    korean: KoreanTokenizer,
    english: EnglishTokenizer,
    min_input_chars: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(Capabilities::builtin())
    }
}

impl Tokenizer {
    /// Creates a tokenizer with the default thresholds.
    pub fn new(capabilities: Capabilities) -> Self {
        Self::with_thresholds(capabilities, DEFAULT_MIN_INPUT_CHARS, DEFAULT_MIN_TOKEN_CHARS)
    }

    /// Creates a tokenizer with explicit input and token length thresholds.
    pub fn with_thresholds(
        capabilities: Capabilities,
        min_input_chars: usize,
        min_token_chars: usize,
    ) -> Self {
        Self {
            detector: LanguageDetector::new(capabilities.language_identifier),
            korean: KoreanTokenizer::new(capabilities.morph_analyzer, min_token_chars),
            english: EnglishTokenizer::new(capabilities.lemmatizer, min_token_chars),
            min_input_chars,
        }
    }

    /// Returns the language detector.
    pub fn detector(&self) -> &LanguageDetector {
        &self.detector
    }

    /// Tokenizes any cell value. Never fails.
    ///
    /// Missing, non-text and too-short cells produce an empty sequence.
    pub fn tokenize_and_normalize(&self, raw: &RawCell) -> Vec<String> {
        match raw.classify(self.min_input_chars) {
            CellClass::UsableText(text) => self.tokenize_usable(&text).1,
            CellClass::NonText(NonTextKind::Callable(repr)) => {
                warn!(
                    target: "newsprep::data_quality",
                    "callable object passed to tokenizer: {}", repr
                );
                Vec::new()
            }
            CellClass::NonText(NonTextKind::Unconvertible(reason)) => {
                debug!(target: "newsprep::tokenize", "cannot convert cell to text: {}", reason);
                Vec::new()
            }
            CellClass::Missing | CellClass::ShortText(_) => Vec::new(),
        }
    }

    /// Tokenizes a string. Never fails.
    pub fn tokenize_text(&self, text: &str) -> Vec<String> {
        self.tokenize_with_language(text).1
    }

    /// Tokenizes a string and reports the language it was routed to.
    ///
    /// Inputs too short to tokenize report [`Language::English`].
    pub fn tokenize_with_language(&self, text: &str) -> (Language, Vec<String>) {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.min_input_chars {
            return (Language::English, Vec::new());
        }
        self.tokenize_usable(trimmed)
    }

    fn tokenize_usable(&self, text: &str) -> (Language, Vec<String>) {
        let language = self.detector.detect(text);
        let tokens = match language {
            Language::Korean => self.korean.tokenize(text),
            Language::English => self.english.tokenize(text),
        };
        (language, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};

    struct Panicky;

    impl MorphAnalyzer for Panicky {
        fn morphs(&self, _text: &str) -> Result<Vec<String>> {
            Err(Error::Analyzer("analyzer crashed".into()))
        }
    }

    fn heuristic() -> Tokenizer {
        Tokenizer::new(Capabilities::builtin().without_language_identifier())
    }

    #[test]
    fn test_english_sentence() {
        let tokens = heuristic().tokenize_text("This is a test sentence with enough words.");
        assert!(tokens.len() >= 3);
        assert!(tokens.contains(&"sentence".to_string()));
    }

    #[test]
    fn test_korean_sentence() {
        let (lang, tokens) = heuristic().tokenize_with_language("오늘 날씨가 정말 좋고 기분이 좋습니다");
        assert_eq!(lang, Language::Korean);
        assert!(tokens.contains(&"날씨".to_string()));
        assert!(tokens.iter().all(|t| t.chars().count() >= 2));
    }

    #[test]
    fn test_korean_sentence_with_replacement_char() {
        let (lang, tokens) = heuristic()
            .tokenize_with_language("오늘 날씨가 정말 좋고 기분도 상\u{FFFD}ncelled되었습니다 완전히");
        assert_eq!(lang, Language::Korean);
        assert_eq!(
            tokens,
            vec!["오늘", "날씨", "정말", "좋고", "기분", "ncelled", "되었습니다", "완전히"]
        );
    }

    #[test]
    fn test_total_over_non_text_cells() {
        let tokenizer = heuristic();
        assert!(tokenizer.tokenize_and_normalize(&RawCell::Missing).is_empty());
        assert!(tokenizer
            .tokenize_and_normalize(&RawCell::callable("<function clean_text at 0x1>"))
            .is_empty());
        assert!(tokenizer
            .tokenize_and_normalize(&RawCell::Bytes(vec![0xFF, 0xFE]))
            .is_empty());
        assert!(tokenizer.tokenize_and_normalize(&RawCell::Number(f64::NAN)).is_empty());
        assert!(tokenizer.tokenize_and_normalize(&RawCell::from("ab")).is_empty());
        assert!(tokenizer.tokenize_and_normalize(&RawCell::from("  가  ")).is_empty());
    }

    #[test]
    fn test_number_cells_yield_no_alpha_tokens() {
        assert!(heuristic().tokenize_and_normalize(&RawCell::from(12345_i64)).is_empty());
    }

    #[test]
    fn test_without_capabilities() {
        let tokenizer = Tokenizer::new(Capabilities::none());
        let tokens = tokenizer.tokenize_text("국회 본회의 그리고 개최");
        assert_eq!(tokens, vec!["국회", "본회의", "개최"]);
    }

    #[test]
    fn test_failing_capability_is_contained() {
        let tokenizer = Tokenizer::new(
            Capabilities::none().with_morph_analyzer(Arc::new(Panicky)),
        );
        let tokens = tokenizer.tokenize_and_normalize(&RawCell::from("정부 예산안 발표"));
        assert_eq!(tokens, vec!["정부", "예산안", "발표"]);
    }

    #[test]
    fn test_custom_thresholds() {
        let tokenizer = Tokenizer::with_thresholds(Capabilities::none(), 3, 4);
        let tokens = tokenizer.tokenize_text("rates rise fast tomorrow");
        assert_eq!(tokens, vec!["rates", "rise", "fast", "tomorrow"]);
        let tokens = tokenizer.tokenize_text("an big cat");
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_capabilities_debug_hides_objects() {
        let caps = Capabilities::none().with_lemmatizer(Arc::new(RuleLemmatizer));
        let debug = format!("{caps:?}");
        assert!(debug.contains("lemmatizer: true"));
        assert!(debug.contains("morph_analyzer: false"));
    }
}
