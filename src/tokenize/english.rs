//! English (and every other non-Korean language) tokenization.

use super::stopwords::is_english_stopword;
use crate::error::Result;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::debug;

static RE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// Reduces a lowercase word to its dictionary form.
pub trait Lemmatizer: Send + Sync {
    /// Returns the lemma of `word`.
    fn lemmatize(&self, word: &str) -> Result<String>;
}

/// Plural and irregular noun forms with no regular suffix rule.
const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("oxen", "ox"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("lives", "life"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("wolves", "wolf"),
    ("shelves", "shelf"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("theses", "thesis"),
    ("movies", "movie"),
    ("cookies", "cookie"),
    ("calories", "calorie"),
];

/// Words ending in `s` that are not plurals.
const UNINFLECTED: &[&str] = &[
    "always", "perhaps", "towards", "afterwards", "besides", "whereas", "sometimes", "series",
    "species", "news", "physics", "economics", "politics", "nevertheless", "various",
];

/// Singulars ending in a single `s`; their plurals add `-es`.
const ES_STEMS: &[&str] = &[
    "bus", "gas", "virus", "bonus", "campus", "census", "consensus", "surplus", "focus",
    "chorus", "circus", "bias", "atlas", "alias", "canvas", "lens", "iris",
];

/// Rule-based [`Lemmatizer`] for nouns.
///
/// Applies WordNet's noun detachment rules (`-ses`, `-xes`, `-zes`,
/// `-ches`, `-shes`, `-ies`, `-s`) after lookups of irregular and
/// uninflected forms. Without a dictionary to validate candidates, words
/// ending in `ss`, `us` or `is` are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleLemmatizer;

impl RuleLemmatizer {
    fn lemma(word: &str) -> String {
        if let Some((_, lemma)) = IRREGULAR_NOUNS.iter().find(|(form, _)| *form == word) {
            return (*lemma).to_string();
        }
        if UNINFLECTED.contains(&word) || word.chars().count() <= 3 {
            return word.to_string();
        }
        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return word.to_string();
        }

        if let Some(stem) = word.strip_suffix("ies") {
            // lies, ties, dies
            if stem.chars().count() <= 2 {
                return format!("{stem}ie");
            }
            return format!("{stem}y");
        }
        if let Some(stem) = word.strip_suffix("es") {
            if ES_STEMS.contains(&stem) {
                return stem.to_string();
            }
        }
        for suffix in ["sses", "xes", "zzes", "ches", "shes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }
        if let Some(stem) = word.strip_suffix('s') {
            return stem.to_string();
        }

        word.to_string()
    }
}

impl Lemmatizer for RuleLemmatizer {
    fn lemmatize(&self, word: &str) -> Result<String> {
        Ok(Self::lemma(word))
    }
}

/// English token pipeline: words, filters, lemmas.
///
/// Every non-Korean text lands here, so Hangul runs inside mostly-Latin
/// text are kept as tokens of their own.
#[derive(Clone)]
pub struct EnglishTokenizer {
    lemmatizer: Option<Arc<dyn Lemmatizer>>,
    min_token_chars: usize,
}

impl fmt::Debug for EnglishTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnglishTokenizer")
            .field("lemmatizer", &self.lemmatizer.is_some())
            .field("min_token_chars", &self.min_token_chars)
            .finish()
    }
}

impl EnglishTokenizer {
    /// Creates a tokenizer with an optional lemmatizer.
    pub fn new(lemmatizer: Option<Arc<dyn Lemmatizer>>, min_token_chars: usize) -> Self {
        Self {
            lemmatizer,
            min_token_chars,
        }
    }

    /// Tokenizes text. Never fails.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return Vec::new();
        }

        let Some(lemmatizer) = &self.lemmatizer else {
            return self.whitespace_tokens(&lower);
        };

        match self.lemmatized_tokens(&lower, lemmatizer.as_ref()) {
            Ok(tokens) => tokens,
            Err(e) => {
                debug!(
                    target: "newsprep::tokenize",
                    "lemmatizer failed, splitting on whitespace: {}", e
                );
                self.whitespace_tokens(&lower)
            }
        }
    }

    fn lemmatized_tokens(&self, lower: &str, lemmatizer: &dyn Lemmatizer) -> Result<Vec<String>> {
        let mut tokens = Vec::new();
        for word in RE_WORD.find_iter(lower).map(|m| m.as_str()) {
            if !self.keeps(word) {
                continue;
            }
            let lemma = lemmatizer.lemmatize(word)?;
            if self.keeps(&lemma) {
                tokens.push(lemma);
            }
        }
        Ok(tokens)
    }

    fn whitespace_tokens(&self, lower: &str) -> Vec<String> {
        lower
            .split_whitespace()
            .filter(|w| self.keeps(w))
            .map(str::to_string)
            .collect()
    }

    fn keeps(&self, word: &str) -> bool {
        !word.is_empty()
            && word.chars().all(char::is_alphabetic)
            && word.chars().count() >= self.min_token_chars
            && !is_english_stopword(word)
    }
}
