//! Korean tokenization.
//!
//! Morphemes come from an injected [`MorphAnalyzer`]. Without one, or when
//! it fails, the text is split on whitespace.

use super::stopwords::is_korean_stopword;
use crate::error::Result;
use crate::normalize::{is_hangul_jamo, is_hangul_syllable};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A morphological analyzer splitting Korean text into morphemes.
pub trait MorphAnalyzer: Send + Sync {
    /// Splits `text` into morphemes, in order.
    fn morphs(&self, text: &str) -> Result<Vec<String>>;
}

/// Postpositions (조사) detached from the end of an eojeol, longest first.
const JOSA: &[&str] = &[
    "에서는", "에서도", "으로는", "으로서", "으로써", "에게서", "까지는", "부터는", "이라고",
    "에서", "에게", "에는", "에도", "으로", "로서", "로써", "까지", "부터", "처럼", "보다",
    "하고", "이나", "이랑", "한테", "께서", "마다", "조차", "마저", "만큼", "라고",
    "은", "는", "이", "가", "을", "를", "의", "에", "도", "와", "과", "로", "만",
];

/// A stem must keep at least this many syllables after a postposition is
/// detached.
const MIN_STEM_CHARS: usize = 2;

/// Rule-based [`MorphAnalyzer`].
///
/// Each whitespace-separated eojeol is split where the script changes
/// (Hangul, Latin, digits), and a trailing postposition is detached from
/// Hangul runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct JosaSplitter;

impl MorphAnalyzer for JosaSplitter {
    fn morphs(&self, text: &str) -> Result<Vec<String>> {
        let mut morphs = Vec::new();

        for eojeol in text.split_whitespace() {
            for run in script_runs(eojeol) {
                if run.kind == RunKind::Hangul {
                    let (stem, josa) = split_josa(run.text);
                    morphs.push(stem.to_string());
                    if let Some(josa) = josa {
                        morphs.push(josa.to_string());
                    }
                } else {
                    morphs.push(run.text.to_string());
                }
            }
        }

        Ok(morphs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKind {
    Hangul,
    Latin,
    Digit,
    Other,
}

struct Run<'a> {
    kind: RunKind,
    text: &'a str,
}

fn run_kind(c: char) -> RunKind {
    if is_hangul_syllable(c) || is_hangul_jamo(c) {
        RunKind::Hangul
    } else if c.is_ascii_digit() {
        RunKind::Digit
    } else if c.is_alphabetic() {
        RunKind::Latin
    } else {
        RunKind::Other
    }
}

/// Splits a word into maximal runs of the same script.
fn script_runs(word: &str) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<RunKind> = None;

    for (idx, c) in word.char_indices() {
        let kind = run_kind(c);
        match current {
            Some(k) if k == kind => {}
            Some(k) => {
                runs.push(Run {
                    kind: k,
                    text: &word[start..idx],
                });
                start = idx;
                current = Some(kind);
            }
            None => current = Some(kind),
        }
    }

    if let Some(kind) = current {
        runs.push(Run {
            kind,
            text: &word[start..],
        });
    }

    runs
}

/// Detaches the longest trailing postposition that leaves a long enough
/// stem.
fn split_josa(word: &str) -> (&str, Option<&str>) {
    let word_chars = word.chars().count();
    for josa in JOSA {
        if let Some(stem) = word.strip_suffix(josa) {
            if word_chars - josa.chars().count() >= MIN_STEM_CHARS {
                return (stem, Some(&word[stem.len()..]));
            }
        }
    }
    (word, None)
}

/// Korean token pipeline: morphemes, then length and stopword filters.
#[derive(Clone)]
pub struct KoreanTokenizer {
    analyzer: Option<Arc<dyn MorphAnalyzer>>,
    min_token_chars: usize,
}

impl fmt::Debug for KoreanTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KoreanTokenizer")
            .field("analyzer", &self.analyzer.is_some())
            .field("min_token_chars", &self.min_token_chars)
            .finish()
    }
}

impl KoreanTokenizer {
    /// Creates a tokenizer with an optional analyzer.
    pub fn new(analyzer: Option<Arc<dyn MorphAnalyzer>>, min_token_chars: usize) -> Self {
        Self {
            analyzer,
            min_token_chars,
        }
    }

    /// Tokenizes Korean text. Never fails.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let morphs = match &self.analyzer {
            Some(analyzer) => match analyzer.morphs(text) {
                Ok(morphs) => morphs,
                Err(e) => {
                    debug!(
                        target: "newsprep::tokenize",
                        "morph analyzer failed, splitting on whitespace: {}", e
                    );
                    whitespace_split(text)
                }
            },
            None => whitespace_split(text),
        };

        morphs
            .into_iter()
            .filter(|w| w.chars().count() >= self.min_token_chars && !is_korean_stopword(w))
            .collect()
    }
}

fn whitespace_split(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct BrokenAnalyzer;

    impl MorphAnalyzer for BrokenAnalyzer {
        fn morphs(&self, _text: &str) -> Result<Vec<String>> {
            Err(Error::Analyzer("JVM not available".into()))
        }
    }

    #[test]
    fn test_josa_detached() {
        let morphs = JosaSplitter.morphs("날씨가 학교에서는 정부의 발표").unwrap();
        assert_eq!(
            morphs,
            vec!["날씨", "가", "학교", "에서는", "정부", "의", "발표"]
        );
    }

    #[test]
    fn test_short_stem_kept_whole() {
        // Detaching would leave a one-syllable stem
        let morphs = JosaSplitter.morphs("나는 회의").unwrap();
        assert_eq!(morphs, vec!["나는", "회의"]);
    }

    #[test]
    fn test_script_runs_split() {
        let morphs = JosaSplitter.morphs("상ncelled되었습니다 AI기술 2024년").unwrap();
        assert_eq!(
            morphs,
            vec!["상", "ncelled", "되었습니다", "AI", "기술", "2024", "년"]
        );
    }

    #[test]
    fn test_tokenize_filters_length_and_stopwords() {
        let tokenizer = KoreanTokenizer::new(Some(Arc::new(JosaSplitter)), 2);
        let tokens = tokenizer.tokenize("그리고 우리는 정부가 발표한 것 등을 보았다");
        // "우리는" splits into the stopword "우리" and a one-syllable josa;
        // "등을" keeps its josa because "등" is too short to be a stem
        assert_eq!(tokens, vec!["정부", "발표한", "등을", "보았다"]);
    }

    #[test]
    fn test_without_analyzer_splits_on_whitespace() {
        let tokenizer = KoreanTokenizer::new(None, 2);
        let tokens = tokenizer.tokenize("오늘 날씨가 정말 좋고 수 그리고");
        assert_eq!(tokens, vec!["오늘", "날씨가", "정말", "좋고"]);
    }

    #[test]
    fn test_failing_analyzer_degrades() {
        let tokenizer = KoreanTokenizer::new(Some(Arc::new(BrokenAnalyzer)), 2);
        let tokens = tokenizer.tokenize("국회 본회의 에서 개최");
        assert_eq!(tokens, vec!["국회", "본회의", "개최"]);
    }
}
