//! # newsprep
//!
//! Preprocessing for Korean and English news text: CSV files in unknown
//! legacy encodings and single web articles become cleaned, tokenized
//! records ready for downstream NLP.
//!
//! ## Pipeline
//!
//! - **Loading**: CSV files are decoded through an encoding ladder
//!   (UTF-8 with BOM, UTF-8, CP949, EUC-KR, Latin-1)
//! - **Cleaning**: NFC normalization, URL removal, and a whitelist of
//!   Hangul, Latin letters and digits
//! - **Tokenizing**: per-row language detection, then Korean morpheme or
//!   English lemma tokens with stopwords removed
//! - **Filtering**: rows that are missing, non-text, too short or too
//!   sparse are dropped, and duplicates are removed
//!
//! ## Quick Start
//!
//! ```no_run
//! use newsprep::{load_and_preprocess, write_records};
//!
//! fn main() -> newsprep::Result<()> {
//!     let records = load_and_preprocess("news.csv")?;
//!     println!("{} records", records.len());
//!
//!     write_records("news_preprocessed.csv", &records)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `langdetect` (default): statistical language identification via `whatlang`
//! - `http` (default): web article fetching and the chat completion summarizer

pub mod article;
pub mod cell;
pub mod encoding;
pub mod error;
pub mod evaluate;
pub mod lang;
pub mod loader;
pub mod normalize;
pub mod observer;
pub mod record;
pub mod source;
pub mod summarize;
pub mod table;
pub mod tokenize;

// Re-exports
pub use article::{load_article, PageFetcher};
pub use cell::{CellClass, NonTextKind, RawCell};
pub use encoding::{EncodingAttempt, TextEncoding};
pub use error::{Error, Result};
pub use evaluate::{evaluate_csv, RougeScorer, RougeScores, Score};
pub use lang::{Language, LanguageDetector, LanguageIdentifier};
pub use loader::{CsvLoader, LoadReport, PreprocessOptions};
pub use normalize::{clean, clean_text};
pub use observer::{CollectingObserver, NullObserver, RowObserver, TracingReporter};
pub use record::{Record, RejectReason, RowOutcome};
pub use source::{Pipeline, Source};
pub use summarize::{RetryPolicy, Summarizer, SummarizerConfig, SummaryJob, UsageMonitor};
pub use table::{read_records, write_records, Table};
pub use tokenize::{Capabilities, Lemmatizer, MorphAnalyzer, Tokenizer};

#[cfg(feature = "http")]
pub use article::HttpPageFetcher;

#[cfg(feature = "http")]
pub use summarize::ChatCompletionSummarizer;

/// Preprocesses one source with default options.
///
/// `source` is either a path ending in `.csv` or an `http(s)://` URL.
///
/// # Example
///
/// ```no_run
/// use newsprep::load_and_preprocess;
///
/// let records = load_and_preprocess("https://news.example.com/article/1")?;
/// println!("{:?}", records[0].tokens);
/// # Ok::<(), newsprep::Error>(())
/// ```
pub fn load_and_preprocess(source: &str) -> Result<Vec<Record>> {
    Pipeline::default().load(source)
}

/// Preprocesses several sources with default options.
///
/// Failing sources are logged and skipped; the records of the others are
/// concatenated in source order.
pub fn load_and_preprocess_all<S: AsRef<str>>(sources: &[S]) -> Vec<Record> {
    Pipeline::default().load_all(sources)
}

/// Tokenizes one raw cell with the built-in capabilities.
pub fn tokenize_and_normalize(raw: &RawCell) -> Vec<String> {
    Tokenizer::default().tokenize_and_normalize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_and_preprocess_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("news.csv");
        fs::write(
            &path,
            "content\n정부가 내년도 예산안을 오늘 발표했습니다\n\n정부가 내년도 예산안을 오늘 발표했습니다\n",
        )
        .unwrap();

        let records = load_and_preprocess(&path.display().to_string()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content_clean, "정부가 내년도 예산안을 오늘 발표했습니다");
    }

    #[test]
    fn test_load_and_preprocess_unsupported() {
        assert!(matches!(
            load_and_preprocess("archive.zip"),
            Err(Error::UnsupportedSource(_))
        ));
    }

    #[test]
    fn test_load_and_preprocess_all_skips_failures() {
        let records = load_and_preprocess_all(&["missing.txt", "nonexistent-dir/none.csv"]);
        assert!(records.is_empty());
    }

    #[test]
    fn test_tokenize_and_normalize_edge_cells() {
        assert!(tokenize_and_normalize(&RawCell::Missing).is_empty());
        assert!(tokenize_and_normalize(&RawCell::Text("ab".into())).is_empty());
        assert!(tokenize_and_normalize(&RawCell::callable("<function f>")).is_empty());
    }

    #[test]
    fn test_preprocess_options_presets() {
        let default = PreprocessOptions::default();
        assert_eq!(default.text_column, "content");
        assert_eq!(default.min_content_chars, 5);
        assert_eq!(default.min_tokens, 3);

        let strict = PreprocessOptions::strict();
        assert!(strict.min_content_chars > default.min_content_chars);
        assert!(strict.min_tokens > default.min_tokens);

        let lenient = PreprocessOptions::lenient();
        assert_eq!(lenient.min_tokens, 1);
    }
}
