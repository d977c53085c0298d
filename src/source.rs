//! Source dispatch: CSV files and article URLs.

use crate::article::{load_article, PageFetcher};
use crate::error::{Error, Result};
use crate::loader::CsvLoader;
use crate::observer::{RowObserver, TracingReporter};
use crate::record::Record;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// A preprocessing source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A CSV file.
    Csv(PathBuf),
    /// A single web article.
    Url(String),
}

impl Source {
    /// Classifies a source string.
    ///
    /// A `.csv` suffix (any case) wins over an `http://` or `https://`
    /// prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSource`] for anything else.
    pub fn parse(source: &str) -> Result<Self> {
        if has_csv_suffix(source) {
            Ok(Source::Csv(PathBuf::from(source)))
        } else if source.starts_with("http://") || source.starts_with("https://") {
            Ok(Source::Url(source.to_string()))
        } else {
            Err(Error::UnsupportedSource(source.to_string()))
        }
    }
}

fn has_csv_suffix(source: &str) -> bool {
    source.len() >= 4
        && source.is_char_boundary(source.len() - 4)
        && source[source.len() - 4..].eq_ignore_ascii_case(".csv")
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Csv(path) => write!(f, "{}", path.display()),
            Source::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Preprocesses sources of either kind.
#[derive(Clone)]
pub struct Pipeline {
    loader: CsvLoader,
    fetcher: Option<Arc<dyn PageFetcher>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("loader", &self.loader)
            .field("fetcher", &self.fetcher.is_some())
            .finish()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(CsvLoader::default())
    }
}

impl Pipeline {
    /// Creates a pipeline with the default page fetcher, if available.
    pub fn new(loader: CsvLoader) -> Self {
        Self {
            loader,
            fetcher: default_fetcher(),
        }
    }

    /// Sets the page fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Removes the page fetcher; URL sources then fail.
    pub fn without_fetcher(mut self) -> Self {
        self.fetcher = None;
        self
    }

    /// Returns the CSV loader.
    pub fn loader(&self) -> &CsvLoader {
        &self.loader
    }

    /// Preprocesses one source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSource`] for unrecognized sources, and
    /// the loader or fetcher error otherwise.
    pub fn load(&self, source: &str) -> Result<Vec<Record>> {
        self.load_with_observer(source, &mut TracingReporter)
    }

    /// Preprocesses one source, reporting CSV row events to `observer`.
    pub fn load_with_observer(
        &self,
        source: &str,
        observer: &mut dyn RowObserver,
    ) -> Result<Vec<Record>> {
        match Source::parse(source)? {
            Source::Csv(path) => {
                let (records, _) = self.loader.load_with_report(&path, observer)?;
                Ok(records)
            }
            Source::Url(url) => {
                let fetcher = self
                    .fetcher
                    .as_deref()
                    .ok_or_else(|| Error::Fetch("no page fetcher configured".to_string()))?;
                let record = load_article(&url, fetcher, self.loader.tokenizer())?;
                Ok(vec![record])
            }
        }
    }

    /// Preprocesses every source in order and concatenates the records.
    ///
    /// A failing source is logged and skipped.
    pub fn load_all<S: AsRef<str>>(&self, sources: &[S]) -> Vec<Record> {
        self.load_all_with_observer(sources, &mut TracingReporter)
    }

    /// Like [`load_all`](Self::load_all), reporting to `observer`.
    pub fn load_all_with_observer<S: AsRef<str>>(
        &self,
        sources: &[S],
        observer: &mut dyn RowObserver,
    ) -> Vec<Record> {
        let mut records = Vec::new();
        let mut failed = 0;

        for source in sources {
            let source = source.as_ref();
            match self.load_with_observer(source, observer) {
                Ok(batch) => records.extend(batch),
                Err(e) => {
                    failed += 1;
                    warn!(target: "newsprep::source", "failed to process source '{}': {}", source, e);
                }
            }
        }

        info!(
            target: "newsprep::source",
            "{} sources processed ({} failed), {} records",
            sources.len(),
            failed,
            records.len()
        );
        records
    }
}

#[cfg(feature = "http")]
fn default_fetcher() -> Option<Arc<dyn PageFetcher>> {
    match crate::article::HttpPageFetcher::new() {
        Ok(fetcher) => Some(Arc::new(fetcher)),
        Err(e) => {
            warn!(target: "newsprep::source", "HTTP client unavailable: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "http"))]
fn default_fetcher() -> Option<Arc<dyn PageFetcher>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::PreprocessOptions;
    use crate::tokenize::Capabilities;
    use std::fs;
    use tempfile::tempdir;

    struct StaticPage;

    impl PageFetcher for StaticPage {
        fn fetch_text(&self, _url: &str) -> Result<String> {
            Ok("The central bank raised interest rates again this morning, \
                officials confirmed after the meeting."
                .to_string())
        }
    }

    fn pipeline() -> Pipeline {
        let loader = CsvLoader::new(
            PreprocessOptions::default(),
            Capabilities::builtin().without_language_identifier(),
        );
        Pipeline::new(loader).with_fetcher(Arc::new(StaticPage))
    }

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            Source::parse("data/news.csv").unwrap(),
            Source::Csv(PathBuf::from("data/news.csv"))
        );
        assert_eq!(
            Source::parse("NEWS.CSV").unwrap(),
            Source::Csv(PathBuf::from("NEWS.CSV"))
        );
        assert_eq!(
            Source::parse("https://n.news.naver.com/article/1").unwrap(),
            Source::Url("https://n.news.naver.com/article/1".into())
        );
        // Suffix is checked first
        assert_eq!(
            Source::parse("https://example.com/export.csv").unwrap(),
            Source::Csv(PathBuf::from("https://example.com/export.csv"))
        );
    }

    #[test]
    fn test_unsupported_source() {
        for source in ["ftp://example.com/file", "notes.txt", "", "기사.xlsx"] {
            assert!(matches!(
                Source::parse(source),
                Err(Error::UnsupportedSource(_))
            ));
        }
        assert!(matches!(
            pipeline().load("report.pdf"),
            Err(Error::UnsupportedSource(_))
        ));
    }

    #[test]
    fn test_url_source_yields_one_record() {
        let records = pipeline().load("https://news.example.com/economy/1").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].tokens.contains(&"bank".to_string()));
    }

    #[test]
    fn test_url_without_fetcher() {
        let err = pipeline().without_fetcher().load("https://a.b/c").unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }

    #[test]
    fn test_load_all_skips_failures() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("news.csv");
        fs::write(
            &csv,
            "content\n정부가 내년도 예산안을 오늘 발표했습니다\n국회가 예산안 심사를 시작합니다\n",
        )
        .unwrap();
        let missing = dir.path().join("missing.csv");

        let sources = vec![
            csv.display().to_string(),
            "unknown-source".to_string(),
            missing.display().to_string(),
            "https://news.example.com/2".to_string(),
        ];
        let records = pipeline().load_all(&sources);
        assert_eq!(records.len(), 3);
        assert!(records[0].content.starts_with("정부가"));
        assert!(records[2].content.starts_with("The central bank"));
    }
}
