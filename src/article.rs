//! Single-article web sources.

use crate::error::Result;
use crate::normalize::clean_text;
use crate::record::Record;
use crate::tokenize::Tokenizer;
use tracing::{info, warn};

/// Extracted text shorter than this (in chars) is replaced by
/// [`INSUFFICIENT_CONTENT`].
pub const MIN_ARTICLE_CHARS: usize = 50;

/// Placeholder text for pages with too little content.
pub const INSUFFICIENT_CONTENT: &str = "No sufficient content extracted from URL";

/// Fetches a web page and returns its visible text.
pub trait PageFetcher: Send + Sync {
    /// Returns the visible text of the page at `url`.
    fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Builds the record of one article from its extracted text.
///
/// No row thresholds apply: a single article always yields one record,
/// possibly with no tokens.
pub fn article_record(text: &str, tokenizer: &Tokenizer) -> Record {
    let extracted = text.trim();
    let content = if extracted.chars().count() < MIN_ARTICLE_CHARS {
        warn!(
            target: "newsprep::article",
            "extracted text is too short: {} characters",
            extracted.chars().count()
        );
        INSUFFICIENT_CONTENT.to_string()
    } else {
        extracted.to_string()
    };

    let content_clean = clean_text(&content);
    let tokens = tokenizer.tokenize_text(&content_clean);
    info!(
        target: "newsprep::article",
        "article preprocessed: {} characters, {} tokens",
        content.chars().count(),
        tokens.len()
    );

    Record {
        content,
        content_clean,
        tokens,
    }
}

/// Fetches `url` with `fetcher` and builds its record.
pub fn load_article(url: &str, fetcher: &dyn PageFetcher, tokenizer: &Tokenizer) -> Result<Record> {
    info!(target: "newsprep::article", "loading URL: {}", url);
    let text = fetcher.fetch_text(url)?;
    Ok(article_record(&text, tokenizer))
}

#[cfg(feature = "http")]
pub use http::{extract_text, HttpPageFetcher};

#[cfg(feature = "http")]
mod http {
    use super::PageFetcher;
    use crate::error::{Error, Result};
    use scraper::{ElementRef, Html};
    use std::time::Duration;

    /// Desktop browser User-Agent; several portals refuse unknown clients.
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    /// Elements whose text is never part of an article.
    const EXCLUDED_ELEMENTS: &[&str] = &[
        "script", "style", "nav", "header", "footer", "aside", "noscript",
    ];

    /// [`PageFetcher`] over a blocking `reqwest` client.
    #[derive(Debug, Clone)]
    pub struct HttpPageFetcher {
        client: reqwest::blocking::Client,
    }

    impl HttpPageFetcher {
        /// Creates a fetcher with a 15 second timeout.
        pub fn new() -> Result<Self> {
            Self::with_timeout(Duration::from_secs(15))
        }

        /// Creates a fetcher with a custom timeout.
        pub fn with_timeout(timeout: Duration) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(timeout)
                .build()?;
            Ok(Self { client })
        }
    }

    impl PageFetcher for HttpPageFetcher {
        fn fetch_text(&self, url: &str) -> Result<String> {
            let response = self.client.get(url).send()?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::Fetch(format!("{url} returned HTTP {status}")));
            }
            // Pages are decoded as UTF-8 whatever the declared charset
            let body = response.bytes()?;
            Ok(extract_text(&String::from_utf8_lossy(&body)))
        }
    }

    /// Returns the visible text of an HTML document.
    ///
    /// Text inside navigation, scripts and page chrome is dropped; the
    /// remaining text nodes are trimmed and joined by single spaces.
    pub fn extract_text(html: &str) -> String {
        let document = Html::parse_document(html);
        let mut pieces = Vec::new();
        collect_text(document.root_element(), &mut pieces);
        pieces.join(" ")
    }

    fn collect_text(element: ElementRef<'_>, pieces: &mut Vec<String>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    pieces.push(trimmed.to_string());
                }
            } else if let Some(child) = ElementRef::wrap(child) {
                if !EXCLUDED_ELEMENTS.contains(&child.value().name()) {
                    collect_text(child, pieces);
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_extract_text_skips_chrome() {
            let html = r#"<html><head><title>속보</title><style>p{color:red}</style></head>
                <body><header>메뉴</header><nav><a href="/">홈</a></nav>
                <article><h1>국회 본회의</h1><p>  예산안이   통과됐다. </p></article>
                <script>var x = 1;</script><footer>저작권</footer></body></html>"#;
            assert_eq!(extract_text(html), "속보 국회 본회의 예산안이   통과됐다.");
        }

        #[test]
        fn test_extract_text_empty_document() {
            assert_eq!(extract_text(""), "");
        }
    }
}
