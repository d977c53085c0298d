//! Error types for newsprep library.

use crate::encoding::EncodingAttempt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for newsprep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for newsprep library.
///
/// Only source-level failures surface as an `Error`. Row-level problems
/// (bad cells, short text, tokenizer hiccups) are reported through
/// [`RowObserver`](crate::observer::RowObserver) and never abort a batch.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Every encoding in the ladder failed to decode or parse the file.
    #[error("no encoding succeeded for {}: tried {}", .path.display(), format_attempts(.attempts))]
    NoEncodingSucceeded {
        path: PathBuf,
        attempts: Vec<EncodingAttempt>,
    },

    /// The source is neither a tabular file nor a web resource.
    #[error("Unsupported source: {0} (expected a .csv path or an http(s) URL)")]
    UnsupportedSource(String),

    /// Required columns are absent from a tabular input.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// CSV parsing or writing error.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Text encoding error.
    #[error("Text encoding error: {0}")]
    Encoding(String),

    /// An injected analyzer (language identifier, morpheme splitter,
    /// lemmatizer) could not handle its input.
    #[error("Analyzer error: {0}")]
    Analyzer(String),

    /// Fetching a web resource failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The summarization endpoint returned an error.
    #[error("API error{}: {}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default(), .message)]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn format_attempts(attempts: &[EncodingAttempt]) -> String {
    attempts
        .iter()
        .map(|a| a.encoding.name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => Error::Io(io_err),
            _ => Error::Csv(message),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Fetch(err.to_string())
    }
}
