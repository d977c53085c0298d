//! Multi-encoding CSV loading and the per-row pipeline.
//!
//! Each row goes through the same checks, in order:
//!
//! 1. classify the cell (missing, non-text, too short)
//! 2. normalize it with [`clean_text`]
//! 3. tokenize the normalized text
//! 4. require a minimum token count
//!
//! A failing row is reported to the [`RowObserver`] and skipped. After the
//! last row, records with an already-seen `content_clean` are dropped.

use crate::cell::{CellClass, NonTextKind, RawCell};
use crate::encoding::{EncodingAttempt, TextEncoding};
use crate::error::Result;
use crate::normalize::clean_text;
use crate::observer::{RowObserver, TracingReporter};
use crate::record::{dedup_by_clean, Record, RejectReason, RowOutcome};
use crate::table::Table;
use crate::tokenize::{Capabilities, Tokenizer, DEFAULT_MIN_INPUT_CHARS, DEFAULT_MIN_TOKEN_CHARS};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Options for preprocessing tabular sources.
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Column holding the text.
    pub text_column: String,

    /// Minimum trimmed length of a row's text, in chars.
    pub min_content_chars: usize,

    /// Minimum number of tokens for a row to be kept.
    pub min_tokens: usize,

    /// Minimum trimmed length the tokenizer accepts, in chars.
    pub min_tokenize_chars: usize,

    /// Minimum token length, in chars.
    pub min_token_chars: usize,

    /// Encodings tried in order.
    pub encodings: Vec<TextEncoding>,

    /// Whether to process rows in parallel.
    pub parallel: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            text_column: "content".to_string(),
            min_content_chars: 5,
            min_tokens: 3,
            min_tokenize_chars: DEFAULT_MIN_INPUT_CHARS,
            min_token_chars: DEFAULT_MIN_TOKEN_CHARS,
            encodings: TextEncoding::LADDER.to_vec(),
            parallel: false,
        }
    }
}

impl PreprocessOptions {
    /// Creates new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only substantial articles (20+ chars, 5+ tokens).
    pub fn strict() -> Self {
        Self {
            min_content_chars: 20,
            min_tokens: 5,
            ..Self::default()
        }
    }

    /// Keeps any row that yields at least one token.
    pub fn lenient() -> Self {
        Self {
            min_content_chars: 1,
            min_tokens: 1,
            ..Self::default()
        }
    }

    /// Sets the text column.
    pub fn with_text_column(mut self, column: impl Into<String>) -> Self {
        self.text_column = column.into();
        self
    }

    /// Sets the minimum text length.
    pub fn with_min_content_chars(mut self, chars: usize) -> Self {
        self.min_content_chars = chars;
        self
    }

    /// Sets the minimum token count.
    pub fn with_min_tokens(mut self, tokens: usize) -> Self {
        self.min_tokens = tokens;
        self
    }

    /// Sets the minimum token length.
    pub fn with_min_token_chars(mut self, chars: usize) -> Self {
        self.min_token_chars = chars;
        self
    }

    /// Replaces the encoding ladder.
    pub fn with_encodings(mut self, encodings: impl Into<Vec<TextEncoding>>) -> Self {
        self.encodings = encodings.into();
        self
    }

    /// Enables parallel row processing.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    /// Disables parallel row processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Per-row counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowStats {
    /// Rows read.
    pub rows: usize,
    /// Rows that produced a record.
    pub accepted: usize,
    /// Rows skipped.
    pub rejected: usize,
    /// Skipped rows that held a callable object.
    pub data_quality: usize,
    /// Accepted rows dropped as duplicates.
    pub duplicates_removed: usize,
}

/// Summary of one CSV load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// File that was loaded.
    pub source: PathBuf,
    /// Encoding that succeeded.
    pub encoding: TextEncoding,
    /// Every encoding attempt.
    pub attempts: Vec<EncodingAttempt>,
    /// Whether the text column was present.
    pub text_column_found: bool,
    /// Rows read.
    pub rows: usize,
    /// Rows that produced a record.
    pub accepted: usize,
    /// Rows skipped.
    pub rejected: usize,
    /// Skipped rows that held a callable object.
    pub data_quality: usize,
    /// Accepted rows dropped as duplicates.
    pub duplicates_removed: usize,
    /// Records returned.
    pub records: usize,
}

/// Loads CSV files into [`Record`]s.
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    options: PreprocessOptions,
    tokenizer: Tokenizer,
}

impl CsvLoader {
    /// Creates a loader.
    pub fn new(options: PreprocessOptions, capabilities: Capabilities) -> Self {
        let tokenizer = Tokenizer::with_thresholds(
            capabilities,
            options.min_tokenize_chars,
            options.min_token_chars,
        );
        Self { options, tokenizer }
    }

    /// Creates a loader with the bundled analyzers.
    pub fn with_options(options: PreprocessOptions) -> Self {
        Self::new(options, Capabilities::builtin())
    }

    /// Returns the options.
    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Returns the tokenizer.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Loads a CSV file, logging through `tracing`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read and
    /// [`Error::NoEncodingSucceeded`](crate::Error::NoEncodingSucceeded) if
    /// no encoding of the ladder produces a parsable table.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<Record>> {
        let (records, _) = self.load_with_report(path, &mut TracingReporter)?;
        Ok(records)
    }

    /// Loads a CSV file, reporting every event to `observer`.
    pub fn load_with_report(
        &self,
        path: impl AsRef<Path>,
        observer: &mut dyn RowObserver,
    ) -> Result<(Vec<Record>, LoadReport)> {
        let path = path.as_ref();
        let decoded = Table::read_with_ladder(path, &self.options.encodings, |attempt| {
            observer.on_encoding_attempt(path, attempt)
        })?;
        let table = decoded.table;

        let column = &self.options.text_column;
        let (cells, text_column_found) = match table.column_cells(column) {
            Some(cells) => (cells, true),
            None => {
                warn!(
                    target: "newsprep::loader",
                    "no '{}' column in {}; available columns: {:?}",
                    column,
                    path.display(),
                    table.headers()
                );
                (vec![RawCell::Text(String::new()); table.len()], false)
            }
        };

        observer.on_rows_ready(cells.len());
        let (records, stats) = self.process_cells(&cells, observer);

        let report = LoadReport {
            source: path.to_path_buf(),
            encoding: decoded.encoding,
            attempts: decoded.attempts,
            text_column_found,
            rows: stats.rows,
            accepted: stats.accepted,
            rejected: stats.rejected,
            data_quality: stats.data_quality,
            duplicates_removed: stats.duplicates_removed,
            records: records.len(),
        };
        observer.on_load_finished(&report);

        Ok((records, report))
    }

    /// Runs the row pipeline over in-memory cells.
    ///
    /// Row work runs in parallel when enabled; observer calls and
    /// deduplication always happen afterwards, in row order.
    pub fn process_cells(
        &self,
        cells: &[RawCell],
        observer: &mut dyn RowObserver,
    ) -> (Vec<Record>, RowStats) {
        let results: Vec<std::result::Result<Record, RejectReason>> = if self.options.parallel {
            cells.par_iter().map(|cell| self.process_row(cell)).collect()
        } else {
            cells.iter().map(|cell| self.process_row(cell)).collect()
        };

        let mut stats = RowStats {
            rows: cells.len(),
            ..RowStats::default()
        };
        let mut records = Vec::new();

        for (row, result) in results.into_iter().enumerate() {
            match result {
                Ok(record) => {
                    observer.on_row_processed(
                        row,
                        &RowOutcome::Accepted {
                            tokens: record.tokens.len(),
                        },
                    );
                    stats.accepted += 1;
                    records.push(record);
                }
                Err(reason) => {
                    if reason.is_data_quality() {
                        stats.data_quality += 1;
                    }
                    stats.rejected += 1;
                    observer.on_row_processed(row, &RowOutcome::Rejected { reason });
                }
            }
        }

        stats.duplicates_removed = dedup_by_clean(&mut records);
        (records, stats)
    }

    /// Processes one cell.
    pub fn process_row(&self, cell: &RawCell) -> std::result::Result<Record, RejectReason> {
        let content = match cell.classify(self.options.min_content_chars) {
            CellClass::UsableText(text) => text,
            CellClass::Missing => return Err(RejectReason::Missing),
            CellClass::NonText(NonTextKind::Callable(repr)) => {
                return Err(RejectReason::Callable { repr })
            }
            CellClass::NonText(NonTextKind::Unconvertible(reason)) => {
                return Err(RejectReason::Unconvertible { reason })
            }
            CellClass::ShortText(text) => {
                return Err(RejectReason::TooShort {
                    chars: text.chars().count(),
                })
            }
        };

        let content_clean = clean_text(&content);
        if content_clean.is_empty() {
            return Err(RejectReason::EmptyAfterCleaning);
        }

        let tokens = self.tokenizer.tokenize_text(&content_clean);
        if tokens.len() < self.options.min_tokens {
            return Err(RejectReason::InsufficientTokens {
                count: tokens.len(),
            });
        }

        Ok(Record {
            content,
            content_clean,
            tokens,
        })
    }
}
