//! Preprocessed records and per-row outcomes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A preprocessed text unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Original text, trimmed.
    pub content: String,
    /// Normalized text.
    pub content_clean: String,
    /// Tokens of the normalized text.
    pub tokens: Vec<String>,
}

/// What happened to one input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    /// The row produced a record.
    Accepted {
        /// Number of tokens in the record.
        tokens: usize,
    },
    /// The row was skipped.
    Rejected {
        /// Why the row was skipped.
        reason: RejectReason,
    },
}

/// Why a row was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// Missing-value marker.
    Missing,
    /// A callable object instead of data.
    Callable {
        /// Printable description of the object.
        repr: String,
    },
    /// The value could not be converted to text.
    Unconvertible {
        /// Conversion error.
        reason: String,
    },
    /// Trimmed text below the minimum length.
    TooShort {
        /// Trimmed length in chars.
        chars: usize,
    },
    /// Nothing left after normalization.
    EmptyAfterCleaning,
    /// Fewer tokens than required.
    InsufficientTokens {
        /// Number of tokens produced.
        count: usize,
    },
}

impl RejectReason {
    /// Returns true for data-quality defects in the producer.
    pub fn is_data_quality(&self) -> bool {
        matches!(self, RejectReason::Callable { .. })
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Missing => write!(f, "missing value"),
            RejectReason::Callable { repr } => write!(f, "callable object: {}", repr),
            RejectReason::Unconvertible { reason } => write!(f, "cannot convert to text: {}", reason),
            RejectReason::TooShort { chars } => write!(f, "too short ({} chars)", chars),
            RejectReason::EmptyAfterCleaning => write!(f, "empty after cleaning"),
            RejectReason::InsufficientTokens { count } => {
                write!(f, "insufficient tokens ({})", count)
            }
        }
    }
}

/// Removes records whose `content_clean` was already seen.
///
/// The first occurrence wins and order is kept. Returns the number of
/// records removed.
pub fn dedup_by_clean(records: &mut Vec<Record>) -> usize {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    records.retain(|r| seen.insert(r.content_clean.clone()));
    before - records.len()
}
