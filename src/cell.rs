//! Raw cell values and their classification.
//!
//! Every value read from a tabular source enters the pipeline as a
//! [`RawCell`] and is classified exactly once by [`RawCell::classify`]
//! before any text operation runs.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Tokens that pandas reads as NA by default. A CSV cell equal to one of
/// these (or empty) becomes [`RawCell::Missing`].
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Object reprs that leak into CSV files when an upstream producer stores
/// a function instead of calling it.
static RE_CALLABLE_REPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^<(?:function|bound method|built-in function|built-in method|method|lambda|functools\.partial)\b.*>$",
    )
    .unwrap()
});

/// An untyped value read from a tabular source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// Missing-value marker (empty cell, `NaN`, `NULL`, ...).
    Missing,
    /// Text content.
    Text(String),
    /// Numeric content.
    Number(f64),
    /// Bytes that could not be decoded as text.
    Bytes(Vec<u8>),
    /// A callable object stored where data was expected.
    Callable {
        /// Printable description of the object.
        repr: String,
    },
}

impl RawCell {
    /// Builds a cell from a CSV field.
    ///
    /// Exact missing markers map to [`RawCell::Missing`] and function reprs map to
    /// [`RawCell::Callable`]; every other field stays text.
    pub fn from_field(field: &str) -> Self {
        if MISSING_MARKERS.contains(&field) {
            return RawCell::Missing;
        }
        let trimmed = field.trim();
        if RE_CALLABLE_REPR.is_match(trimmed) {
            return RawCell::Callable {
                repr: trimmed.to_string(),
            };
        }
        RawCell::Text(field.to_string())
    }

    /// Creates a callable cell.
    pub fn callable(repr: impl Into<String>) -> Self {
        RawCell::Callable { repr: repr.into() }
    }

    /// Returns true for missing-value markers, including `NaN` numbers.
    pub fn is_missing(&self) -> bool {
        match self {
            RawCell::Missing => true,
            RawCell::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Returns true if the cell holds a callable object.
    pub fn is_callable(&self) -> bool {
        matches!(self, RawCell::Callable { .. })
    }

    /// Coerces the cell to text.
    ///
    /// Returns `None` for missing and callable cells. Undecodable bytes
    /// produce an `Err` with the decoding reason.
    pub fn coerce(&self) -> Option<Result<String, String>> {
        match self {
            RawCell::Missing | RawCell::Callable { .. } => None,
            RawCell::Number(n) if n.is_nan() => None,
            RawCell::Text(s) => Some(Ok(s.clone())),
            RawCell::Number(n) => Some(Ok(format_number(*n))),
            RawCell::Bytes(bytes) => Some(
                std::str::from_utf8(bytes)
                    .map(str::to_string)
                    .map_err(|e| e.to_string()),
            ),
        }
    }

    /// Classifies the cell against a minimum trimmed length (in chars).
    pub fn classify(&self, min_chars: usize) -> CellClass {
        if self.is_missing() {
            return CellClass::Missing;
        }
        if let RawCell::Callable { repr } = self {
            return CellClass::NonText(NonTextKind::Callable(repr.clone()));
        }

        match self.coerce() {
            None => CellClass::Missing,
            Some(Err(reason)) => CellClass::NonText(NonTextKind::Unconvertible(reason)),
            Some(Ok(text)) => {
                let trimmed = text.trim();
                if trimmed.chars().count() < min_chars {
                    CellClass::ShortText(trimmed.to_string())
                } else {
                    CellClass::UsableText(trimmed.to_string())
                }
            }
        }
    }
}

/// Formats numbers the way a dataframe prints them: integral floats keep
/// a trailing `.0`.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

impl fmt::Display for RawCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawCell::Missing => write!(f, "<missing>"),
            RawCell::Text(s) => write!(f, "{}", s),
            RawCell::Number(n) => write!(f, "{}", format_number(*n)),
            RawCell::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            RawCell::Callable { repr } => write!(f, "{}", repr),
        }
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        RawCell::Text(s.to_string())
    }
}

impl From<String> for RawCell {
    fn from(s: String) -> Self {
        RawCell::Text(s)
    }
}

impl From<f64> for RawCell {
    fn from(n: f64) -> Self {
        RawCell::Number(n)
    }
}

impl From<i64> for RawCell {
    fn from(n: i64) -> Self {
        RawCell::Number(n as f64)
    }
}

impl<T: Into<RawCell>> From<Option<T>> for RawCell {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawCell::Missing, Into::into)
    }
}

/// Closed classification of a [`RawCell`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellClass {
    /// Missing-value marker.
    Missing,
    /// Not text and not coercible to text.
    NonText(NonTextKind),
    /// Text shorter than the threshold (trimmed).
    ShortText(String),
    /// Text that meets the threshold (trimmed).
    UsableText(String),
}

impl CellClass {
    /// Returns the usable text, if any.
    pub fn usable(self) -> Option<String> {
        match self {
            CellClass::UsableText(text) => Some(text),
            _ => None,
        }
    }
}

/// Why a cell is not text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonTextKind {
    /// A callable object (data-quality bug in the producer).
    Callable(String),
    /// A value whose string coercion failed.
    Unconvertible(String),
}
