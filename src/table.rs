//! In-memory CSV tables.
//!
//! Reading walks the encoding ladder; writing always produces UTF-8 with a
//! byte order mark so spreadsheet tools pick up Hangul correctly.

use crate::cell::RawCell;
use crate::encoding::{decode_with_ladder, EncodingAttempt, TextEncoding, UTF8_BOM};
use crate::error::{Error, Result};
use crate::record::Record;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A header row plus string fields, as read from a CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// A table together with how it was decoded.
#[derive(Debug, Clone)]
pub struct DecodedTable {
    /// The parsed table.
    pub table: Table,
    /// The encoding that succeeded.
    pub encoding: TextEncoding,
    /// Every attempt, the successful one last.
    pub attempts: Vec<EncodingAttempt>,
}

impl Table {
    /// Creates a table, padding short rows with empty fields.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width.max(row.len()), String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Parses CSV text.
    ///
    /// Fails on malformed quoting, on a missing header row, and on rows
    /// with more fields than the header. Short rows are padded.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| format!("failed to read header: {e}"))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err("no columns to parse".to_string());
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| format!("failed to parse row {}: {e}", idx + 1))?;
            if record.len() > width {
                return Err(format!(
                    "expected {} fields in row {}, saw {}",
                    width,
                    idx + 1,
                    record.len()
                ));
            }
            rows.push(record_to_row(&record, width));
        }

        Ok(Self { headers, rows })
    }

    /// Reads a CSV file, trying each encoding of `ladder` in order.
    ///
    /// `on_attempt` is notified after every attempt.
    pub fn read_with_ladder(
        path: impl AsRef<Path>,
        ladder: &[TextEncoding],
        on_attempt: impl FnMut(&EncodingAttempt),
    ) -> Result<DecodedTable> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;

        let outcome = decode_with_ladder(&bytes, ladder, |text| Table::parse(&text), on_attempt);
        match outcome.accepted {
            Some((encoding, table)) => Ok(DecodedTable {
                table,
                encoding,
                attempts: outcome.attempts,
            }),
            None => Err(Error::NoEncodingSucceeded {
                path: path.to_path_buf(),
                attempts: outcome.attempts,
            }),
        }
    }

    /// Reads a CSV file with the default ladder.
    pub fn read(path: impl AsRef<Path>) -> Result<DecodedTable> {
        Self::read_with_ladder(path, &TextEncoding::LADDER, |_| {})
    }

    /// Column names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Names from `names` that are not columns.
    pub fn missing_columns(&self, names: &[&str]) -> Vec<String> {
        names
            .iter()
            .filter(|n| self.column_index(n).is_none())
            .map(|n| n.to_string())
            .collect()
    }

    /// Field at `row`, `col`.
    pub fn field(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Cells of a column, classified from their raw fields.
    pub fn column_cells(&self, name: &str) -> Option<Vec<RawCell>> {
        let col = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| RawCell::from_field(row.get(col).map_or("", String::as_str)))
                .collect(),
        )
    }

    /// Adds a column or replaces an existing one.
    ///
    /// `values` shorter than the table leave empty fields.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        let col = match self.column_index(name) {
            Some(col) => col,
            None => {
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.push(String::new());
                }
                self.headers.len() - 1
            }
        };

        let mut values = values.into_iter();
        for row in &mut self.rows {
            row[col] = values.next().unwrap_or_default();
        }
    }

    /// Writes the table as UTF-8 CSV with a byte order mark.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let rows = self.rows.iter().map(|row| row.iter().map(String::as_str));
        write_bom_csv(path.as_ref(), self.headers.iter().map(String::as_str), rows)
    }
}

fn record_to_row(record: &StringRecord, width: usize) -> Vec<String> {
    let mut row: Vec<String> = record.iter().map(str::to_string).collect();
    row.resize(width, String::new());
    row
}

fn write_bom_csv<'a, H, R, F>(path: &Path, headers: H, rows: R) -> Result<()>
where
    H: IntoIterator<Item = &'a str>,
    R: IntoIterator<Item = F>,
    F: IntoIterator<Item = &'a str>,
{
    let mut file = BufWriter::new(fs::File::create(path)?);
    file.write_all(UTF8_BOM)?;

    let mut writer = WriterBuilder::new().flexible(true).from_writer(file);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Column names of a records file.
pub const RECORD_COLUMNS: [&str; 3] = ["content", "content_clean", "tokens"];

/// Writes records as UTF-8 CSV with a byte order mark.
///
/// `tokens` is written as a JSON array.
pub fn write_records(path: impl AsRef<Path>, records: &[Record]) -> Result<()> {
    let mut token_columns = Vec::with_capacity(records.len());
    for record in records {
        token_columns.push(serde_json::to_string(&record.tokens)?);
    }

    let rows = records.iter().zip(&token_columns).map(|(record, tokens)| {
        [
            record.content.as_str(),
            record.content_clean.as_str(),
            tokens.as_str(),
        ]
    });
    write_bom_csv(path.as_ref(), RECORD_COLUMNS, rows)
}

/// Reads a records file written by [`write_records`].
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let decoded = Table::read(path)?;
    let table = decoded.table;

    let missing = table.missing_columns(&RECORD_COLUMNS);
    if !missing.is_empty() {
        return Err(Error::MissingColumns(missing));
    }

    let (content, clean, tokens) = (
        table.column_index("content").unwrap_or_default(),
        table.column_index("content_clean").unwrap_or_default(),
        table.column_index("tokens").unwrap_or_default(),
    );

    table
        .rows()
        .iter()
        .map(|row| {
            Ok(Record {
                content: row[content].clone(),
                content_clean: row[clean].clone(),
                tokens: serde_json::from_str(&row[tokens])?,
            })
        })
        .collect()
}
