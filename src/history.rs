// Seelevel - Segment decoding workbench
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! History export reader
//!
//! Reads the CSV produced by the History tab of Home Assistant: a header
//! `entity_id,state,last_changed` followed by one row per state change.
//! The header is checked strictly; malformed rows are reported and skipped.

use std::io::Read;
use std::path::Path;

use crate::error::{Result, RowError, RowIssue, SeelevelError};
use crate::record::{ParsedRecord, RecordParser};

/// Column names expected in the header row
pub const EXPECTED_HEADER: [&str; 3] = ["entity_id", "state", "last_changed"];

/// Records read from a history file
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Parsed rows in input order
    pub records: Vec<ParsedRecord>,
    /// Rows that were skipped
    pub issues: Vec<RowIssue>,
    /// Data rows read, including skipped ones
    pub rows_read: usize,
}

/// Reads history exports
#[derive(Debug, Clone, Copy)]
pub struct HistoryReader {
    parser: RecordParser,
}

impl HistoryReader {
    pub fn new(parser: RecordParser) -> Self {
        Self { parser }
    }

    /// Read a history file from disk
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<History> {
        let file = std::fs::File::open(path)?;
        self.read(file)
    }

    /// Read a history export from any reader
    pub fn read<R: Read>(&self, input: R) -> Result<History> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);
        let mut records = reader.records();

        let header = match records.next() {
            Some(header) => header?,
            None => {
                return Err(SeelevelError::Format(
                    "Empty input, is this actually a history.csv file?".to_string(),
                ))
            }
        };
        if header.iter().ne(EXPECTED_HEADER.iter().copied()) {
            return Err(SeelevelError::Format(format!(
                "Did not find expected header '{}', found '{}'. Is this actually a history.csv file?",
                EXPECTED_HEADER.join(","),
                header.iter().collect::<Vec<_>>().join(",")
            )));
        }

        let mut history = History::default();
        for result in records {
            let record = match result {
                Ok(record) => record,
                Err(err) => {
                    let issue = row_decode_issue(err)?;
                    history.rows_read += 1;
                    tracing::warn!("skipping undecodable row, {}", issue);
                    history.issues.push(issue);
                    continue;
                }
            };
            history.rows_read += 1;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let fields: Vec<&str> = record.iter().collect();

            match self.parser.parse(&fields) {
                Ok(parsed) => history.records.push(parsed),
                Err(error) => {
                    let issue = RowIssue { line, error };
                    tracing::warn!(row = ?fields, "skipping malformed row, {}", issue);
                    history.issues.push(issue);
                }
            }
        }

        tracing::debug!(
            rows = history.rows_read,
            records = history.records.len(),
            skipped = history.issues.len(),
            "history read"
        );
        Ok(history)
    }
}

/// Turn a row the CSV reader could not decode into a skip, keeping I/O
/// failures fatal
fn row_decode_issue(err: csv::Error) -> Result<RowIssue> {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let detail = match err.kind() {
        csv::ErrorKind::Utf8 { err, .. } => err.to_string(),
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => {
            format!("expected {} fields, found {}", expected_len, len)
        }
        _ => return Err(err.into()),
    };
    Ok(RowIssue {
        line,
        error: RowError::Encoding { detail },
    })
}
