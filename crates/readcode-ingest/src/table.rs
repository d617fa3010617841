//! Shared assembly of raw rows into a [`SourceTable`].

use std::path::Path;

use tracing::{debug, warn};

use readcode_model::{CODING_COLUMN, CellKind, Record, SourceTable};

use crate::error::{IngestError, Result};

/// Options shared by every source loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOptions {
    /// Header of the column to match against. Defaults to the first column.
    pub text_column: Option<String>,
}

impl SourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_column(mut self, column: Option<String>) -> Self {
        self.text_column = column;
        self
    }
}

/// One raw cell: display text plus the type its source gave it.
pub(crate) type RawCell = (String, CellKind);

/// A loaded table plus what the loader changed on the way in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoad {
    pub table: SourceTable,
    /// The source had a `coding` column, which was discarded.
    pub dropped_coding_column: bool,
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').to_string()
}

fn is_blank_row(row: &[RawCell]) -> bool {
    row.iter().all(|(value, _)| value.trim().is_empty())
}

/// Build a table from raw rows: the first non-blank row is the header.
///
/// Blank rows before the header are skipped; after it every row is a
/// record. A pre-existing `coding` column is dropped so the labeled output
/// carries exactly one. Cell values are kept verbatim; short rows are
/// padded with missing cells and cells beyond the header width are
/// discarded.
pub(crate) fn assemble(
    path: &Path,
    raw_rows: Vec<Vec<RawCell>>,
    options: &SourceOptions,
) -> Result<SourceLoad> {
    let mut rows = raw_rows.into_iter().skip_while(|row| is_blank_row(row));
    let Some(header_row) = rows.next() else {
        return Err(IngestError::MissingHeader {
            path: path.to_path_buf(),
        });
    };
    let all_headers: Vec<String> = header_row
        .iter()
        .map(|(value, _)| normalize_header(value))
        .collect();

    let keep: Vec<usize> = all_headers
        .iter()
        .enumerate()
        .filter(|(_, header)| header.as_str() != CODING_COLUMN)
        .map(|(idx, _)| idx)
        .collect();
    let dropped_coding_column = keep.len() != all_headers.len();
    if dropped_coding_column {
        warn!(
            path = %path.display(),
            "source already has a `{CODING_COLUMN}` column; its values are discarded"
        );
    }
    let headers: Vec<String> = keep.iter().map(|&idx| all_headers[idx].clone()).collect();

    let text_column = match options.text_column.as_deref() {
        None => 0,
        Some(name) => headers
            .iter()
            .position(|header| header.trim() == name.trim())
            .ok_or_else(|| IngestError::UnknownTextColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
                available: headers.join(", "),
            })?,
    };

    let mut truncated = 0usize;
    let records: Vec<Record> = rows
        .map(|row| {
            if row.len() > all_headers.len() {
                truncated += 1;
            }
            let (cells, kinds): (Vec<String>, Vec<CellKind>) = keep
                .iter()
                .map(|&idx| row.get(idx).cloned().unwrap_or_default())
                .unzip();
            Record::with_kinds(cells, kinds)
        })
        .collect();
    if truncated > 0 {
        debug!(
            path = %path.display(),
            rows = truncated,
            "cells beyond the header width were discarded"
        );
    }

    let table = SourceTable::new(headers, text_column, records).map_err(|source| {
        IngestError::Table {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(SourceLoad {
        table,
        dropped_coding_column,
    })
}
