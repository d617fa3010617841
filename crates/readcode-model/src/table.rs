#![deny(unsafe_code)]

use crate::code::Coding;
use crate::error::TableError;

/// Name of the column appended to every labeled table.
pub const CODING_COLUMN: &str = "coding";

/// How a source cell was typed. The cell text is always its display form;
/// typed writers use the kind to encode it natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellKind {
    #[default]
    Text,
    Number,
    Bool,
    DateTime,
}

/// One source row. Cells follow the table's header order; an empty cell is
/// a missing value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub cells: Vec<String>,
    /// Empty when every cell is text, otherwise one kind per cell.
    kinds: Vec<CellKind>,
}

impl Record {
    pub fn new(cells: Vec<String>) -> Self {
        Self {
            cells,
            kinds: Vec::new(),
        }
    }

    /// Record with a kind per cell. Missing kinds are text and extra kinds
    /// are dropped.
    pub fn with_kinds(cells: Vec<String>, mut kinds: Vec<CellKind>) -> Self {
        if kinds.iter().all(|kind| *kind == CellKind::Text) {
            kinds.clear();
        } else {
            kinds.resize(cells.len(), CellKind::Text);
        }
        Self { cells, kinds }
    }

    /// Cell at `index`, or an empty string when the row is short.
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn kind(&self, index: usize) -> CellKind {
        self.kinds.get(index).copied().unwrap_or_default()
    }
}

impl<S: Into<String>> FromIterator<S> for Record {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// A loaded table of free-text records with one designated text column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub text_column: usize,
    pub records: Vec<Record>,
}

impl SourceTable {
    /// Build a table, checking that the text column exists and every record
    /// has exactly one cell per header.
    pub fn new(
        headers: Vec<String>,
        text_column: usize,
        records: Vec<Record>,
    ) -> Result<Self, TableError> {
        if headers.is_empty() {
            return Err(TableError::NoColumns);
        }
        if text_column >= headers.len() {
            return Err(TableError::TextColumnOutOfRange {
                index: text_column,
                columns: headers.len(),
            });
        }
        for (row, record) in records.iter().enumerate() {
            if record.cells.len() != headers.len() {
                return Err(TableError::RowWidth {
                    row,
                    expected: headers.len(),
                    actual: record.cells.len(),
                });
            }
        }
        Ok(Self {
            headers,
            text_column,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn text_header(&self) -> &str {
        self.headers
            .get(self.text_column)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Primary text of record `row`; empty when the cell is missing.
    pub fn text(&self, row: usize) -> &str {
        self.records
            .get(row)
            .map(|record| record.cell(self.text_column))
            .unwrap_or("")
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.records
            .iter()
            .map(move |record| record.cell(self.text_column))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

/// A source table with one coding per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledTable {
    pub source: SourceTable,
    pub codings: Vec<Coding>,
}

impl LabeledTable {
    /// Source headers followed by the coding column.
    pub fn headers(&self) -> Vec<&str> {
        self.source
            .headers
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(CODING_COLUMN))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Record, Coding)> + '_ {
        self.source
            .records
            .iter()
            .zip(self.codings.iter().copied())
    }

    pub fn unset_count(&self) -> usize {
        self.codings.iter().filter(|coding| coding.is_unset()).count()
    }
}
