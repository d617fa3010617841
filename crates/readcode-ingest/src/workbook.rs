//! XLSX source loading via `calamine`.
//!
//! Only the first worksheet is read. Its first non-blank row is the header,
//! as for CSV sources. Cells are converted to text the way a spreadsheet
//! shows them: whole floats lose their fractional part, dates render as
//! `YYYY-MM-DD HH:MM:SS`. Numbers, booleans and dates keep their
//! [`CellKind`] so an XLSX export writes them back typed.

use std::io::{Read, Seek};
use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};

use readcode_model::{CellKind, SourceTable};

use crate::error::{IngestError, Result};
use crate::table::{RawCell, SourceLoad, SourceOptions, assemble};

/// Load the first worksheet of an `.xlsx` workbook from disk.
pub fn read_xlsx_source(path: &Path, options: &SourceOptions) -> Result<SourceTable> {
    load_xlsx_file(path, options).map(|load| load.table)
}

/// Load the first worksheet of an `.xlsx` workbook from any seekable reader.
pub fn read_xlsx_source_from_reader<R: Read + Seek>(
    reader: R,
    origin: &Path,
    options: &SourceOptions,
) -> Result<SourceTable> {
    let workbook = Xlsx::new(reader).map_err(|source| IngestError::workbook(origin, source))?;
    read_workbook(workbook, origin, options).map(|load| load.table)
}

pub(crate) fn load_xlsx_file(path: &Path, options: &SourceOptions) -> Result<SourceLoad> {
    let workbook: Xlsx<_> =
        open_workbook(path).map_err(|source| IngestError::workbook(path, source))?;
    read_workbook(workbook, path, options)
}

fn read_workbook<R: Read + Seek>(
    mut workbook: Xlsx<R>,
    origin: &Path,
    options: &SourceOptions,
) -> Result<SourceLoad> {
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::EmptyWorkbook {
            path: origin.to_path_buf(),
        })?
        .map_err(|source| IngestError::workbook(origin, source))?;
    let raw_rows: Vec<Vec<RawCell>> = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect();
    assemble(origin, raw_rows, options)
}

/// Display text of a cell and the kind it is written back as.
fn cell_value(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => (String::new(), CellKind::Text),
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            (value.clone(), CellKind::Text)
        }
        Data::Int(value) => (value.to_string(), CellKind::Number),
        Data::Float(value) => (format_numeric(*value), CellKind::Number),
        Data::Bool(value) => (
            if *value { "TRUE" } else { "FALSE" }.to_string(),
            CellKind::Bool,
        ),
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) => (datetime.to_string(), CellKind::DateTime),
            None => (cell.to_string(), CellKind::Text),
        },
        other => (other.to_string(), CellKind::Text),
    }
}

/// Format a float without a trailing `.0` for whole numbers.
fn format_numeric(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
