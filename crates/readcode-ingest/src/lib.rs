//! Source table loading.
//!
//! Reads `.csv` and `.xlsx` report tables into a
//! [`SourceTable`](readcode_model::SourceTable). The first
//! non-blank row is the header; the first column is the text column unless
//! [`SourceOptions::text_column`] names another one.

pub mod csv_source;
pub mod error;
pub mod table;
pub mod workbook;

use std::path::Path;
use std::time::Instant;

use tracing::{info, info_span};

pub use csv_source::{read_csv_source, read_csv_source_from_reader};
pub use error::{IngestError, Result};
pub use table::{SourceLoad, SourceOptions};
pub use workbook::{read_xlsx_source, read_xlsx_source_from_reader};

/// Source file formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Detect the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// Load a source table, choosing the reader by file extension.
pub fn load_source(path: &Path, options: &SourceOptions) -> Result<SourceLoad> {
    let format = SourceFormat::from_path(path).ok_or_else(|| IngestError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let span = info_span!("ingest", path = %path.display(), format = ?format);
    let _guard = span.enter();
    let start = Instant::now();

    let load = match format {
        SourceFormat::Csv => csv_source::load_csv_file(path, options)?,
        SourceFormat::Xlsx => workbook::load_xlsx_file(path, options)?,
    };

    let table = &load.table;
    info!(
        records = table.len(),
        columns = table.headers.len(),
        text_column = %table.text_header(),
        duration_ms = start.elapsed().as_millis(),
        dropped_coding_column = load.dropped_coding_column,
        "source loaded"
    );
    Ok(load)
}
