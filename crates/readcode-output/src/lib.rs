//! Labeled table export.
//!
//! Two interchange formats, both holding the source columns followed by one
//! `coding` column and no index column:
//!
//! - **CSV**: UTF-8, header row, unset codings as empty fields
//! - **XLSX**: one worksheet, bold header row, unset codings as empty cells

mod csv_export;
mod error;
mod xlsx_export;

use std::fs;
use std::path::Path;
use std::time::Instant;

use tracing::{info, info_span};

use readcode_model::{ExportFormat, LabeledTable};

pub use csv_export::{csv_bytes, write_csv};
pub use error::{ExportError, Result};
pub use xlsx_export::{DEFAULT_SHEET_NAME, build_workbook, xlsx_bytes};

/// Export settings that do not change the table contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub sheet_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

/// Render `table` in `format`.
pub fn render(table: &LabeledTable, format: ExportFormat, options: &ExportOptions) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => csv_bytes(table),
        ExportFormat::Xlsx => xlsx_bytes(table, &options.sheet_name),
    }
}

/// Render `table` and write it to `path`, creating parent directories.
///
/// The file is only written once rendering has fully succeeded.
pub fn export_table(
    path: &Path,
    table: &LabeledTable,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<()> {
    let span = info_span!("export", path = %path.display(), format = %format);
    let _guard = span.enter();
    let start = Instant::now();

    let bytes = render(table, format, options)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, &bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        records = table.len(),
        bytes = bytes.len(),
        duration_ms = start.elapsed().as_millis(),
        "export written"
    );
    Ok(())
}
