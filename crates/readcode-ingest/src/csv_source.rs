use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use readcode_model::{CellKind, SourceTable};

use crate::error::{IngestError, Result};
use crate::table::{RawCell, SourceLoad, SourceOptions, assemble};

/// Load a comma-separated source table from disk.
pub fn read_csv_source(path: &Path, options: &SourceOptions) -> Result<SourceTable> {
    load_csv_file(path, options).map(|load| load.table)
}

/// Load a comma-separated source table from any reader. `origin` names the
/// source in errors and logs.
pub fn read_csv_source_from_reader<R: Read>(
    reader: R,
    origin: &Path,
    options: &SourceOptions,
) -> Result<SourceTable> {
    load_csv(reader, origin, options).map(|load| load.table)
}

pub(crate) fn load_csv_file(path: &Path, options: &SourceOptions) -> Result<SourceLoad> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_csv(file, path, options)
}

/// Every CSV cell is text.
fn load_csv<R: Read>(reader: R, origin: &Path, options: &SourceOptions) -> Result<SourceLoad> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut raw_rows: Vec<Vec<RawCell>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::csv(origin, source))?;
        raw_rows.push(
            record
                .iter()
                .map(|value| (value.to_string(), CellKind::Text))
                .collect(),
        );
    }
    assemble(origin, raw_rows, options)
}
