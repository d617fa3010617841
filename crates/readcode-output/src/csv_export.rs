//! Comma-separated export.

use std::io::Write;

use csv::{Terminator, WriterBuilder};

use readcode_model::LabeledTable;

use crate::error::Result;

/// Write `table` as UTF-8 CSV: header row, source columns, then `coding`.
/// Unset codings and missing source cells become empty fields.
pub fn write_csv<W: Write>(writer: W, table: &LabeledTable) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);
    writer.write_record(table.headers())?;
    for (record, coding) in table.rows() {
        let coding = coding.to_string();
        writer.write_record(
            record
                .cells
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(coding.as_str())),
        )?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Render `table` as CSV bytes, e.g. for a download response.
pub fn csv_bytes(table: &LabeledTable) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, table)?;
    Ok(buffer)
}
