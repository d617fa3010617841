//! Single-sheet workbook export via `rust_xlsxwriter`.

use rust_xlsxwriter::{ColNum, ExcelDateTime, Format, RowNum, Workbook, Worksheet};

use readcode_model::{CellKind, Code, LabeledTable};

use crate::error::{ExportError, Result};

/// Default worksheet name, matching what spreadsheet tools create.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Largest magnitude an `f64` holds without rounding an integer.
const MAX_EXACT_CODE: u64 = 1 << 53;

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Build a workbook with one sheet: a bold header row, source cells in
/// their source type and codings as numbers. Missing cells and unset
/// codings are left empty.
pub fn build_workbook(table: &LabeledTable, sheet_name: &str) -> Result<Workbook> {
    let headers = table.headers();
    let sheet_limit = || ExportError::SheetLimit {
        rows: table.len() + 1,
        columns: headers.len(),
    };
    let coding_col = ColNum::try_from(headers.len() - 1).map_err(|_| sheet_limit())?;

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    for (col, header) in headers.iter().enumerate() {
        let col = ColNum::try_from(col).map_err(|_| sheet_limit())?;
        sheet.write_string_with_format(0, col, *header, &header_format)?;
    }

    for (idx, (record, coding)) in table.rows().enumerate() {
        let row = RowNum::try_from(idx + 1).map_err(|_| sheet_limit())?;
        for (col, value) in record.cells.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let kind = record.kind(col);
            let col = ColNum::try_from(col).map_err(|_| sheet_limit())?;
            write_cell(sheet, row, col, value, kind, &datetime_format)?;
        }
        if let Some(code) = coding.code() {
            write_code(sheet, row, coding_col, code)?;
        }
    }

    Ok(workbook)
}

/// Write `value` natively for its kind. Text that no longer parses as its
/// kind is written as a string.
fn write_cell(
    sheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: &str,
    kind: CellKind,
    datetime_format: &Format,
) -> Result<()> {
    match kind {
        CellKind::Number => {
            if let Ok(number) = value.parse::<f64>() {
                sheet.write_number(row, col, number)?;
                return Ok(());
            }
        }
        CellKind::Bool => match value {
            "TRUE" => {
                sheet.write_boolean(row, col, true)?;
                return Ok(());
            }
            "FALSE" => {
                sheet.write_boolean(row, col, false)?;
                return Ok(());
            }
            _ => {}
        },
        CellKind::DateTime => {
            if let Ok(datetime) = ExcelDateTime::parse_from_str(value) {
                sheet.write_datetime_with_format(row, col, &datetime, datetime_format)?;
                return Ok(());
            }
        }
        CellKind::Text => {}
    }
    sheet.write_string(row, col, value)?;
    Ok(())
}

/// Codes a float would round are written as text.
fn write_code(sheet: &mut Worksheet, row: RowNum, col: ColNum, code: Code) -> Result<()> {
    let value = code.value();
    if value.unsigned_abs() <= MAX_EXACT_CODE {
        sheet.write_number(row, col, value as f64)?;
    } else {
        sheet.write_string(row, col, value.to_string())?;
    }
    Ok(())
}

/// Render `table` as `.xlsx` bytes.
pub fn xlsx_bytes(table: &LabeledTable, sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(table, sheet_name)?;
    Ok(workbook.save_to_buffer()?)
}
