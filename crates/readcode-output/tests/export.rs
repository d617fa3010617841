use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tempfile::TempDir;

use readcode_ingest::{SourceOptions, read_csv_source_from_reader, read_xlsx_source_from_reader};
use readcode_model::{CellKind, Code, Coding, ExportFormat, LabeledTable, Record, SourceTable};
use readcode_output::{ExportOptions, csv_bytes, export_table, render, xlsx_bytes};

fn labeled() -> LabeledTable {
    let records = vec![
        Record::new(vec!["diabetes mellitus".to_string(), "P1".to_string()]),
        Record::new(vec!["hypertension, severe".to_string(), "P2".to_string()]),
        Record::new(vec![String::new(), "P3".to_string()]),
    ];
    let source = SourceTable::new(
        vec!["report".to_string(), "patient".to_string()],
        0,
        records,
    )
    .expect("valid table");
    LabeledTable {
        source,
        codings: vec![
            Coding::Coded(Code::new(1)),
            Coding::Coded(Code::new(2)),
            Coding::Unset,
        ],
    }
}

fn first_sheet(bytes: Vec<u8>) -> calamine::Range<Data> {
    let mut workbook = Xlsx::new(Cursor::new(bytes)).expect("open workbook");
    workbook
        .worksheet_range_at(0)
        .expect("first sheet")
        .expect("read sheet")
}

fn csv_codings(bytes: &[u8]) -> Vec<String> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers().expect("headers").clone();
    let coding_idx = headers
        .iter()
        .position(|header| header == "coding")
        .expect("coding column");
    reader
        .records()
        .map(|record| record.expect("record")[coding_idx].to_string())
        .collect()
}

#[test]
fn csv_export_appends_coding_column() {
    let text = String::from_utf8(csv_bytes(&labeled()).expect("render csv")).expect("utf-8");
    insta::assert_snapshot!(text, @r#"
report,patient,coding
diabetes mellitus,P1,1
"hypertension, severe",P2,2
,P3,
"#);
}

#[test]
fn csv_round_trip_preserves_codings() {
    let table = labeled();
    let bytes = csv_bytes(&table).expect("render csv");
    let expected: Vec<String> = table.codings.iter().map(ToString::to_string).collect();
    assert_eq!(csv_codings(&bytes), expected);
}

#[test]
fn reloading_an_export_recovers_the_source() {
    let table = labeled();
    let bytes = csv_bytes(&table).expect("render csv");
    let reloaded =
        read_csv_source_from_reader(bytes.as_slice(), Path::new("coded_data.csv"), &SourceOptions::new())
            .expect("reload export");
    assert_eq!(reloaded, table.source);
}

#[test]
fn csv_export_is_utf8_without_bom() {
    let mut table = labeled();
    table.source.records[0].cells[0] = "우측 폐 결절".to_string();
    let bytes = csv_bytes(&table).expect("render csv");
    assert!(bytes.starts_with(b"report,"));
    let text = String::from_utf8(bytes).expect("utf-8");
    assert!(text.contains("우측 폐 결절,P1,1\n"));
}

#[test]
fn xlsx_export_has_one_sheet_with_typed_codings() {
    let bytes = xlsx_bytes(&labeled(), "Coded").expect("render xlsx");
    let mut workbook = Xlsx::new(Cursor::new(bytes)).expect("open workbook");
    assert_eq!(workbook.sheet_names(), vec!["Coded".to_string()]);

    let range = workbook
        .worksheet_range_at(0)
        .expect("first sheet")
        .expect("read sheet");
    assert_eq!(range.get_size(), (4, 3));
    assert_eq!(range.get((0, 2)), Some(&Data::String("coding".to_string())));
    assert_eq!(
        range.get((2, 0)),
        Some(&Data::String("hypertension, severe".to_string()))
    );
    assert_eq!(range.get((1, 2)), Some(&Data::Float(1.0)));
    assert_eq!(range.get((2, 2)), Some(&Data::Float(2.0)));
    assert_eq!(range.get((3, 0)), Some(&Data::Empty));
    assert_eq!(range.get((3, 2)), Some(&Data::Empty));
}

#[test]
fn xlsx_codes_beyond_float_precision_are_written_as_text() {
    let mut table = labeled();
    table.codings[0] = Coding::Coded(Code::new(9_007_199_254_740_993));
    table.codings[1] = Coding::Coded(Code::new(-9_007_199_254_740_992));
    let range = first_sheet(xlsx_bytes(&table, "Sheet1").expect("render xlsx"));
    assert_eq!(
        range.get((1, 2)),
        Some(&Data::String("9007199254740993".to_string()))
    );
    assert_eq!(range.get((2, 2)), Some(&Data::Float(-9_007_199_254_740_992.0)));
}

#[test]
fn xlsx_source_cells_keep_their_type_through_export() {
    let mut source = Workbook::new();
    let sheet = source.add_worksheet();
    for (col, header) in ["report", "age", "smoker", "seen", "id"].into_iter().enumerate() {
        sheet.write_string(0, col as u16, header).expect("header");
    }
    sheet.write_string(1, 0, "Nodule in RUL").expect("cell");
    sheet.write_number(1, 1, 42.0).expect("cell");
    sheet.write_boolean(1, 2, true).expect("cell");
    let seen = ExcelDateTime::from_ymd(2024, 1, 3).expect("date");
    sheet
        .write_datetime_with_format(1, 3, &seen, &Format::new().set_num_format("yyyy-mm-dd"))
        .expect("cell");
    sheet.write_string(1, 4, "007").expect("cell");
    let bytes = source.save_to_buffer().expect("save source");

    let loaded =
        read_xlsx_source_from_reader(Cursor::new(bytes), Path::new("in.xlsx"), &SourceOptions::new())
            .expect("load source");
    assert_eq!(loaded.records[0].kind(3), CellKind::DateTime);
    let table = LabeledTable {
        source: loaded,
        codings: vec![Coding::Coded(Code::new(5))],
    };
    let exported = xlsx_bytes(&table, "Sheet1").expect("render xlsx");

    let range = first_sheet(exported.clone());
    assert_eq!(range.get((1, 1)), Some(&Data::Float(42.0)));
    assert_eq!(range.get((1, 2)), Some(&Data::Bool(true)));
    assert_eq!(range.get((1, 4)), Some(&Data::String("007".to_string())));
    assert_eq!(range.get((1, 5)), Some(&Data::Float(5.0)));

    let reloaded = read_xlsx_source_from_reader(
        Cursor::new(exported),
        Path::new("out.xlsx"),
        &SourceOptions::new(),
    )
    .expect("reload export");
    assert_eq!(reloaded, table.source);
}

#[test]
fn export_table_writes_each_format_to_disk() {
    let dir = TempDir::new().expect("temp dir");
    let table = labeled();
    let options = ExportOptions::default();
    for format in [ExportFormat::Csv, ExportFormat::Xlsx] {
        let path = dir.path().join("out").join(format.file_name("coded_data"));
        export_table(&path, &table, format, &options).expect("export");
        let written = std::fs::read(&path).expect("read export");
        match format {
            ExportFormat::Csv => {
                assert_eq!(written, render(&table, format, &options).expect("render"));
            }
            // Workbooks embed a creation timestamp, so only check the zip magic.
            ExportFormat::Xlsx => assert!(written.starts_with(b"PK")),
        }
    }
}

#[test]
fn xlsx_rejects_invalid_sheet_name() {
    let err = xlsx_bytes(&labeled(), "bad[name]").unwrap_err();
    assert!(matches!(err, readcode_output::ExportError::Workbook(_)));
}
