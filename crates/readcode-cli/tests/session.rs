use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use readcode_cli::script::{RunOutcome, run_commands};
use readcode_cli::session::{Reply, Session, SessionError};
use readcode_cli::settings::Settings;
use readcode_ingest::{SourceOptions, load_source};
use readcode_model::{Code, Coding, ExportFormat, FallbackPolicy};

const REPORTS: &str = "\
report,patient
Foo bar,P1
BAR baz,P2
qux,P3
";

fn write_reports(dir: &Path) -> PathBuf {
    let path = dir.join("reports.csv");
    fs::write(&path, REPORTS).expect("write reports");
    path
}

struct Run {
    outcome: RunOutcome,
    out: String,
    err: String,
}

fn run(session: &mut Session, script: &str) -> Run {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let outcome =
        run_commands(session, script.as_bytes(), &mut out, &mut err, None).expect("run script");
    Run {
        outcome,
        out: String::from_utf8(out).expect("utf-8"),
        err: String::from_utf8(err).expect("utf-8"),
    }
}

fn codings(session: &Session) -> Vec<Coding> {
    session
        .finalized()
        .expect("finalized")
        .table
        .codings
        .clone()
}

fn coded(values: &[i64]) -> Vec<Coding> {
    values.iter().map(|&value| Coding::Coded(Code::new(value))).collect()
}

#[test]
fn script_codes_and_exports_csv() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let output = dir.path().join("coded_data.csv");
    let script = format!(
        "# demo\nload {}\nadd 1 foo\nadd 2 bar\nfinalize\nexport csv {}\n",
        source.display(),
        output.display()
    );

    let mut session = Session::new(Settings::default());
    let result = run(&mut session, &script);
    assert_eq!(result.outcome.failures, 0, "{}", result.err);
    assert_eq!(result.outcome.executed, 5);
    assert!(result.out.contains("Labeled 3 records; 1 matched no rule"));

    let exported = fs::read_to_string(&output).expect("read export");
    insta::assert_snapshot!(exported, @r"
    report,patient,coding
    Foo bar,P1,2
    BAR baz,P2,2
    qux,P3,0
    ");
}

#[test]
fn rule_order_decides_overlapping_matches() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let mut session = Session::new(Settings::default());
    session.load(&source, None).expect("load");

    session.add_phrase("2", "bar").expect("add");
    session.add_phrase("1", "foo").expect("add");
    session.finalize().expect("finalize");
    assert_eq!(codings(&session), coded(&[1, 2, 0]));
}

#[test]
fn edits_invalidate_the_last_finalize() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let mut session = Session::new(Settings::default());
    session.load(&source, None).expect("load");
    session.add_phrase("1", "foo").expect("add");
    session.finalize().expect("finalize");
    assert!(session.finalized().is_some());

    session.add_phrase("3", "qux").expect("add");
    assert!(session.finalized().is_none());
    assert!(matches!(
        session.export(ExportFormat::Csv, Some(&dir.path().join("x.csv"))),
        Err(SessionError::NotFinalized)
    ));

    session.finalize().expect("finalize");
    session
        .set_fallback(FallbackPolicy::MissingFill)
        .expect("fallback");
    assert!(session.finalized().is_none());
}

#[test]
fn removing_a_rule_restores_earlier_labels() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let mut session = Session::new(Settings::default());
    session.load(&source, None).expect("load");
    session.add_phrase("1", "foo").expect("add");
    session.add_phrase("2", "bar").expect("add");

    let (_, removed) = session.remove_phrase("2", "bar").expect("remove");
    assert!(removed);
    let (_, removed) = session.remove_phrase("2", "bar").expect("remove again");
    assert!(!removed);

    session.finalize().expect("finalize");
    assert_eq!(codings(&session), coded(&[1, 0, 0]));
}

#[test]
fn missing_fill_exports_empty_cells() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let output = dir.path().join("out.csv");
    let mut session = Session::new(Settings::default());
    session.load(&source, None).expect("load");
    session.add_phrase("5", "baz").expect("add");
    session
        .set_fallback(FallbackPolicy::MissingFill)
        .expect("fallback");
    session.finalize().expect("finalize");
    session
        .export(ExportFormat::Csv, Some(&output))
        .expect("export");

    let exported = fs::read_to_string(&output).expect("read export");
    assert_eq!(
        exported,
        "report,patient,coding\nFoo bar,P1,\nBAR baz,P2,5\nqux,P3,\n"
    );
}

#[test]
fn invalid_code_leaves_rules_unchanged() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let mut session = Session::new(Settings::default());
    session.load(&source, None).expect("load");

    let err = session.add_phrase("two", "bar").unwrap_err();
    assert!(matches!(err, SessionError::InvalidCode(_)));
    assert!(session.rules().is_empty());
    assert!(session.rules().codes().is_empty());
}

#[test]
fn failed_load_keeps_previous_table_and_rules() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let mut session = Session::new(Settings::default());
    session.load(&source, None).expect("load");
    session.add_phrase("1", "foo").expect("add");

    let err = session
        .load(&dir.path().join("missing.csv"), None)
        .unwrap_err();
    assert!(matches!(err, SessionError::Ingest(_)));
    assert_eq!(session.rules().len(), 1);
    assert_eq!(
        session.source().expect("source").path,
        source
    );
}

#[test]
fn loading_a_new_table_starts_fresh_rules() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let mut session = Session::new(Settings::default());
    session.load(&source, None).expect("load");
    session.add_phrase("1", "foo").expect("add");
    session.finalize().expect("finalize");

    session.load(&source, Some("patient")).expect("reload");
    assert!(session.rules().is_empty());
    assert!(session.finalized().is_none());
    assert_eq!(
        session.source().expect("source").table.text_header(),
        "patient"
    );
}

#[test]
fn script_reports_failures_and_keeps_going() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let script = format!(
        "add 1 foo\nload {}\nadd x foo\nexport csv\nbogus\nadd 1 foo\nfinalize\n",
        source.display()
    );

    let mut session = Session::new(Settings::default());
    let result = run(&mut session, &script);
    assert_eq!(result.outcome.failures, 4);
    assert_eq!(result.outcome.executed, 3);
    assert!(result.err.contains("line 1: no source table loaded"));
    assert!(result.err.contains("line 3:"));
    assert!(result.err.contains("line 4: nothing to export"));
    assert!(result.err.contains("line 5: unknown command \"bogus\""));
    assert_eq!(codings(&session), coded(&[1, 0, 0]));
}

#[test]
fn password_must_be_entered_before_anything_else() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let mut settings = Settings::default();
    settings.access.password = Some("letmein".to_string());

    let mut session = Session::new(settings);
    let script = format!(
        "load {path}\nlogin nope\nlogin letmein\nload {path}\n",
        path = source.display()
    );
    let result = run(&mut session, &script);
    assert_eq!(result.outcome.failures, 2);
    assert!(result.err.contains("line 1: access denied"));
    assert!(result.err.contains("line 2: incorrect password"));
    assert!(session.is_unlocked());
    assert!(session.source().is_some());
}

#[test]
fn quit_stops_the_run() {
    let mut session = Session::new(Settings::default());
    let result = run(&mut session, "help\nquit\nbogus\n");
    assert!(result.outcome.quit);
    assert_eq!(result.outcome.failures, 0);
    assert!(result.out.contains("commands:"));
}

#[test]
fn declared_code_is_listed_without_phrases() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let mut session = Session::new(Settings::default());
    session.load(&source, None).expect("load");

    let reply = session
        .execute(readcode_cli::script::Command::Code {
            code: "7".to_string(),
        })
        .expect("declare");
    assert_eq!(
        reply,
        Reply::CodeDeclared {
            code: Code::new(7),
            created: true,
        }
    );
    assert_eq!(session.rules().phrases(Code::new(7)), Some(Vec::new()));
}

#[test]
fn xlsx_export_reloads_to_the_same_source() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_reports(dir.path());
    let mut settings = Settings::default();
    settings.export.output_dir = Some(dir.path().join("exports"));

    let mut session = Session::new(settings);
    session.load(&source, None).expect("load");
    session.add_phrase("1", "foo").expect("add");
    session.finalize().expect("finalize");
    let path = session.export(ExportFormat::Xlsx, None).expect("export");
    assert_eq!(path, dir.path().join("exports").join("coded_data.xlsx"));

    let reloaded = load_source(&path, &SourceOptions::new()).expect("reload");
    assert!(reloaded.dropped_coding_column);
    assert_eq!(reloaded.table, session.source().expect("source").table);
}

#[test]
fn loading_a_coded_table_reports_the_replaced_column() {
    let dir = TempDir::new().expect("temp dir");
    let source = dir.path().join("coded.csv");
    fs::write(&source, "report,coding\nFoo bar,9\nqux,\n").expect("write source");
    let script = format!("load {}\nadd 1 foo\nfinalize\n", source.display());

    let mut session = Session::new(Settings::default());
    let result = run(&mut session, &script);
    assert_eq!(result.outcome.failures, 0, "{}", result.err);
    assert!(
        result
            .out
            .contains("Its existing `coding` column was dropped; the export writes a new one.")
    );
    let loaded = session.source().expect("source");
    assert!(loaded.dropped_coding_column);
    assert_eq!(loaded.table.headers, vec!["report"]);
    assert_eq!(codings(&session), coded(&[1, 0]));

    session.load(&write_reports(dir.path()), None).expect("load");
    assert!(!session.source().expect("source").dropped_coding_column);
}

#[test]
fn demo_script_labels_the_demo_reports() {
    let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
    let script = fs::read_to_string(demos.join("coding.rc")).expect("read demo script");
    let script: String = script
        .lines()
        .filter(|line| !line.starts_with("export"))
        .map(|line| {
            line.replace(
                "load demos/",
                &format!("load {}/", demos.display()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut session = Session::new(Settings::default());
    let result = run(&mut session, &script);
    assert_eq!(result.outcome.failures, 0, "{}", result.err);
    assert_eq!(codings(&session), coded(&[1, 0, 2, 3, 0]));
}
