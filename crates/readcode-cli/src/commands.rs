use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result, bail};

use readcode_cli::script::{RunOutcome, run_commands};
use readcode_cli::session::Session;
use readcode_cli::settings::Settings;
use readcode_cli::summary::{coding_table, preview_table, rule_hits_table};
use readcode_model::ExportFormat;

use crate::cli::{CodeArgs, PreviewArgs, RunArgs};

const PROMPT: &str = "readcode> ";

pub fn run_script(args: &RunArgs, settings: Settings, password: Option<&str>) -> Result<RunOutcome> {
    let file = File::open(&args.script)
        .with_context(|| format!("open script {}", args.script.display()))?;
    let mut session = open_session(settings, password)?;
    let outcome = run_commands(
        &mut session,
        BufReader::new(file),
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
        None,
    )
    .context("run script")?;
    Ok(outcome)
}

pub fn run_session(settings: Settings, password: Option<&str>) -> Result<RunOutcome> {
    let mut session = open_session(settings, password)?;
    let stdin = io::stdin();
    let prompt = stdin.is_terminal().then_some(PROMPT);
    if prompt.is_some() {
        println!("Type `help` for commands, `quit` to leave.");
    }
    let outcome = run_commands(
        &mut session,
        stdin.lock(),
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
        prompt,
    )
    .context("read commands")?;
    Ok(outcome)
}

pub fn run_code(args: &CodeArgs, settings: Settings, password: Option<&str>) -> Result<()> {
    let mut session = open_session(settings, password)?;
    require_unlocked(&session)?;

    session
        .load(&args.source, args.text_column.as_deref())
        .with_context(|| format!("load {}", args.source.display()))?;
    for rule in &args.rules {
        session
            .add_phrase(&rule.code, &rule.phrase)
            .with_context(|| format!("rule {}={}", rule.code, rule.phrase))?;
    }
    if let Some(fallback) = args.fallback {
        session.set_fallback(fallback.into())?;
    }
    let format = export_format(args, session.settings());

    session.finalize()?;
    if let Some(finalized) = session.finalized() {
        println!("{}", coding_table(finalized));
        if !finalized.rule_hits.is_empty() {
            println!("{}", rule_hits_table(session.rules(), finalized));
        }
    }

    let path = session.export(format, args.output.as_deref())?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn run_preview(args: &PreviewArgs, settings: Settings, password: Option<&str>) -> Result<()> {
    let mut session = open_session(settings, password)?;
    require_unlocked(&session)?;
    session
        .load(&args.source, args.text_column.as_deref())
        .with_context(|| format!("load {}", args.source.display()))?;
    let rows = args
        .rows
        .unwrap_or(session.settings().display.preview_rows);
    if let Some(table) = preview_table(&session, rows) {
        println!("{table}");
    }
    Ok(())
}

fn open_session(settings: Settings, password: Option<&str>) -> Result<Session> {
    let mut session = Session::new(settings);
    if let Some(password) = password
        && !session.is_unlocked()
    {
        session.login(password)?;
    }
    Ok(session)
}

fn require_unlocked(session: &Session) -> Result<()> {
    if !session.is_unlocked() {
        bail!("a password is configured: pass --password or set READCODE_PASSWORD");
    }
    Ok(())
}

/// `--format`, else the output extension, else the configured format.
fn export_format(args: &CodeArgs, settings: &Settings) -> ExportFormat {
    if let Some(format) = args.format {
        return format.into();
    }
    args.output
        .as_deref()
        .and_then(format_from_extension)
        .unwrap_or(settings.export.format)
}

fn format_from_extension(path: &Path) -> Option<ExportFormat> {
    path.extension()?.to_str()?.parse().ok()
}
