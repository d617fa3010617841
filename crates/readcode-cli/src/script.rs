//! Operator command grammar.
//!
//! One command per line. Blank lines and lines starting with `#` are
//! ignored. Keywords are case-insensitive; phrases are taken verbatim from
//! the rest of the line after the code. Paths may be double-quoted when
//! they contain spaces.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use readcode_model::{ExportFormat, FallbackPolicy};

use crate::session::{Reply, Session};
use crate::summary::render_reply;

pub const HELP: &str = "\
commands:
  login <secret>             unlock the session
  load <path> [text-column]  load a .csv or .xlsx source table
  code <code>                declare a code with no phrases yet
  add <code> <phrase...>     assign a phrase to a code
  remove <code> <phrase...>  remove a phrase from a code
  rules                      list rules by code and in match order
  fallback zero|missing      label for records no rule matches
  finalize                   label every record
  preview [rows]             show the first rows
  summary                    per-code counts of the last finalize
  export csv|xlsx [path]     write the labeled table
  help                       show this list
  quit                       end the session";

/// One parsed operator command.
///
/// Codes stay as entered; the session validates them so that a bad code is
/// reported the same way whichever surface produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { secret: String },
    Load { path: PathBuf, text_column: Option<String> },
    Code { code: String },
    Add { code: String, phrase: String },
    Remove { code: String, phrase: String },
    Rules,
    Fallback { policy: FallbackPolicy },
    Finalize,
    Preview { rows: Option<usize> },
    Summary,
    Export { format: ExportFormat, path: Option<PathBuf> },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command {0:?} (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    InvalidValue(String),

    #[error("unterminated quote in {0:?}")]
    UnterminatedQuote(String),
}

/// Parse one line. Returns `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (keyword, rest) = split_word(trimmed);
    let command = match keyword.to_ascii_lowercase().as_str() {
        "login" => Command::Login {
            secret: rest.trim().to_string(),
        },
        "load" => {
            let (path, rest) = take_token(rest)?;
            let path = path.ok_or(CommandError::Usage("load <path> [text-column]"))?;
            let text_column = Some(rest.trim())
                .filter(|column| !column.is_empty())
                .map(str::to_string);
            Command::Load {
                path: PathBuf::from(path),
                text_column,
            }
        }
        "code" => {
            let code = rest.trim();
            if code.is_empty() {
                return Err(CommandError::Usage("code <code>"));
            }
            Command::Code {
                code: code.to_string(),
            }
        }
        "add" | "remove" => {
            let (code, phrase) = split_word(rest.trim_start());
            if code.is_empty() {
                return Err(CommandError::Usage(if keyword.eq_ignore_ascii_case("add") {
                    "add <code> <phrase...>"
                } else {
                    "remove <code> <phrase...>"
                }));
            }
            let code = code.to_string();
            let phrase = phrase.to_string();
            if keyword.eq_ignore_ascii_case("add") {
                Command::Add { code, phrase }
            } else {
                Command::Remove { code, phrase }
            }
        }
        "rules" => Command::Rules,
        "fallback" => {
            let value = rest.trim();
            if value.is_empty() {
                return Err(CommandError::Usage("fallback zero|missing"));
            }
            Command::Fallback {
                policy: value.parse().map_err(CommandError::InvalidValue)?,
            }
        }
        "finalize" => Command::Finalize,
        "preview" => {
            let value = rest.trim();
            let rows = if value.is_empty() {
                None
            } else {
                Some(value.parse::<usize>().map_err(|_| {
                    CommandError::InvalidValue(format!("row count {value:?} is not a number"))
                })?)
            };
            Command::Preview { rows }
        }
        "summary" => Command::Summary,
        "export" => {
            let (format, rest) = split_word(rest.trim_start());
            if format.is_empty() {
                return Err(CommandError::Usage("export csv|xlsx [path]"));
            }
            let format = format.parse().map_err(CommandError::InvalidValue)?;
            let (path, _) = take_token(rest)?;
            Command::Export {
                format,
                path: path.map(PathBuf::from),
            }
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(CommandError::Unknown(keyword.to_string())),
    };
    Ok(Some(command))
}

/// Counts from one pass over a command stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Commands that ran successfully.
    pub executed: usize,
    /// Lines that failed to parse or execute.
    pub failures: usize,
    /// Whether the stream ended with `quit`.
    pub quit: bool,
}

/// Execute every line of `input` against `session`.
///
/// Replies go to `out` and failures to `err` as `line N: message`; a failing
/// line does not stop the run. With a `prompt`, it is written before each
/// line is read.
pub fn run_commands<R, W, E>(
    session: &mut Session,
    input: R,
    out: &mut W,
    err: &mut E,
    prompt: Option<&str>,
) -> io::Result<RunOutcome>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut outcome = RunOutcome::default();
    let mut lines = input.lines();
    let mut line_no = 0usize;
    loop {
        if let Some(prompt) = prompt {
            write!(out, "{prompt}")?;
            out.flush()?;
        }
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        line_no += 1;

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(error) => {
                warn!(line = line_no, %error, "invalid command");
                writeln!(err, "line {line_no}: {error}")?;
                outcome.failures += 1;
                continue;
            }
        };
        match session.execute(command) {
            Ok(reply) => {
                outcome.executed += 1;
                writeln!(out, "{}", render_reply(session, &reply))?;
                if reply == Reply::Quit {
                    outcome.quit = true;
                    break;
                }
            }
            Err(error) => {
                warn!(line = line_no, %error, "command failed");
                writeln!(err, "line {line_no}: {error}")?;
                outcome.failures += 1;
            }
        }
    }
    Ok(outcome)
}

/// Split at the first whitespace character, dropping only that character.
fn split_word(input: &str) -> (&str, &str) {
    match input.char_indices().find(|(_, ch)| ch.is_whitespace()) {
        Some((idx, ch)) => (&input[..idx], &input[idx + ch.len_utf8()..]),
        None => (input, ""),
    }
}

/// Take one whitespace-delimited or double-quoted token.
fn take_token(input: &str) -> Result<(Option<String>, &str), CommandError> {
    let input = input.trim_start();
    if input.is_empty() {
        return Ok((None, input));
    }
    if let Some(quoted) = input.strip_prefix('"') {
        let end = quoted
            .find('"')
            .ok_or_else(|| CommandError::UnterminatedQuote(input.to_string()))?;
        return Ok((Some(quoted[..end].to_string()), &quoted[end + 1..]));
    }
    let (token, rest) = split_word(input);
    Ok((Some(token.to_string()), rest))
}
