//! CLI argument definitions for readcode.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use readcode_model::{ExportFormat, FallbackPolicy};

#[derive(Parser)]
#[command(
    name = "readcode",
    version,
    about = "Label free-text report tables with integer codes",
    long_about = "Label free-text report tables with integer codes.\n\n\
                  Operators assign phrases to codes; every record whose text contains\n\
                  a phrase (ignoring case) gets that code, later rules winning.\n\
                  Reads and writes CSV and XLSX."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include report text in logs (may contain patient information).
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Settings file to use instead of the platform default.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Session password, checked against the configured one.
    #[arg(
        long = "password",
        env = "READCODE_PASSWORD",
        hide_env_values = true,
        global = true
    )]
    pub password: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute a command script, one command per line.
    Run(RunArgs),

    /// Read commands interactively from standard input.
    Session,

    /// Load a table, apply rules in order, finalize and export.
    Code(CodeArgs),

    /// Show the first rows of a source table.
    Preview(PreviewArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Script file with one command per line.
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,
}

#[derive(Parser)]
pub struct CodeArgs {
    /// Source table (.csv or .xlsx).
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Header of the column holding report text (default: first column).
    #[arg(long = "text-column", value_name = "NAME")]
    pub text_column: Option<String>,

    /// Rule as CODE=PHRASE; repeat in precedence order, later rules win.
    #[arg(long = "rule", value_name = "CODE=PHRASE", value_parser = parse_rule)]
    pub rules: Vec<RuleArg>,

    /// Label for records no rule matches (default from settings).
    #[arg(long = "fallback", value_enum)]
    pub fallback: Option<FallbackArg>,

    /// Export format (default from settings, or the output extension).
    #[arg(long = "format", value_enum)]
    pub format: Option<FormatArg>,

    /// Output file (default: coded_data.<format>).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct PreviewArgs {
    /// Source table (.csv or .xlsx).
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Header of the column holding report text (default: first column).
    #[arg(long = "text-column", value_name = "NAME")]
    pub text_column: Option<String>,

    /// Number of rows to show (default from settings).
    #[arg(long = "rows", value_name = "N")]
    pub rows: Option<usize>,
}

/// A `CODE=PHRASE` pair. The code is validated by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleArg {
    pub code: String,
    pub phrase: String,
}

fn parse_rule(value: &str) -> Result<RuleArg, String> {
    let (code, phrase) = value
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=PHRASE, got {value:?}"))?;
    Ok(RuleArg {
        code: code.to_string(),
        phrase: phrase.to_string(),
    })
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FallbackArg {
    /// Code unmatched records as 0.
    Zero,
    /// Leave unmatched records empty.
    Missing,
}

impl From<FallbackArg> for FallbackPolicy {
    fn from(value: FallbackArg) -> Self {
        match value {
            FallbackArg::Zero => Self::ZeroFill,
            FallbackArg::Missing => Self::MissingFill,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Csv,
    Xlsx,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => Self::Csv,
            FormatArg::Xlsx => Self::Xlsx,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rule_splits_at_first_equals() {
        assert_eq!(
            parse_rule("2=ratio = 1:3").expect("rule"),
            RuleArg {
                code: "2".to_string(),
                phrase: "ratio = 1:3".to_string(),
            }
        );
        assert!(parse_rule("nodule").is_err());
    }

    #[test]
    fn code_subcommand_collects_rules_in_order() {
        let cli = Cli::try_parse_from([
            "readcode",
            "code",
            "reports.csv",
            "--rule",
            "1=foo",
            "--rule",
            "2=bar",
            "--fallback",
            "missing",
        ])
        .expect("parse");
        let Command::Code(args) = cli.command else {
            panic!("expected code subcommand");
        };
        let codes: Vec<&str> = args.rules.iter().map(|rule| rule.code.as_str()).collect();
        assert_eq!(codes, ["1", "2"]);
        assert!(matches!(args.fallback, Some(FallbackArg::Missing)));
    }
}
