//! Interactive coding session state.
//!
//! A session holds at most one source table, the rules entered for it, the
//! selected fallback policy and the result of the last finalize. Loading a
//! table starts a fresh rule set. Any rule edit, fallback change or load
//! discards the last finalize, so an export always reflects the current
//! rules.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use readcode_ingest::{IngestError, SourceOptions, load_source};
use readcode_model::{Code, ExportFormat, FallbackPolicy, InvalidCodeInput, SourceTable};
use readcode_output::{ExportError, ExportOptions, export_table};
use readcode_rules::{Finalized, RuleStore, finalize};

use crate::logging::redact_value;
use crate::script::Command;
use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("access denied: log in first")]
    AccessDenied,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("no source table loaded (use `load <path>`)")]
    NoSource,

    #[error("nothing to export: run `finalize` after the last change")]
    NotFinalized,

    #[error(transparent)]
    InvalidCode(#[from] InvalidCodeInput),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// The currently loaded source table and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub path: PathBuf,
    pub table: SourceTable,
    /// The file had its own `coding` column, which the export replaces.
    pub dropped_coding_column: bool,
}

/// Outcome of one executed command, for the caller to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    LoggedIn,
    Loaded {
        path: PathBuf,
        records: usize,
        columns: usize,
        text_column: String,
        dropped_coding_column: bool,
    },
    CodeDeclared {
        code: Code,
        created: bool,
    },
    PhraseAdded {
        code: Code,
        phrase: String,
        added: bool,
    },
    PhraseRemoved {
        code: Code,
        phrase: String,
        removed: bool,
    },
    Rules,
    FallbackSet(FallbackPolicy),
    Finalized {
        records: usize,
        unmatched: usize,
        policy: FallbackPolicy,
    },
    Preview {
        rows: usize,
    },
    Summary,
    Exported {
        path: PathBuf,
        format: ExportFormat,
    },
    Help,
    Quit,
}

#[derive(Debug)]
pub struct Session {
    settings: Settings,
    unlocked: bool,
    source: Option<LoadedSource>,
    rules: RuleStore,
    fallback: FallbackPolicy,
    finalized: Option<Finalized>,
}

impl Session {
    /// Start a session. It is unlocked unless a password is configured.
    pub fn new(settings: Settings) -> Self {
        let unlocked = settings.access.password.is_none();
        let fallback = settings.coding.fallback;
        Self {
            settings,
            unlocked,
            source: None,
            rules: RuleStore::new(),
            fallback,
            finalized: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn source(&self) -> Option<&LoadedSource> {
        self.source.as_ref()
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Result of the last finalize, if no edit has happened since.
    pub fn finalized(&self) -> Option<&Finalized> {
        self.finalized.as_ref()
    }

    /// Check `secret` against the configured password.
    pub fn login(&mut self, secret: &str) -> Result<()> {
        match &self.settings.access.password {
            Some(password) if password != secret => {
                warn!("login rejected");
                Err(SessionError::IncorrectPassword)
            }
            _ => {
                self.unlocked = true;
                info!("session unlocked");
                Ok(())
            }
        }
    }

    /// Load a source table, replacing the current one and its rules.
    ///
    /// On failure the previous table and rules are kept.
    pub fn load(&mut self, path: &Path, text_column: Option<&str>) -> Result<&LoadedSource> {
        self.ensure_unlocked()?;
        let column = text_column
            .map(str::to_string)
            .or_else(|| self.settings.coding.text_column.clone());
        let options = SourceOptions::new().with_text_column(column);
        let load = load_source(path, &options)?;

        if !self.rules.is_empty() || !self.rules.codes().is_empty() {
            debug!(rules = self.rules.len(), "discarding rules of previous table");
        }
        self.rules.clear();
        self.finalized = None;
        Ok(self.source.insert(LoadedSource {
            path: path.to_path_buf(),
            table: load.table,
            dropped_coding_column: load.dropped_coding_column,
        }))
    }

    /// Declare `code` so it is listed before any phrase is assigned.
    pub fn declare_code(&mut self, code: &str) -> Result<(Code, bool)> {
        self.ensure_editable()?;
        let code: Code = code.parse()?;
        let created = self.rules.declare_code(code);
        Ok((code, created))
    }

    /// Assign `phrase` to `code`. A blank phrase changes nothing.
    pub fn add_phrase(&mut self, code: &str, phrase: &str) -> Result<(Code, bool)> {
        self.ensure_editable()?;
        let code: Code = code.parse()?;
        let added = self.rules.add_phrase(code, phrase);
        if added {
            self.finalized = None;
        }
        Ok((code, added))
    }

    /// Remove the earliest active occurrence of `phrase` under `code`.
    pub fn remove_phrase(&mut self, code: &str, phrase: &str) -> Result<(Code, bool)> {
        self.ensure_editable()?;
        let code: Code = code.parse()?;
        let removed = self.rules.remove_phrase(code, phrase);
        if removed {
            self.finalized = None;
        }
        Ok((code, removed))
    }

    pub fn set_fallback(&mut self, policy: FallbackPolicy) -> Result<()> {
        self.ensure_unlocked()?;
        if policy != self.fallback {
            self.fallback = policy;
            self.finalized = None;
        }
        Ok(())
    }

    /// Label every record of the loaded table from scratch.
    pub fn finalize(&mut self) -> Result<&Finalized> {
        self.ensure_unlocked()?;
        let source = self.source.as_ref().ok_or(SessionError::NoSource)?;
        let finalized = finalize(&source.table, &self.rules, self.fallback);

        for (row, coding) in finalized.table.codings.iter().enumerate() {
            trace!(
                row,
                coding = %coding,
                text = redact_value(source.table.text(row)),
                "record labeled"
            );
        }
        Ok(self.finalized.insert(finalized))
    }

    /// Export the last finalize to `path`, or to the configured default.
    pub fn export(&self, format: ExportFormat, path: Option<&Path>) -> Result<PathBuf> {
        self.ensure_unlocked()?;
        let finalized = self.finalized.as_ref().ok_or(SessionError::NotFinalized)?;
        let path = path.map_or_else(
            || self.settings.export.default_path(format),
            Path::to_path_buf,
        );
        let options = ExportOptions {
            sheet_name: self.settings.export.sheet_name.clone(),
        };
        export_table(&path, &finalized.table, format, &options)?;
        Ok(path)
    }

    /// Run one parsed command.
    pub fn execute(&mut self, command: Command) -> Result<Reply> {
        match command {
            Command::Login { secret } => {
                self.login(&secret)?;
                Ok(Reply::LoggedIn)
            }
            Command::Help => Ok(Reply::Help),
            Command::Quit => Ok(Reply::Quit),
            Command::Load { path, text_column } => {
                let loaded = self.load(&path, text_column.as_deref())?;
                Ok(Reply::Loaded {
                    path: loaded.path.clone(),
                    records: loaded.table.len(),
                    columns: loaded.table.headers.len(),
                    text_column: loaded.table.text_header().to_string(),
                    dropped_coding_column: loaded.dropped_coding_column,
                })
            }
            Command::Code { code } => {
                let (code, created) = self.declare_code(&code)?;
                Ok(Reply::CodeDeclared { code, created })
            }
            Command::Add { code, phrase } => {
                let (code, added) = self.add_phrase(&code, &phrase)?;
                Ok(Reply::PhraseAdded {
                    code,
                    phrase,
                    added,
                })
            }
            Command::Remove { code, phrase } => {
                let (code, removed) = self.remove_phrase(&code, &phrase)?;
                Ok(Reply::PhraseRemoved {
                    code,
                    phrase,
                    removed,
                })
            }
            Command::Rules => {
                self.ensure_unlocked()?;
                Ok(Reply::Rules)
            }
            Command::Fallback { policy } => {
                self.set_fallback(policy)?;
                Ok(Reply::FallbackSet(policy))
            }
            Command::Finalize => {
                let finalized = self.finalize()?;
                Ok(Reply::Finalized {
                    records: finalized.table.len(),
                    unmatched: finalized.unmatched,
                    policy: finalized.policy,
                })
            }
            Command::Preview { rows } => {
                self.ensure_unlocked()?;
                self.source.as_ref().ok_or(SessionError::NoSource)?;
                Ok(Reply::Preview {
                    rows: rows.unwrap_or(self.settings.display.preview_rows),
                })
            }
            Command::Summary => {
                self.ensure_unlocked()?;
                self.finalized.as_ref().ok_or(SessionError::NotFinalized)?;
                Ok(Reply::Summary)
            }
            Command::Export { format, path } => {
                let path = self.export(format, path.as_deref())?;
                Ok(Reply::Exported { path, format })
            }
        }
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.unlocked {
            Ok(())
        } else {
            Err(SessionError::AccessDenied)
        }
    }

    /// Rule edits need a loaded table to apply to.
    fn ensure_editable(&self) -> Result<()> {
        self.ensure_unlocked()?;
        if self.source.is_none() {
            return Err(SessionError::NoSource);
        }
        Ok(())
    }
}
