//! Persistent settings.
//!
//! Settings are read from `--config PATH` when given, otherwise from
//! `settings.toml` in the platform-specific config folder:
//! - macOS: ~/Library/Application Support/org.readcode.readcode/
//! - Windows: %APPDATA%/readcode/readcode/config/
//! - Linux: ~/.config/readcode/

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use readcode_model::{ExportFormat, FallbackPolicy};
use readcode_output::DEFAULT_SHEET_NAME;

const APP_QUALIFIER: &str = "org";
const APP_ORG: &str = "readcode";
const APP_NAME: &str = "readcode";
const CONFIG_FILENAME: &str = "settings.toml";

/// Default file stem for exported tables.
pub const DEFAULT_FILE_STEM: &str = "coded_data";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub coding: CodingSettings,
    pub export: ExportSettings,
    pub access: AccessSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodingSettings {
    pub fallback: FallbackPolicy,
    /// Header of the column holding report text; the first column when unset.
    pub text_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub file_stem: String,
    pub sheet_name: String,
    /// Directory for exports without an explicit path; the working directory when unset.
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            file_stem: DEFAULT_FILE_STEM.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            output_dir: None,
        }
    }
}

impl ExportSettings {
    /// Where an export lands when the operator gives no path.
    pub fn default_path(&self, format: ExportFormat) -> PathBuf {
        let file_name = format.file_name(&self.file_stem);
        match &self.output_dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessSettings {
    /// Shared secret required by `login` before any other command.
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub preview_rows: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { preview_rows: 10 }
    }
}

/// Get the path to the settings file.
///
/// Returns `None` if the platform-specific directory cannot be determined.
pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Parse settings from TOML text.
pub fn parse_settings(content: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str(content)
}

/// Load settings.
///
/// An explicit path must exist and parse. The platform settings file is
/// optional: when it is missing or unreadable, defaults are used.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    if let Some(path) = explicit {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = parse_settings(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loaded settings");
        return Ok(settings);
    }

    let Some(path) = settings_path() else {
        tracing::warn!("could not determine settings path, using defaults");
        return Ok(Settings::default());
    };

    match fs::read_to_string(&path) {
        Ok(content) => match parse_settings(&content) {
            Ok(settings) => {
                tracing::info!(path = %path.display(), "loaded settings");
                Ok(settings)
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to parse settings, using defaults");
                Ok(Settings::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            Ok(Settings::default())
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "failed to read settings, using defaults");
            Ok(Settings::default())
        }
    }
}
