//! Operator-selectable behaviour for finalize and export.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How records matched by no rule are labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// Unmatched records are coded 0.
    #[default]
    #[serde(rename = "zero")]
    ZeroFill,
    /// Unmatched records stay unset and export as empty cells.
    #[serde(rename = "missing")]
    MissingFill,
}

impl FallbackPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZeroFill => "zero",
            Self::MissingFill => "missing",
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Ok(Self::ZeroFill),
            "missing" | "none" => Ok(Self::MissingFill),
            other => Err(format!(
                "unknown fallback policy {other:?} (expected zero or missing)"
            )),
        }
    }
}

/// Interchange format for the labeled table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated UTF-8 text.
    #[default]
    Csv,
    /// Office Open XML spreadsheet with a single sheet.
    Xlsx,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// File name for a download, e.g. `coded_data.csv`.
    pub fn file_name(self, stem: &str) -> String {
        format!("{stem}.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(format!(
                "unknown export format {other:?} (expected csv or xlsx)"
            )),
        }
    }
}
