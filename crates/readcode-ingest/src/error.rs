#![deny(unsafe_code)]

use std::path::PathBuf;

use readcode_model::TableError;

/// Reasons a source table cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("unsupported source format for {path} (expected .csv or .xlsx)")]
    UnsupportedFormat { path: PathBuf },

    #[error("workbook {path} has no worksheets")]
    EmptyWorkbook { path: PathBuf },

    #[error("{path} has no header row")]
    MissingHeader { path: PathBuf },

    #[error("text column {column:?} not found in {path} (columns: {available})")]
    UnknownTextColumn {
        path: PathBuf,
        column: String,
        available: String,
    },

    #[error("invalid table in {path}: {source}")]
    Table {
        path: PathBuf,
        #[source]
        source: TableError,
    },
}

impl IngestError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn workbook(path: impl Into<PathBuf>, source: calamine::XlsxError) -> Self {
        Self::Workbook {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
