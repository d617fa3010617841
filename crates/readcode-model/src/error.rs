use thiserror::Error;

/// Operator input that is not an integer code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid code {input:?}: codes must be integers")]
pub struct InvalidCodeInput {
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("table has no columns")]
    NoColumns,

    #[error("text column index {index} is out of range for {columns} column(s)")]
    TextColumnOutOfRange { index: usize, columns: usize },

    #[error("record {row} has {actual} cell(s), expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}
