pub mod code;
pub mod error;
pub mod options;
pub mod table;

pub use code::{Code, Coding};
pub use error::{InvalidCodeInput, TableError};
pub use options::{ExportFormat, FallbackPolicy};
pub use table::{CODING_COLUMN, CellKind, LabeledTable, Record, SourceTable};
