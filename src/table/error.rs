//! Table error types

use thiserror::Error;

/// Errors raised while assembling a table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    /// A column's length differs from the table's row count
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Two columns share a name
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// Referenced column does not exist
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;
