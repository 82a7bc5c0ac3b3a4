//! Pipeline error types
//!
//! Defines all error conditions that can occur while compiling or executing a
//! step tree.

use thiserror::Error;

/// Errors that can occur during expression evaluation
#[derive(Error, Debug)]
pub enum QueryError {
    /// External data source failed
    #[error("Data source error: {0}")]
    DataSource(#[from] crate::datasource::DataSourceError),

    /// Result table could not be assembled
    #[error("Table error: {0}")]
    Table(#[from] crate::table::TableError),

    /// Literal text could not be parsed
    #[error("Literal error: {0}")]
    Literal(#[from] crate::expression::LiteralError),

    /// Expression tree is not valid for compilation
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// An operand column cannot take part in the operation
    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    /// Integer division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Several series on one side of a join share a key
    #[error("Duplicate series on the {side} side of a join: {key}")]
    DuplicateSeries { side: &'static str, key: String },
}

/// Result type for pipeline operations
pub type QueryResult<T> = Result<T, QueryError>;
