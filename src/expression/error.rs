//! Expression error types

use thiserror::Error;

/// Errors raised while parsing a literal token
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiteralError {
    #[error("Empty literal")]
    Empty,

    /// Text is not a number
    #[error("Invalid literal: {0}")]
    Invalid(String),

    /// Number followed by an unsupported unit
    #[error("Unknown unit '{suffix}' in literal '{literal}'")]
    UnknownSuffix { literal: String, suffix: String },

    /// Size and duration units require an integer
    #[error("Unit literal must be an integer: {0}")]
    FractionalUnit(String),

    /// Value does not fit in a LONG
    #[error("Literal out of range: {0}")]
    Overflow(String),
}

/// Result type for literal parsing
pub type LiteralResult<T> = Result<T, LiteralError>;
