//! Data source error types

use thiserror::Error;

/// Errors returned by a data source
#[derive(Error, Debug)]
pub enum DataSourceError {
    /// The queried metric does not exist
    #[error("Metric not found: {0}")]
    MetricNotFound(String),

    /// HTTP request failed
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service returned a non-success status
    #[error("Data source error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// Request timed out
    #[error("Data source request timed out")]
    Timeout,

    /// Service is not reachable
    #[error("Data source unavailable")]
    Unavailable,

    /// Response body could not be turned into a table
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for data source operations
pub type DataSourceResult<T> = Result<T, DataSourceError>;
