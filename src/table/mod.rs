//! Columnar Result Tables
//!
//! - **column**: typed column buffers (LONG, DOUBLE, STRING) with coercing accessors
//! - **table**: equal-length named columns, optional `_timestamp`
//! - **error**: error types
//!
//! # Layout
//!
//! ```text
//! _timestamp (LONG) | <dimension> (STRING)... | <value> (LONG|DOUBLE)...
//! ```

pub mod column;
pub mod error;
#[allow(clippy::module_inception)]
pub mod table;

pub use column::{Column, ColumnBuilder, ColumnData, ColumnType};
pub use error::{TableError, TableResult};
pub use table::{Table, TIMESTAMP_COLUMN};
