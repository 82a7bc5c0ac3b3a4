//! Columnar table
//!
//! A table is an ordered set of named columns that all share the same length.

use crate::table::column::{Column, ColumnType};
use crate::table::error::{TableError, TableResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the bucket timestamp column
pub const TIMESTAMP_COLUMN: &str = "_timestamp";

/// A set of equal-length named columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create an empty table with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from a list of columns
    pub fn from_columns(columns: Vec<Column>) -> TableResult<Self> {
        let mut table = Self::new();
        for column in columns {
            table.add_column(column)?;
        }
        Ok(table)
    }

    /// A table holding exactly one column
    pub(crate) fn from_column(column: Column) -> Self {
        Self {
            columns: vec![column],
        }
    }

    /// Append a column
    ///
    /// The first column fixes the row count; later columns must match it and
    /// column names must be unique.
    pub fn add_column(&mut self, column: Column) -> TableResult<()> {
        if self.get_column(column.name()).is_some() {
            return Err(TableError::DuplicateColumn(column.name().to_string()));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(TableError::LengthMismatch {
                    column: column.name().to_string(),
                    expected: first.len(),
                    actual: column.len(),
                });
            }
        }
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows (0 for a table without columns)
    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Look up a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Look up a column by name, failing if it is absent
    pub fn column(&self, name: &str) -> TableResult<&Column> {
        self.get_column(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    /// The `_timestamp` column, if the table has one
    pub fn timestamp_column(&self) -> Option<&Column> {
        self.get_column(TIMESTAMP_COLUMN)
    }

    /// Names of STRING columns, in table order
    pub fn string_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.column_type() == ColumnType::String)
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Names of numeric columns other than `_timestamp`, in table order
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.column_type().is_numeric() && c.name() != TIMESTAMP_COLUMN)
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Build a new table with the rows at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.row_count();
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| (0..rows).map(|r| c.get_string(r)).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(c, values)| {
                values
                    .iter()
                    .map(String::len)
                    .chain(std::iter::once(c.name().len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c.name(), w = w))
            .collect();
        writeln!(f, "{}", header.join(" | ").trim_end())?;

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;

        for row in 0..rows {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(values, w)| format!("{:<w$}", values[row], w = w))
                .collect();
            writeln!(f, "{}", line.join(" | ").trim_end())?;
        }
        write!(f, "({} rows)", rows)
    }
}
