//! Step results and shape classification

use crate::expression::Scalar;
use crate::pipeline::error::{QueryError, QueryResult};
use crate::table::{Column, Table, TIMESTAMP_COLUMN};
use std::collections::HashSet;

/// Name of the value column produced by literals and by combining two series
pub const VALUE_COLUMN: &str = "value";

/// Shape of an intermediate result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// No dimension columns and exactly one row
    Scalar,
    /// Rows keyed by dimension values, and by `_timestamp` across buckets
    Vector,
}

/// The output of one step execution
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineQueryResult {
    table: Table,
    dimensions: Vec<String>,
    values: Vec<String>,
}

impl PipelineQueryResult {
    /// Wrap a table
    ///
    /// `dimensions` name the STRING key columns; `values` name the numeric
    /// value columns, the first being the one operators consume.
    pub fn new(table: Table, dimensions: Vec<String>, values: Vec<String>) -> QueryResult<Self> {
        for name in dimensions.iter().chain(&values) {
            table.column(name)?;
        }
        match values.first() {
            None => {
                return Err(QueryError::InvalidOperand(
                    "result has no value column".to_string(),
                ))
            }
            Some(name) => {
                let column = table.column(name)?;
                if !column.column_type().is_numeric() {
                    return Err(QueryError::InvalidOperand(format!(
                        "value column '{}' is {}, expected LONG or DOUBLE",
                        name,
                        column.column_type()
                    )));
                }
            }
        }

        Ok(Self {
            table,
            dimensions,
            values,
        })
    }

    /// A single-row result holding `value`
    pub fn scalar(value: Scalar) -> Self {
        let column = match value {
            Scalar::Long(v) => Column::long(VALUE_COLUMN, vec![v]),
            Scalar::Double(v) => Column::double(VALUE_COLUMN, vec![v]),
        };
        Self {
            table: Table::from_column(column),
            dimensions: Vec::new(),
            values: vec![VALUE_COLUMN.to_string()],
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Names of the dimension columns
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Names of the value columns
    pub fn value_columns(&self) -> &[String] {
        &self.values
    }

    /// Name of the primary value column
    pub fn value_name(&self) -> &str {
        &self.values[0]
    }

    /// The primary value column
    pub fn value_column(&self) -> &Column {
        self.table
            .get_column(self.value_name())
            .unwrap_or_else(|| unreachable!("value column checked at construction"))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.table.get_column(name)
    }

    pub fn timestamp_column(&self) -> Option<&Column> {
        self.table.get_column(TIMESTAMP_COLUMN)
    }

    pub fn shape(&self) -> Shape {
        if self.dimensions.is_empty() && self.row_count() == 1 {
            Shape::Scalar
        } else {
            Shape::Vector
        }
    }

    /// Whether some series spans more than one bucket
    ///
    /// Only `dimensions` (a subset of this result's dimension columns) are
    /// considered when identifying a series.
    pub fn has_multiple_buckets(&self, dimensions: &[String]) -> bool {
        if self.timestamp_column().is_none() {
            return false;
        }
        let columns: Vec<&Column> = dimensions
            .iter()
            .filter_map(|d| self.table.get_column(d))
            .collect();
        let mut seen = HashSet::new();
        (0..self.row_count()).any(|row| {
            let key: Vec<String> = columns.iter().map(|c| c.get_string(row)).collect();
            !seen.insert(key)
        })
    }

    /// Keep the rows at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            table: self.table.take(indices),
            dimensions: self.dimensions.clone(),
            values: self.values.clone(),
        }
    }
}
