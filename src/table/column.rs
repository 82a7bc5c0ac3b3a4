//! Typed columns
//!
//! A column is a named, immutable buffer of LONG, DOUBLE or STRING values.
//! Accessors coerce between the three types so callers can read any column
//! uniformly regardless of how the data source declared it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    /// 64-bit signed integer
    Long,
    /// 64-bit IEEE 754 float
    Double,
    /// UTF-8 text, used for dimensions
    String,
}

impl ColumnType {
    /// Parse a declared type name (`LONG`, `DOUBLE`, `STRING`)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LONG" | "INT" | "INTEGER" => Some(Self::Long),
            "DOUBLE" | "FLOAT" => Some(Self::Double),
            "STRING" => Some(Self::String),
            _ => None,
        }
    }

    /// Whether values of this type can take part in arithmetic
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Long | Self::Double)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Double => write!(f, "DOUBLE"),
            Self::String => write!(f, "STRING"),
        }
    }
}

/// Storage for a column's values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "UPPERCASE")]
pub enum ColumnData {
    Long(Vec<i64>),
    Double(Vec<f64>),
    String(Vec<String>),
}

impl ColumnData {
    /// Create an empty buffer of the given type
    pub fn empty(column_type: ColumnType) -> Self {
        Self::with_capacity(column_type, 0)
    }

    /// Create an empty buffer of the given type with reserved capacity
    pub fn with_capacity(column_type: ColumnType, capacity: usize) -> Self {
        match column_type {
            ColumnType::Long => Self::Long(Vec::with_capacity(capacity)),
            ColumnType::Double => Self::Double(Vec::with_capacity(capacity)),
            ColumnType::String => Self::String(Vec::with_capacity(capacity)),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Long(_) => ColumnType::Long,
            Self::Double(_) => ColumnType::Double,
            Self::String(_) => ColumnType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Long(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    #[serde(flatten)]
    data: ColumnData,
}

impl Column {
    /// Create a column from existing data
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn long(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(name, ColumnData::Long(values))
    }

    pub fn double(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, ColumnData::Double(values))
    }

    pub fn string<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self::new(
            name,
            ColumnData::String(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Create an empty column of the given type
    pub fn empty(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::new(name, ColumnData::empty(column_type))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Number of values (row count)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return a copy of this column under a different name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: self.data.clone(),
        }
    }

    /// Read a value as LONG
    ///
    /// DOUBLE values truncate toward zero, text is parsed and falls back to 0.
    ///
    /// # Panics
    /// Panics if `row` is out of bounds.
    pub fn get_long(&self, row: usize) -> i64 {
        match &self.data {
            ColumnData::Long(v) => v[row],
            ColumnData::Double(v) => v[row] as i64,
            ColumnData::String(v) => {
                let text = v[row].trim();
                text.parse::<i64>()
                    .or_else(|_| text.parse::<f64>().map(|d| d as i64))
                    .unwrap_or(0)
            }
        }
    }

    /// Read a value as DOUBLE
    ///
    /// # Panics
    /// Panics if `row` is out of bounds.
    pub fn get_double(&self, row: usize) -> f64 {
        match &self.data {
            ColumnData::Long(v) => v[row] as f64,
            ColumnData::Double(v) => v[row],
            ColumnData::String(v) => v[row].trim().parse::<f64>().unwrap_or(0.0),
        }
    }

    /// Read a value as text
    ///
    /// # Panics
    /// Panics if `row` is out of bounds.
    pub fn get_string(&self, row: usize) -> String {
        match &self.data {
            ColumnData::Long(v) => v[row].to_string(),
            ColumnData::Double(v) => v[row].to_string(),
            ColumnData::String(v) => v[row].clone(),
        }
    }

    /// Build a new column holding the rows at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> Self {
        let data = match &self.data {
            ColumnData::Long(v) => ColumnData::Long(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Double(v) => ColumnData::Double(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::String(v) => {
                ColumnData::String(indices.iter().map(|&i| v[i].clone()).collect())
            }
        };
        Self {
            name: self.name.clone(),
            data,
        }
    }
}

/// Incremental builder for a typed column
///
/// Values are coerced to the builder's declared type on push.
#[derive(Debug)]
pub struct ColumnBuilder {
    name: String,
    data: ColumnData,
}

impl ColumnBuilder {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::with_capacity(name, column_type, 0)
    }

    pub fn with_capacity(name: impl Into<String>, column_type: ColumnType, capacity: usize) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::with_capacity(column_type, capacity),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn push_long(&mut self, value: i64) {
        match &mut self.data {
            ColumnData::Long(v) => v.push(value),
            ColumnData::Double(v) => v.push(value as f64),
            ColumnData::String(v) => v.push(value.to_string()),
        }
    }

    pub fn push_double(&mut self, value: f64) {
        match &mut self.data {
            ColumnData::Long(v) => v.push(value as i64),
            ColumnData::Double(v) => v.push(value),
            ColumnData::String(v) => v.push(value.to_string()),
        }
    }

    pub fn push_string(&mut self, value: impl Into<String>) {
        let value = value.into();
        match &mut self.data {
            ColumnData::Long(v) => v.push(value.trim().parse().unwrap_or(0)),
            ColumnData::Double(v) => v.push(value.trim().parse().unwrap_or(0.0)),
            ColumnData::String(v) => v.push(value),
        }
    }

    /// Copy one row from another column, coercing to this builder's type
    pub fn push_from(&mut self, column: &Column, row: usize) {
        match column.data() {
            ColumnData::Long(v) => self.push_long(v[row]),
            ColumnData::Double(v) => self.push_double(v[row]),
            ColumnData::String(v) => self.push_string(v[row].clone()),
        }
    }

    pub fn build(self) -> Column {
        Column::new(self.name, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_coerce() {
        let longs = Column::long("count", vec![3, -7]);
        assert_eq!(longs.get_long(1), -7);
        assert_eq!(longs.get_double(0), 3.0);
        assert_eq!(longs.get_string(0), "3");

        let doubles = Column::double("cpu", vec![2.75, -1.5]);
        assert_eq!(doubles.get_long(0), 2);
        assert_eq!(doubles.get_long(1), -1);
        assert_eq!(doubles.get_double(1), -1.5);

        let text = Column::string("appName", vec!["12", "app1"]);
        assert_eq!(text.get_long(0), 12);
        assert_eq!(text.get_long(1), 0);
        assert_eq!(text.get_string(1), "app1");
    }

    #[test]
    fn test_empty_column() {
        let column = Column::empty("value", ColumnType::Double);
        assert_eq!(column.len(), 0);
        assert!(column.is_empty());
        assert_eq!(column.column_type(), ColumnType::Double);
    }

    #[test]
    fn test_take_preserves_order_of_indices() {
        let column = Column::string("appName", vec!["a", "b", "c", "d"]);
        let taken = column.take(&[3, 1]);
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.get_string(0), "d");
        assert_eq!(taken.get_string(1), "b");
        assert_eq!(taken.name(), "appName");
    }

    #[test]
    fn test_builder_coerces_to_declared_type() {
        let mut builder = ColumnBuilder::new("value", ColumnType::Double);
        builder.push_long(4);
        builder.push_double(0.5);
        let column = builder.build();
        assert_eq!(column.data(), &ColumnData::Double(vec![4.0, 0.5]));
    }

    #[test]
    fn test_column_type_from_str() {
        assert_eq!(ColumnType::from_str("long"), Some(ColumnType::Long));
        assert_eq!(ColumnType::from_str("DOUBLE"), Some(ColumnType::Double));
        assert_eq!(ColumnType::from_str("String"), Some(ColumnType::String));
        assert_eq!(ColumnType::from_str("blob"), None);
    }

    #[test]
    fn test_column_serialization() {
        let column = Column::long("value", vec![1, 2]);
        let json = serde_json::to_value(&column).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "value", "type": "LONG", "values": [1, 2]})
        );
    }
}
