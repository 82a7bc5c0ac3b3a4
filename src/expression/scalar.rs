//! Typed scalar values and numeric promotion
//!
//! LONG ⊕ LONG stays LONG; as soon as one side is DOUBLE both sides are
//! widened and the result is DOUBLE.

use crate::expression::operator::{ArithmeticOp, ComparisonOp};
use crate::table::ColumnType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single LONG or DOUBLE value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "UPPERCASE")]
pub enum Scalar {
    Long(i64),
    Double(f64),
}

impl Scalar {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Long(_) => ColumnType::Long,
            Self::Double(_) => ColumnType::Double,
        }
    }

    pub fn as_long(&self) -> i64 {
        match self {
            Self::Long(v) => *v,
            Self::Double(v) => *v as i64,
        }
    }

    pub fn as_double(&self) -> f64 {
        match self {
            Self::Long(v) => *v as f64,
            Self::Double(v) => *v,
        }
    }

    /// Apply an arithmetic operator with type promotion
    ///
    /// Returns `None` for LONG division by zero.
    pub fn apply(&self, op: ArithmeticOp, other: &Scalar) -> Option<Scalar> {
        match (self, other) {
            (Self::Long(a), Self::Long(b)) => op.apply_long(*a, *b).map(Self::Long),
            (a, b) => Some(Self::Double(op.apply_double(a.as_double(), b.as_double()))),
        }
    }

    /// Compare with type promotion
    pub fn compare(&self, op: ComparisonOp, other: &Scalar) -> bool {
        match (self, other) {
            (Self::Long(a), Self::Long(b)) => op.compare_long(*a, *b),
            (a, b) => op.compare_f64(a.as_double(), b.as_double()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

/// Result column type of an arithmetic operation between two column types
///
/// Returns `None` if either side is not numeric.
pub fn promote(left: ColumnType, right: ColumnType) -> Option<ColumnType> {
    match (left, right) {
        (ColumnType::Long, ColumnType::Long) => Some(ColumnType::Long),
        (ColumnType::String, _) | (_, ColumnType::String) => None,
        _ => Some(ColumnType::Double),
    }
}
