//! Arithmetic Step
//!
//! Combines two results with `+ - * /`:
//!
//! | left   | right  | output                                              |
//! |--------|--------|-----------------------------------------------------|
//! | scalar | scalar | one row, column `value`                             |
//! | vector | scalar | every vector row, vector's value column name kept   |
//! | scalar | vector | same, operand order preserved                       |
//! | vector | vector | inner join on shared labels, column `value`         |
//!
//! The output column type follows the two input columns' declared types:
//! LONG only when both are LONG.

use crate::expression::{promote, ArithmeticOp};
use crate::pipeline::error::{QueryError, QueryResult};
use crate::pipeline::join;
use crate::pipeline::result::{PipelineQueryResult, Shape, VALUE_COLUMN};
use crate::pipeline::step::{BoxedStep, Step};
use crate::table::{Column, ColumnType, Table};
use async_trait::async_trait;

/// Step applying an arithmetic operator to its two children
pub struct ArithmeticStep {
    op: ArithmeticOp,
    lhs: BoxedStep,
    rhs: BoxedStep,
}

impl ArithmeticStep {
    pub fn new(op: ArithmeticOp, lhs: BoxedStep, rhs: BoxedStep) -> Self {
        Self { op, lhs, rhs }
    }
}

#[async_trait]
impl Step for ArithmeticStep {
    fn name(&self) -> &'static str {
        "arithmetic"
    }

    async fn execute(&self) -> QueryResult<PipelineQueryResult> {
        let (left, right) = tokio::try_join!(self.lhs.execute(), self.rhs.execute())?;
        let result = combine(self.op, &left, &right)?;
        tracing::trace!(op = %self.op, rows = result.row_count(), "Arithmetic step completed");
        Ok(result)
    }
}

/// Apply `op` to two resolved results
pub fn combine(
    op: ArithmeticOp,
    left: &PipelineQueryResult,
    right: &PipelineQueryResult,
) -> QueryResult<PipelineQueryResult> {
    match (left.shape(), right.shape()) {
        (Shape::Scalar, Shape::Scalar) => {
            let value = apply(op, VALUE_COLUMN, left.value_column(), right.value_column(), &[(0, 0)])?;
            let table = Table::from_columns(vec![value])?;
            PipelineQueryResult::new(table, Vec::new(), vec![VALUE_COLUMN.to_string()])
        }
        (Shape::Vector, Shape::Scalar) => {
            let pairs: Vec<(usize, usize)> = (0..left.row_count()).map(|row| (row, 0)).collect();
            let value = apply(op, left.value_name(), left.value_column(), right.value_column(), &pairs)?;
            broadcast(left, value)
        }
        (Shape::Scalar, Shape::Vector) => {
            let pairs: Vec<(usize, usize)> = (0..right.row_count()).map(|row| (0, row)).collect();
            let value = apply(op, right.value_name(), left.value_column(), right.value_column(), &pairs)?;
            broadcast(right, value)
        }
        (Shape::Vector, Shape::Vector) => {
            let joined = join::match_rows(left, right, 0)?;
            let value = apply(
                op,
                VALUE_COLUMN,
                left.value_column(),
                right.value_column(),
                &joined.pairs,
            )?;
            let mut table = joined.key_table(left)?;
            table.add_column(value)?;
            PipelineQueryResult::new(table, joined.dimensions, vec![VALUE_COLUMN.to_string()])
        }
    }
}

/// The vector's key columns followed by the recomputed value column
fn broadcast(vector: &PipelineQueryResult, value: Column) -> QueryResult<PipelineQueryResult> {
    let mut table = Table::new();
    if let Some(ts) = vector.timestamp_column() {
        table.add_column(ts.clone())?;
    }
    for dim in vector.dimensions() {
        table.add_column(vector.table().column(dim)?.clone())?;
    }
    let name = value.name().to_string();
    table.add_column(value)?;
    PipelineQueryResult::new(table, vector.dimensions().to_vec(), vec![name])
}

/// Compute `op(left[l], right[r])` for every `(l, r)` pair
fn apply(
    op: ArithmeticOp,
    name: &str,
    left: &Column,
    right: &Column,
    pairs: &[(usize, usize)],
) -> QueryResult<Column> {
    let output = promote(left.column_type(), right.column_type()).ok_or_else(|| {
        QueryError::InvalidOperand(format!(
            "cannot apply '{}' to {} and {}",
            op,
            left.column_type(),
            right.column_type()
        ))
    })?;

    match output {
        ColumnType::Long => {
            let values = pairs
                .iter()
                .map(|&(l, r)| {
                    op.apply_long(left.get_long(l), right.get_long(r))
                        .ok_or(QueryError::DivisionByZero)
                })
                .collect::<QueryResult<Vec<i64>>>()?;
            Ok(Column::long(name, values))
        }
        ColumnType::Double => {
            let values = pairs
                .iter()
                .map(|&(l, r)| op.apply_double(left.get_double(l), right.get_double(r)))
                .collect();
            Ok(Column::double(name, values))
        }
        ColumnType::String => Err(QueryError::InvalidOperand(format!(
            "cannot apply '{}' to STRING values",
            op
        ))),
    }
}
