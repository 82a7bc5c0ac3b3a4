//! Filter Step
//!
//! `lhs OP rhs` with a comparison operator keeps the rows of the vector
//! operand whose value satisfies the comparison, with all their columns. A
//! scalar on the left is moved to the right by flipping the operator, so
//! `10 < qps` keeps the same rows as `qps > 10`. Two vectors are matched by
//! label set first and rows of the left one are kept.

use crate::expression::ComparisonOp;
use crate::pipeline::error::QueryResult;
use crate::pipeline::join;
use crate::pipeline::result::{PipelineQueryResult, Shape};
use crate::pipeline::step::{BoxedStep, Step};
use crate::table::{Column, ColumnType};
use async_trait::async_trait;

/// Step filtering rows by comparison
pub struct FilterStep {
    op: ComparisonOp,
    lhs: BoxedStep,
    rhs: BoxedStep,
}

impl FilterStep {
    pub fn new(op: ComparisonOp, lhs: BoxedStep, rhs: BoxedStep) -> Self {
        Self { op, lhs, rhs }
    }
}

#[async_trait]
impl Step for FilterStep {
    fn name(&self) -> &'static str {
        "filter"
    }

    async fn execute(&self) -> QueryResult<PipelineQueryResult> {
        let (left, right) = tokio::try_join!(self.lhs.execute(), self.rhs.execute())?;
        let result = filter(self.op, &left, &right)?;
        tracing::trace!(
            op = %self.op,
            input_rows = left.row_count().max(right.row_count()),
            rows = result.row_count(),
            "Filter step completed"
        );
        Ok(result)
    }
}

/// Keep the rows satisfying `op`
pub fn filter(
    op: ComparisonOp,
    left: &PipelineQueryResult,
    right: &PipelineQueryResult,
) -> QueryResult<PipelineQueryResult> {
    match (left.shape(), right.shape()) {
        (_, Shape::Scalar) => {
            let threshold = right.value_column();
            let kept: Vec<usize> = (0..left.row_count())
                .filter(|&row| compare(op, left.value_column(), row, threshold, 0))
                .collect();
            Ok(left.take(&kept))
        }
        (Shape::Scalar, Shape::Vector) => filter(op.flip(), right, left),
        (Shape::Vector, Shape::Vector) => {
            let joined = join::match_rows(left, right, 0)?;
            let kept: Vec<usize> = joined
                .pairs
                .iter()
                .filter(|&&(l, r)| compare(op, left.value_column(), l, right.value_column(), r))
                .map(|&(l, _)| l)
                .collect();
            Ok(left.take(&kept))
        }
    }
}

/// Compare two cells, as integers when both columns are LONG
fn compare(op: ComparisonOp, left: &Column, l: usize, right: &Column, r: usize) -> bool {
    match (left.column_type(), right.column_type()) {
        (ColumnType::Long, ColumnType::Long) => op.compare_long(left.get_long(l), right.get_long(r)),
        _ => op.compare_f64(left.get_double(l), right.get_double(r)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Scalar;
    use crate::table::Table;

    fn apps(names: Vec<&str>, values: Vec<i64>) -> PipelineQueryResult {
        let table = Table::from_columns(vec![
            Column::string("appName", names),
            Column::long("qps", values),
        ])
        .unwrap();
        PipelineQueryResult::new(table, vec!["appName".into()], vec!["qps".into()]).unwrap()
    }

    fn names(result: &PipelineQueryResult) -> Vec<String> {
        let column = result.column("appName").unwrap();
        (0..result.row_count()).map(|row| column.get_string(row)).collect()
    }

    #[test]
    fn test_strict_and_inclusive_bounds() {
        let vector = apps(vec!["app1", "app2", "app3"], vec![5, 20, 25]);
        let twenty = PipelineQueryResult::scalar(Scalar::Long(20));

        let gt = filter(ComparisonOp::Gt, &vector, &twenty).unwrap();
        assert_eq!(names(&gt), vec!["app3"]);

        let gte = filter(ComparisonOp::Gte, &vector, &twenty).unwrap();
        assert_eq!(names(&gte), vec!["app2", "app3"]);

        let eq = filter(ComparisonOp::Eq, &vector, &twenty).unwrap();
        assert_eq!(names(&eq), vec!["app2"]);
    }

    #[test]
    fn test_lte_and_ne() {
        let vector = apps(vec!["app1", "app2", "app3"], vec![5, 20, 25]);
        let twenty = PipelineQueryResult::scalar(Scalar::Long(20));

        let lte = filter(ComparisonOp::Lte, &vector, &twenty).unwrap();
        assert_eq!(names(&lte), vec!["app1", "app2"]);

        let ne = filter(ComparisonOp::Ne, &vector, &twenty).unwrap();
        assert_eq!(names(&ne), vec!["app1", "app3"]);
    }

    #[test]
    fn test_keeps_all_columns() {
        let vector = apps(vec!["app1", "app2"], vec![5, 20]);
        let result = filter(
            ComparisonOp::Lt,
            &vector,
            &PipelineQueryResult::scalar(Scalar::Double(10.5)),
        )
        .unwrap();
        assert_eq!(result.table().column_names(), vec!["appName", "qps"]);
        assert_eq!(result.value_column().get_long(0), 5);
        assert_eq!(result.value_name(), "qps");
    }

    #[test]
    fn test_no_rows_pass() {
        let vector = apps(vec!["app1", "app2"], vec![5, 20]);
        let result = filter(
            ComparisonOp::Gt,
            &vector,
            &PipelineQueryResult::scalar(Scalar::Long(100)),
        )
        .unwrap();
        assert_eq!(result.row_count(), 0);
        assert!(result.value_column().is_empty());
    }

    #[test]
    fn test_scalar_on_left_flips() {
        let vector = apps(vec!["app1", "app2", "app3"], vec![5, 20, 25]);
        let result = filter(
            ComparisonOp::Lt,
            &PipelineQueryResult::scalar(Scalar::Long(10)),
            &vector,
        )
        .unwrap();
        assert_eq!(names(&result), vec!["app2", "app3"]);
        assert_eq!(result.value_name(), "qps");
    }

    #[test]
    fn test_vector_against_vector() {
        let current = apps(vec!["app1", "app2", "app3"], vec![5, 20, 25]);
        let limits = apps(vec!["app3", "app2"], vec![10, 30]);
        let result = filter(ComparisonOp::Gt, &current, &limits).unwrap();
        assert_eq!(names(&result), vec!["app3"]);
        assert_eq!(result.value_column().get_long(0), 25);
    }

    #[test]
    fn test_scalar_scalar() {
        let one = PipelineQueryResult::scalar(Scalar::Long(1));
        let two = PipelineQueryResult::scalar(Scalar::Long(2));
        assert_eq!(filter(ComparisonOp::Lt, &one, &two).unwrap().row_count(), 1);
        assert_eq!(filter(ComparisonOp::Gt, &one, &two).unwrap().row_count(), 0);
    }
}
