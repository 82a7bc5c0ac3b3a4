//! Relative Comparison Step
//!
//! `expr OP threshold[offset]` evaluates `expr` for the current interval and
//! for the interval shifted by `offset`, matches the two by label set, and
//! keeps rows whose relative change passes the threshold:
//!
//! ```text
//! delta = (current - base) / base
//! keep  = OP(delta, threshold)
//! ```
//!
//! Output columns are the key columns, the current value column, the base
//! value column named by the offset text (e.g. `-1d`) and `delta`.

use crate::expression::ComparisonOp;
use crate::pipeline::error::QueryResult;
use crate::pipeline::join;
use crate::pipeline::result::PipelineQueryResult;
use crate::pipeline::step::{BoxedStep, Step};
use crate::table::Column;
use async_trait::async_trait;

/// Name of the relative-change column
pub const DELTA_COLUMN: &str = "delta";

/// Step comparing a series with its time-shifted self
pub struct RelativeComparisonStep {
    op: ComparisonOp,
    threshold: f64,
    offset: String,
    offset_ms: i64,
    current: BoxedStep,
    base: BoxedStep,
}

impl RelativeComparisonStep {
    /// `current` and `base` are the same expression compiled for the current
    /// and the shifted interval
    pub fn new(
        op: ComparisonOp,
        threshold: f64,
        offset: impl Into<String>,
        offset_ms: i64,
        current: BoxedStep,
        base: BoxedStep,
    ) -> Self {
        Self {
            op,
            threshold,
            offset: offset.into(),
            offset_ms,
            current,
            base,
        }
    }
}

#[async_trait]
impl Step for RelativeComparisonStep {
    fn name(&self) -> &'static str {
        "relative"
    }

    async fn execute(&self) -> QueryResult<PipelineQueryResult> {
        let (current, base) = tokio::try_join!(self.current.execute(), self.base.execute())?;
        let result = compare_relative(
            self.op,
            self.threshold,
            &self.offset,
            self.offset_ms,
            &current,
            &base,
        )?;
        tracing::trace!(
            op = %self.op,
            threshold = self.threshold,
            offset = %self.offset,
            rows = result.row_count(),
            "Relative comparison completed"
        );
        Ok(result)
    }
}

/// Match `current` with `base` and keep rows where `op(delta, threshold)`
///
/// Base timestamps are shifted by `-offset_ms` so that buckets line up with
/// the current interval.
pub fn compare_relative(
    op: ComparisonOp,
    threshold: f64,
    offset: &str,
    offset_ms: i64,
    current: &PipelineQueryResult,
    base: &PipelineQueryResult,
) -> QueryResult<PipelineQueryResult> {
    let joined = join::match_rows(current, base, -offset_ms)?;
    let current_values = current.value_column();
    let base_values = base.value_column();

    let mut kept = Vec::new();
    let mut deltas = Vec::new();
    for &(c, b) in &joined.pairs {
        let curr = current_values.get_double(c);
        let prev = base_values.get_double(b);
        let delta = (curr - prev) / prev;
        if op.compare_f64(delta, threshold) {
            kept.push((c, b));
            deltas.push(delta);
        }
    }

    let kept = join::JoinedRows {
        pairs: kept,
        ..joined
    };
    let mut table = kept.key_table(current)?;
    table.add_column(current_values.take(&kept.left_rows()))?;
    table.add_column(base_values.take(&kept.right_rows()).renamed(offset))?;
    table.add_column(Column::double(DELTA_COLUMN, deltas))?;

    PipelineQueryResult::new(
        table,
        kept.dimensions,
        vec![
            current.value_name().to_string(),
            offset.to_string(),
            DELTA_COLUMN.to_string(),
        ],
    )
}
