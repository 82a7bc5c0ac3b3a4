//! Literal Query Step
//!
//! Emits a typed constant. Without an interval the result is a one-row
//! scalar; with one, the constant is repeated once per bucket under a
//! `_timestamp` column so it can stand alone as a series.

use crate::datasource::IntervalRequest;
use crate::expression::Scalar;
use crate::pipeline::error::QueryResult;
use crate::pipeline::result::{PipelineQueryResult, VALUE_COLUMN};
use crate::pipeline::step::Step;
use crate::table::{Column, Table, TIMESTAMP_COLUMN};
use async_trait::async_trait;

/// Step producing a constant
#[derive(Debug, Clone)]
pub struct LiteralQueryStep {
    value: Scalar,
    interval: Option<IntervalRequest>,
}

impl LiteralQueryStep {
    /// A single-row scalar step
    pub fn scalar(value: Scalar) -> Self {
        Self {
            value,
            interval: None,
        }
    }

    /// A step repeating `value` for every bucket of `interval`
    pub fn over_interval(value: Scalar, interval: IntervalRequest) -> Self {
        Self {
            value,
            interval: Some(interval),
        }
    }

    pub fn value(&self) -> Scalar {
        self.value
    }
}

#[async_trait]
impl Step for LiteralQueryStep {
    fn name(&self) -> &'static str {
        "literal"
    }

    async fn execute(&self) -> QueryResult<PipelineQueryResult> {
        let interval = match &self.interval {
            None => return Ok(PipelineQueryResult::scalar(self.value)),
            Some(interval) => interval,
        };

        let timestamps = interval.bucket_timestamps();
        let rows = timestamps.len();
        let values = match self.value {
            Scalar::Long(v) => Column::long(VALUE_COLUMN, vec![v; rows]),
            Scalar::Double(v) => Column::double(VALUE_COLUMN, vec![v; rows]),
        };
        let table = Table::from_columns(vec![Column::long(TIMESTAMP_COLUMN, timestamps), values])?;
        PipelineQueryResult::new(table, Vec::new(), vec![VALUE_COLUMN.to_string()])
    }
}
