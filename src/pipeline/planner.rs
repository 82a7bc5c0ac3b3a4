//! Query Planner
//!
//! Walks an [`Expression`] and emits one [`Step`](crate::pipeline::Step) per
//! node, binding metric leaves to the evaluation interval.
//!
//! # Compilation
//!
//! ```text
//! Literal             → LiteralQueryStep (over the interval when it is the whole expression)
//! Metric              → MetricQueryStep
//! Arithmetic          → ArithmeticStep(lhs, rhs)
//! Comparison          → FilterStep(lhs, rhs)
//! RelativeComparison  → RelativeComparisonStep(lhs @ interval, lhs @ interval+offset)
//! ```

use crate::datasource::{DataSource, IntervalRequest, QueryField, QueryRequest};
use crate::expression::{Expression, Literal, MetricExpression};
use crate::pipeline::arithmetic::ArithmeticStep;
use crate::pipeline::error::{QueryError, QueryResult};
use crate::pipeline::filter::FilterStep;
use crate::pipeline::literal::LiteralQueryStep;
use crate::pipeline::metric::MetricQueryStep;
use crate::pipeline::relative::RelativeComparisonStep;
use crate::pipeline::step::BoxedStep;
use std::sync::Arc;

/// Data source name used when neither the selector nor the planner names one
pub const DEFAULT_DATA_SOURCE: &str = "metrics";

/// Compiles expressions into step trees
#[derive(Clone)]
pub struct QueryPlanner {
    data_source: Arc<dyn DataSource>,
    default_data_source: String,
}

impl QueryPlanner {
    pub fn new(data_source: Arc<dyn DataSource>) -> Self {
        Self {
            data_source,
            default_data_source: DEFAULT_DATA_SOURCE.to_string(),
        }
    }

    /// Data source for metric selectors that do not name one
    pub fn with_default_data_source(mut self, name: impl Into<String>) -> Self {
        self.default_data_source = name.into();
        self
    }

    /// Compile `expression` for `interval`
    pub fn compile(
        &self,
        expression: &Expression,
        interval: &IntervalRequest,
    ) -> QueryResult<BoxedStep> {
        match expression {
            // a bare literal is reported per bucket, like a metric
            Expression::Literal(literal) => Ok(Box::new(LiteralQueryStep::over_interval(
                literal.value,
                interval.clone(),
            ))),
            other => self.compile_node(other, interval),
        }
    }

    fn compile_node(
        &self,
        expression: &Expression,
        interval: &IntervalRequest,
    ) -> QueryResult<BoxedStep> {
        let step: BoxedStep = match expression {
            Expression::Literal(literal) => Box::new(LiteralQueryStep::scalar(literal.value)),
            Expression::Metric(metric) => Box::new(MetricQueryStep::new(
                self.data_source.clone(),
                self.build_request(metric, interval)?,
            )),
            Expression::Arithmetic { op, lhs, rhs } => Box::new(ArithmeticStep::new(
                *op,
                self.compile_node(lhs, interval)?,
                self.compile_node(rhs, interval)?,
            )),
            Expression::Comparison { op, lhs, rhs } => Box::new(FilterStep::new(
                *op,
                self.compile_node(lhs, interval)?,
                self.compile_node(rhs, interval)?,
            )),
            Expression::RelativeComparison {
                op,
                lhs,
                threshold,
                offset,
            } => {
                let offset_secs = duration_secs(offset, "offset")?;
                let shifted = interval.with_offset(offset.text.clone());
                Box::new(RelativeComparisonStep::new(
                    *op,
                    threshold.value.as_double(),
                    offset.text.clone(),
                    offset_secs.saturating_mul(1000),
                    self.compile_node(lhs, interval)?,
                    self.compile_node(lhs, &shifted)?,
                ))
            }
        };
        Ok(step)
    }

    /// Build the data source request for a metric leaf
    pub fn build_request(
        &self,
        metric: &MetricExpression,
        interval: &IntervalRequest,
    ) -> QueryResult<QueryRequest> {
        if metric.metric.is_empty() {
            return Err(QueryError::InvalidExpression(
                "metric name is empty".to_string(),
            ));
        }
        let window_secs = metric
            .window
            .as_ref()
            .map(|w| duration_secs(w, "window"))
            .transpose()?;

        Ok(QueryRequest {
            data_source: metric
                .data_source
                .clone()
                .unwrap_or_else(|| self.default_data_source.clone()),
            field: QueryField {
                name: metric.metric.clone(),
                aggregator: metric.aggregator,
                window_secs,
            },
            filter_expression: metric.filter_expression(),
            group_by: metric.group_by.clone(),
            interval: interval.clone(),
        })
    }
}

fn duration_secs(literal: &Literal, what: &str) -> QueryResult<i64> {
    literal.duration_secs().ok_or_else(|| {
        QueryError::InvalidExpression(format!(
            "{} must be a duration, got '{}'",
            what, literal.text
        ))
    })
}
