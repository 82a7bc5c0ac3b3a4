//! Metric Query Step
//!
//! Sends one pre-built request to the data source and wraps the response.
//! STRING columns of the response become dimension columns; the column named
//! after the metric field becomes the primary value column.

use crate::datasource::{DataSource, QueryRequest};
use crate::pipeline::error::{QueryError, QueryResult};
use crate::pipeline::result::PipelineQueryResult;
use crate::pipeline::step::Step;
use crate::table::{Column, ColumnType, Table};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Step querying the data source
pub struct MetricQueryStep {
    data_source: Arc<dyn DataSource>,
    request: QueryRequest,
}

impl MetricQueryStep {
    pub fn new(data_source: Arc<dyn DataSource>, request: QueryRequest) -> Self {
        Self {
            data_source,
            request,
        }
    }

    /// The request sent on every execution
    pub fn request(&self) -> &QueryRequest {
        &self.request
    }

    fn wrap(&self, table: Table) -> QueryResult<PipelineQueryResult> {
        let metric = &self.request.field.name;

        // An empty answer may come back without metadata
        if table.row_count() == 0 && table.get_column(metric).is_none() {
            let mut columns: Vec<Column> = self
                .request
                .group_by
                .iter()
                .map(|d| Column::empty(d.clone(), ColumnType::String))
                .collect();
            columns.push(Column::empty(metric.clone(), ColumnType::Double));
            let table = Table::from_columns(columns)?;
            return PipelineQueryResult::new(
                table,
                self.request.group_by.clone(),
                vec![metric.clone()],
            );
        }

        let mut values = table.numeric_column_names();
        match values.iter().position(|v| v == metric) {
            Some(pos) => {
                let primary = values.remove(pos);
                values.insert(0, primary);
            }
            None => {
                return Err(QueryError::InvalidOperand(format!(
                    "response for '{}' has no '{}' column",
                    self.data_source.name(),
                    metric
                )))
            }
        }

        let dimensions = table.string_column_names();
        PipelineQueryResult::new(table, dimensions, values)
    }
}

#[async_trait]
impl Step for MetricQueryStep {
    fn name(&self) -> &'static str {
        "metric"
    }

    async fn execute(&self) -> QueryResult<PipelineQueryResult> {
        let start = Instant::now();
        let response = self.data_source.timeseries(self.request.clone()).await?;
        let result = self.wrap(response.into_table()?)?;

        tracing::debug!(
            data_source = %self.request.data_source,
            metric = %self.request.field.name,
            offset = ?self.request.interval.offset,
            rows = result.row_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Metric query completed"
        );
        Ok(result)
    }
}
