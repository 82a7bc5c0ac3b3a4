//! Time-Series Data Source Boundary
//!
//! The evaluation pipeline never aggregates raw samples itself. Each metric
//! leaf builds a [`QueryRequest`] and hands it to a [`DataSource`], which
//! returns bucketed rows plus column metadata:
//!
//! ```text
//! QueryRequest { dataSource, field, filterExpression, groupBy, interval }
//!     → QueryResponse { meta: [{name, type}], data: [{name: value}] }
//! ```
//!
//! - **http**: JSON client for a remote query service
//! - **memory**: canned responses, for tests and embedding

mod error;
mod http;
mod memory;

pub use error::{DataSourceError, DataSourceResult};
pub use http::HttpDataSource;
pub use memory::InMemoryDataSource;

use crate::expression::AggregationFunc;
use crate::table::{Column, ColumnBuilder, ColumnData, ColumnType, Table};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A windowed time-series query service
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Run one aggregation query
    async fn timeseries(&self, request: QueryRequest) -> DataSourceResult<QueryResponse>;
}

/// Evaluation interval threaded into every leaf query
///
/// Timestamps are Unix milliseconds, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalRequest {
    pub start: i64,
    pub end: i64,
    /// Number of buckets the interval is split into
    pub bucket_count: u32,
    /// Signed shift applied by the data source, e.g. `-1d`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

impl IntervalRequest {
    /// Create an interval, returning None if `start >= end`
    pub fn try_new(start: i64, end: i64, bucket_count: u32) -> Option<Self> {
        if start < end {
            Some(Self {
                start,
                end,
                bucket_count: bucket_count.max(1),
                offset: None,
            })
        } else {
            None
        }
    }

    /// The interval ending now and spanning `duration_ms`
    pub fn last(duration_ms: i64, bucket_count: u32) -> Self {
        let end = Utc::now().timestamp_millis();
        Self {
            start: end - duration_ms.max(1),
            end,
            bucket_count: bucket_count.max(1),
            offset: None,
        }
    }

    /// Copy of this interval carrying a time offset
    pub fn with_offset(&self, offset: impl Into<String>) -> Self {
        Self {
            offset: Some(offset.into()),
            ..self.clone()
        }
    }

    /// Width of one bucket in milliseconds
    pub fn bucket_length_ms(&self) -> i64 {
        ((self.end - self.start) / i64::from(self.bucket_count.max(1))).max(1)
    }

    /// Start timestamp of every bucket
    pub fn bucket_timestamps(&self) -> Vec<i64> {
        let step = self.bucket_length_ms();
        (0..i64::from(self.bucket_count.max(1)))
            .map(|i| self.start + i * step)
            .collect()
    }
}

/// The metric field of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryField {
    /// Metric field name, also the name of the value column in the response
    pub name: String,
    pub aggregator: AggregationFunc,
    /// Aggregation window in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_secs: Option<i64>,
}

/// One aggregation query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub data_source: String,
    pub field: QueryField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    #[serde(default)]
    pub group_by: Vec<String>,
    pub interval: IntervalRequest,
}

/// Declared name and type of a response column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Rows plus column metadata returned by a data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub meta: Vec<ColumnMeta>,
    pub data: Vec<Map<String, Value>>,
}

impl QueryResponse {
    /// Encode a table as a response
    pub fn from_table(table: &Table) -> Self {
        let meta = table
            .columns()
            .iter()
            .map(|c| ColumnMeta {
                name: c.name().to_string(),
                column_type: c.column_type(),
            })
            .collect();

        let data = (0..table.row_count())
            .map(|row| {
                table
                    .columns()
                    .iter()
                    .map(|c| (c.name().to_string(), cell_value(c, row)))
                    .collect()
            })
            .collect();

        Self { meta, data }
    }

    /// Decode into a table, one column per `meta` entry in declared order
    ///
    /// Missing or null cells read as 0 (numbers) or "" (text).
    pub fn into_table(self) -> DataSourceResult<Table> {
        let rows = self.data.len();
        let mut builders: Vec<ColumnBuilder> = self
            .meta
            .iter()
            .map(|m| ColumnBuilder::with_capacity(m.name.clone(), m.column_type, rows))
            .collect();

        for row in &self.data {
            for (meta, builder) in self.meta.iter().zip(builders.iter_mut()) {
                match (row.get(&meta.name), meta.column_type) {
                    (None | Some(Value::Null), ColumnType::String) => builder.push_string(""),
                    (None | Some(Value::Null), _) => builder.push_long(0),
                    (Some(Value::Number(n)), ColumnType::Long) => builder.push_long(
                        n.as_i64()
                            .unwrap_or_else(|| n.as_f64().unwrap_or_default() as i64),
                    ),
                    (Some(Value::Number(n)), _) => {
                        builder.push_double(n.as_f64().unwrap_or_default())
                    }
                    (Some(Value::String(s)), _) => builder.push_string(s.clone()),
                    (Some(Value::Bool(b)), _) => builder.push_long(i64::from(*b)),
                    (Some(other), _) => {
                        return Err(DataSourceError::InvalidResponse(format!(
                            "unsupported value for column '{}': {}",
                            meta.name, other
                        )))
                    }
                }
            }
        }

        let columns: Vec<Column> = builders.into_iter().map(ColumnBuilder::build).collect();
        Table::from_columns(columns).map_err(|e| DataSourceError::InvalidResponse(e.to_string()))
    }
}

fn cell_value(column: &Column, row: usize) -> Value {
    match column.data() {
        ColumnData::Long(v) => Value::from(v[row]),
        ColumnData::Double(v) => Number::from_f64(v[row])
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnData::String(v) => Value::from(v[row].clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TIMESTAMP_COLUMN;
    use serde_json::json;

    #[test]
    fn test_response_into_table() {
        let response: QueryResponse = serde_json::from_value(json!({
            "meta": [
                {"name": "_timestamp", "type": "LONG"},
                {"name": "appName", "type": "STRING"},
                {"name": "cpu", "type": "DOUBLE"}
            ],
            "data": [
                {"_timestamp": 1000, "appName": "app1", "cpu": 1},
                {"_timestamp": 1000, "appName": "app2", "cpu": 2.5},
                {"_timestamp": 1000, "appName": null}
            ]
        }))
        .unwrap();

        let table = response.into_table().unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_names(), vec![TIMESTAMP_COLUMN, "appName", "cpu"]);

        let cpu = table.column("cpu").unwrap();
        assert_eq!(cpu.column_type(), ColumnType::Double);
        assert_eq!(cpu.get_double(0), 1.0);
        assert_eq!(cpu.get_double(1), 2.5);
        assert_eq!(cpu.get_double(2), 0.0);
        assert_eq!(table.column("appName").unwrap().get_string(2), "");
    }

    #[test]
    fn test_response_rejects_nested_values() {
        let response: QueryResponse = serde_json::from_value(json!({
            "meta": [{"name": "cpu", "type": "LONG"}],
            "data": [{"cpu": [1, 2]}]
        }))
        .unwrap();
        assert!(matches!(
            response.into_table(),
            Err(DataSourceError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_from_table_preserves_types() {
        let table = Table::from_columns(vec![
            Column::string("appName", vec!["app1"]),
            Column::long("qps", vec![7]),
        ])
        .unwrap();

        let restored = QueryResponse::from_table(&table).into_table().unwrap();
        assert_eq!(restored, table);
    }

    #[test]
    fn test_interval_buckets() {
        let interval = IntervalRequest::try_new(0, 60_000, 3).unwrap();
        assert_eq!(interval.bucket_length_ms(), 20_000);
        assert_eq!(interval.bucket_timestamps(), vec![0, 20_000, 40_000]);

        assert!(IntervalRequest::try_new(10, 10, 1).is_none());
        assert_eq!(IntervalRequest::try_new(0, 10, 0).unwrap().bucket_count, 1);
    }

    #[test]
    fn test_interval_with_offset() {
        let interval = IntervalRequest::try_new(0, 60_000, 1).unwrap();
        let shifted = interval.with_offset("-1d");
        assert_eq!(shifted.offset.as_deref(), Some("-1d"));
        assert_eq!(shifted.start, interval.start);
        assert!(interval.offset.is_none());
    }

    #[test]
    fn test_request_serialization() {
        let request = QueryRequest {
            data_source: "jvm-metrics".to_string(),
            field: QueryField {
                name: "cpu".to_string(),
                aggregator: AggregationFunc::Avg,
                window_secs: Some(60),
            },
            filter_expression: None,
            group_by: vec!["appName".to_string()],
            interval: IntervalRequest::try_new(0, 60_000, 1)
                .unwrap()
                .with_offset("-1d"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            json!({
                "dataSource": "jvm-metrics",
                "field": {"name": "cpu", "aggregator": "avg", "windowSecs": 60},
                "groupBy": ["appName"],
                "interval": {"start": 0, "end": 60000, "bucketCount": 1, "offset": "-1d"}
            })
        );
    }
}
