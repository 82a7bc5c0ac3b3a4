//! In-Memory Data Source
//!
//! Serves canned responses keyed by metric field and time offset. Every
//! received request is recorded, and an optional artificial latency makes it
//! possible to observe how many queries are in flight at once.

use crate::datasource::{DataSource, DataSourceError, DataSourceResult, QueryRequest, QueryResponse};
use crate::table::Table;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

type ResponseKey = (String, Option<String>);

/// Data source answering from registered tables
#[derive(Default)]
pub struct InMemoryDataSource {
    responses: RwLock<HashMap<ResponseKey, QueryResponse>>,
    requests: RwLock<Vec<QueryRequest>>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Serve `table` for queries on `metric` without an offset
    pub async fn register(&self, metric: impl Into<String>, table: &Table) {
        self.register_response(metric, None, QueryResponse::from_table(table))
            .await;
    }

    /// Serve `table` for queries on `metric` shifted by `offset` (e.g. `-1d`)
    pub async fn register_with_offset(
        &self,
        metric: impl Into<String>,
        offset: impl Into<String>,
        table: &Table,
    ) {
        self.register_response(metric, Some(offset.into()), QueryResponse::from_table(table))
            .await;
    }

    /// Serve a raw response
    pub async fn register_response(
        &self,
        metric: impl Into<String>,
        offset: Option<String>,
        response: QueryResponse,
    ) {
        self.responses
            .write()
            .await
            .insert((metric.into(), offset), response);
    }

    /// All requests received so far, in arrival order
    pub async fn requests(&self) -> Vec<QueryRequest> {
        self.requests.read().await.clone()
    }

    /// Number of requests currently being served
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of requests that were being served at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Releases an in-flight slot when the request completes or is dropped
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataSource for InMemoryDataSource {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn timeseries(&self, request: QueryRequest) -> DataSourceResult<QueryResponse> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        self.requests.write().await.push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let key = (request.field.name.clone(), request.interval.offset.clone());
        let response = self.responses.read().await.get(&key).cloned();
        response.ok_or(DataSourceError::MetricNotFound(request.field.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{IntervalRequest, QueryField};
    use crate::expression::AggregationFunc;
    use crate::table::Column;

    fn request(metric: &str, offset: Option<&str>) -> QueryRequest {
        let interval = IntervalRequest::try_new(0, 60_000, 1).unwrap();
        QueryRequest {
            data_source: "metrics".to_string(),
            field: QueryField {
                name: metric.to_string(),
                aggregator: AggregationFunc::Sum,
                window_secs: None,
            },
            filter_expression: None,
            group_by: Vec::new(),
            interval: match offset {
                Some(o) => interval.with_offset(o),
                None => interval,
            },
        }
    }

    #[tokio::test]
    async fn test_serves_by_metric_and_offset() {
        let source = InMemoryDataSource::new();
        let current = Table::from_columns(vec![Column::long("qps", vec![10])]).unwrap();
        let base = Table::from_columns(vec![Column::long("qps", vec![8])]).unwrap();
        source.register("qps", &current).await;
        source.register_with_offset("qps", "-1d", &base).await;

        let response = source.timeseries(request("qps", None)).await.unwrap();
        assert_eq!(response.into_table().unwrap(), current);

        let response = source.timeseries(request("qps", Some("-1d"))).await.unwrap();
        assert_eq!(response.into_table().unwrap(), base);

        assert_eq!(source.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_metric() {
        let source = InMemoryDataSource::new();
        let result = source.timeseries(request("missing", None)).await;
        assert!(matches!(result, Err(DataSourceError::MetricNotFound(m)) if m == "missing"));
        assert_eq!(source.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_request_releases_slot() {
        let source = InMemoryDataSource::new().with_latency(Duration::from_millis(200));
        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), source.timeseries(request("qps", None))).await;
        assert!(timed_out.is_err());
        assert_eq!(source.in_flight(), 0);
        assert_eq!(source.max_in_flight(), 1);

        let _ = source.timeseries(request("missing", None)).await;
        assert_eq!(source.in_flight(), 0);
    }
}
