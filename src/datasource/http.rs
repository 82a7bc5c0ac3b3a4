//! HTTP Data Source
//!
//! JSON client for a remote time-series query service.

use crate::config::DataSourceConfig;
use crate::datasource::{DataSource, DataSourceError, DataSourceResult, QueryRequest, QueryResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

/// Path of the timeseries endpoint, relative to the service URL
pub const TIMESERIES_PATH: &str = "/api/datasource/timeseries/v5";

/// Data source backed by an HTTP query service
pub struct HttpDataSource {
    client: Client,
    base_url: String,
}

impl HttpDataSource {
    /// Create a client from configuration
    pub fn new(config: &DataSourceConfig) -> DataSourceResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of the timeseries endpoint
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, TIMESERIES_PATH)
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn timeseries(&self, request: QueryRequest) -> DataSourceResult<QueryResponse> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DataSourceError::Timeout
                } else if e.is_connect() {
                    DataSourceError::Unavailable
                } else {
                    DataSourceError::Request(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let body: QueryResponse = response.json().await.map_err(|e| {
                DataSourceError::InvalidResponse(format!("failed to decode response: {}", e))
            })?;
            tracing::debug!(
                metric = %request.field.name,
                rows = body.data.len(),
                "Received timeseries response"
            );
            Ok(body)
        } else if status == StatusCode::NOT_FOUND {
            Err(DataSourceError::MetricNotFound(request.field.name))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(DataSourceError::ApiError {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = DataSourceConfig {
            url: "http://localhost:9897/".to_string(),
            ..DataSourceConfig::default()
        };
        let source = HttpDataSource::new(&config).unwrap();
        assert_eq!(
            source.endpoint(),
            "http://localhost:9897/api/datasource/timeseries/v5"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_fails() {
        let config = DataSourceConfig {
            url: "http://127.0.0.1:1".to_string(),
            timeout_ms: 500,
            ..DataSourceConfig::default()
        };
        let source = HttpDataSource::new(&config).unwrap();
        let request: QueryRequest = serde_json::from_value(serde_json::json!({
            "dataSource": "metrics",
            "field": {"name": "cpu", "aggregator": "avg"},
            "interval": {"start": 0, "end": 60000, "bucketCount": 1}
        }))
        .unwrap();

        let result = source.timeseries(request).await;
        assert!(result.is_err());
    }
}
