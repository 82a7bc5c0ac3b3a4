//! Expression Evaluator
//!
//! Entry point of the pipeline: compiles an expression for an interval and
//! executes the resulting step tree.
//!
//! # Execution Pipeline
//!
//! ```text
//! Expression → QueryPlanner → Step tree → execute (children concurrently) → PipelineQueryResult
//! ```

use crate::config::Config;
use crate::datasource::{DataSource, IntervalRequest};
use crate::expression::Expression;
use crate::pipeline::error::{QueryError, QueryResult};
use crate::pipeline::planner::QueryPlanner;
use crate::pipeline::result::PipelineQueryResult;
use std::sync::Arc;
use std::time::Instant;

/// Evaluates expressions against a data source
#[derive(Clone)]
pub struct ExpressionEvaluator {
    planner: QueryPlanner,
}

impl ExpressionEvaluator {
    /// Create an evaluator using the default data source name
    pub fn new(data_source: Arc<dyn DataSource>) -> Self {
        Self {
            planner: QueryPlanner::new(data_source),
        }
    }

    /// Create an evaluator configured from `config`
    pub fn with_config(data_source: Arc<dyn DataSource>, config: &Config) -> Self {
        Self {
            planner: QueryPlanner::new(data_source)
                .with_default_data_source(config.datasource.data_source.clone()),
        }
    }

    pub fn planner(&self) -> &QueryPlanner {
        &self.planner
    }

    /// Evaluate a JSON-encoded expression tree
    pub async fn evaluate_json(
        &self,
        json: &str,
        interval: &IntervalRequest,
    ) -> QueryResult<PipelineQueryResult> {
        let expression: Expression = serde_json::from_str(json)
            .map_err(|e| QueryError::InvalidExpression(format!("malformed expression: {}", e)))?;
        self.evaluate(&expression, interval).await
    }

    /// Evaluate a parsed expression
    pub async fn evaluate(
        &self,
        expression: &Expression,
        interval: &IntervalRequest,
    ) -> QueryResult<PipelineQueryResult> {
        let start = Instant::now();

        let step = self.planner.compile(expression, interval)?;
        tracing::trace!(root = step.name(), "Compiled expression");
        let result = step.execute().await;

        match &result {
            Ok(output) => tracing::debug!(
                expression = %expression,
                rows = output.row_count(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Expression evaluated"
            ),
            Err(e) => tracing::warn!(
                expression = %expression,
                error = %e,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Expression evaluation failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{DataSourceError, InMemoryDataSource};
    use crate::expression::{AggregationFunc, ComparisonOp, Literal, MetricExpression};
    use crate::pipeline::relative::DELTA_COLUMN;
    use crate::pipeline::result::{Shape, VALUE_COLUMN};
    use crate::table::{Column, ColumnType, Table, TIMESTAMP_COLUMN};
    use std::time::Duration;

    fn interval() -> IntervalRequest {
        IntervalRequest::try_new(0, 60_000, 1).unwrap()
    }

    fn by_app(metric: &str) -> Expression {
        Expression::metric(
            MetricExpression::new(AggregationFunc::Sum, metric)
                .window(Literal::parse("1m").unwrap())
                .group_by(&["appName"]),
        )
    }

    fn lit(text: &str) -> Expression {
        Expression::literal(Literal::parse(text).unwrap())
    }

    fn apps_table(metric: &str, apps: Vec<&str>, values: Vec<i64>) -> Table {
        Table::from_columns(vec![
            Column::long(TIMESTAMP_COLUMN, vec![0; apps.len()]),
            Column::string("appName", apps),
            Column::long(metric, values),
        ])
        .unwrap()
    }

    fn pairs(result: &PipelineQueryResult, column: &str) -> Vec<(String, f64)> {
        let names = result.column("appName").unwrap();
        let values = result.column(column).unwrap();
        (0..result.row_count())
            .map(|row| (names.get_string(row), values.get_double(row)))
            .collect()
    }

    async fn source() -> Arc<InMemoryDataSource> {
        let source = Arc::new(InMemoryDataSource::new());
        source
            .register("qps", &apps_table("qps", vec!["app1", "app2", "app3"], vec![5, 20, 25]))
            .await;
        source
            .register("left", &apps_table("left", vec!["app2", "app3", "app1"], vec![1, 5, 9]))
            .await;
        source
            .register("right", &apps_table("right", vec!["app2", "app3", "app4"], vec![21, 32, 43]))
            .await;
        source
            .register("other", &apps_table("other", vec!["app7", "app8"], vec![1, 2]))
            .await;
        source
    }

    #[tokio::test]
    async fn test_literal_arithmetic() {
        let evaluator = ExpressionEvaluator::new(source().await);

        let sum = evaluator
            .evaluate(&lit("1").add(lit("11")), &interval())
            .await
            .unwrap();
        assert_eq!(sum.row_count(), 1);
        assert_eq!(sum.table().column_names(), vec![VALUE_COLUMN]);
        assert_eq!(sum.value_column().get_long(0), 12);

        let truncated = evaluator
            .evaluate(&lit("24").div(lit("5")), &interval())
            .await
            .unwrap();
        assert_eq!(truncated.value_column().get_long(0), 4);

        let widened = evaluator
            .evaluate(&lit("5.5").mul(lit("5")), &interval())
            .await
            .unwrap();
        assert_eq!(widened.value_column().column_type(), ColumnType::Double);
        assert_eq!(widened.value_column().get_double(0), 27.5);

        let hour = evaluator
            .evaluate(&lit("1h").add(lit("1")), &interval())
            .await
            .unwrap();
        assert_eq!(hour.value_column().get_long(0), 3601);
    }

    #[tokio::test]
    async fn test_unit_literals() {
        let evaluator = ExpressionEvaluator::new(source().await);

        let size = evaluator.evaluate(&lit("5Mi"), &interval()).await.unwrap();
        assert_eq!(size.value_column().get_long(0), 5_242_880);

        let percent = evaluator.evaluate(&lit("90%"), &interval()).await.unwrap();
        assert_eq!(percent.value_column().column_type(), ColumnType::Double);
        assert_eq!(percent.value_column().get_double(0), 0.9);
    }

    #[tokio::test]
    async fn test_vector_plus_literal() {
        let evaluator = ExpressionEvaluator::new(source().await);
        let result = evaluator
            .evaluate(&by_app("qps").add(lit("5")), &interval())
            .await
            .unwrap();

        assert_eq!(result.shape(), Shape::Vector);
        assert_eq!(result.value_name(), "qps");
        assert_eq!(result.value_column().column_type(), ColumnType::Long);
        assert_eq!(
            pairs(&result, "qps"),
            vec![("app1".into(), 10.0), ("app2".into(), 25.0), ("app3".into(), 30.0)]
        );
    }

    #[tokio::test]
    async fn test_vector_plus_vector() {
        let evaluator = ExpressionEvaluator::new(source().await);
        let result = evaluator
            .evaluate(&by_app("left").add(by_app("right")), &interval())
            .await
            .unwrap();

        assert_eq!(result.row_count(), 2);
        let mut matched = pairs(&result, VALUE_COLUMN);
        matched.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(matched, vec![("app2".into(), 22.0), ("app3".into(), 37.0)]);
    }

    #[tokio::test]
    async fn test_disjoint_vectors_chain_to_empty() {
        let evaluator = ExpressionEvaluator::new(source().await);
        let expr = by_app("left")
            .add(by_app("other"))
            .mul(lit("2"))
            .sub(by_app("right"));
        let result = evaluator.evaluate(&expr, &interval()).await.unwrap();

        assert_eq!(result.row_count(), 0);
        assert!(result.column("appName").unwrap().is_empty());
        assert!(result.value_column().is_empty());
    }

    #[tokio::test]
    async fn test_filter_bounds() {
        let evaluator = ExpressionEvaluator::new(source().await);

        let strict = evaluator
            .evaluate(&by_app("qps").compare(ComparisonOp::Gt, lit("20")), &interval())
            .await
            .unwrap();
        assert_eq!(pairs(&strict, "qps"), vec![("app3".into(), 25.0)]);

        let inclusive = evaluator
            .evaluate(&by_app("qps").compare(ComparisonOp::Gte, lit("20")), &interval())
            .await
            .unwrap();
        assert_eq!(
            pairs(&inclusive, "qps"),
            vec![("app2".into(), 20.0), ("app3".into(), 25.0)]
        );
        assert_eq!(
            inclusive.table().column_names(),
            vec![TIMESTAMP_COLUMN, "appName", "qps"]
        );
    }

    #[tokio::test]
    async fn test_relative_comparison() {
        let source = source().await;
        source
            .register_with_offset(
                "qps",
                "-1d",
                &apps_table("qps", vec!["app1", "app2", "app4"], vec![10, 20, 30]),
            )
            .await;
        let evaluator = ExpressionEvaluator::new(source.clone());

        let expr = by_app("qps").relative(
            ComparisonOp::Lt,
            Literal::parse("-5%").unwrap(),
            Literal::parse("-1d").unwrap(),
        );
        let result = evaluator.evaluate(&expr, &interval()).await.unwrap();

        // app1: 5 vs 10 → -50%; app2: 20 vs 20 → 0%; app3 has no base
        assert_eq!(pairs(&result, "qps"), vec![("app1".into(), 5.0)]);
        assert_eq!(result.column("-1d").unwrap().get_long(0), 10);
        assert_eq!(result.column(DELTA_COLUMN).unwrap().get_double(0), -0.5);

        let offsets: Vec<Option<String>> = source
            .requests()
            .await
            .into_iter()
            .map(|r| r.interval.offset)
            .collect();
        assert_eq!(offsets.len(), 2);
        assert!(offsets.contains(&None));
        assert!(offsets.contains(&Some("-1d".to_string())));
    }

    #[tokio::test]
    async fn test_relative_comparison_disjoint_final_join() {
        let source = source().await;
        // left and right overlap on app2/app3, but the base only knows app1
        source
            .register_with_offset("left", "-1h", &apps_table("left", vec!["app1"], vec![1]))
            .await;
        source
            .register_with_offset("right", "-1h", &apps_table("right", vec!["app1"], vec![1]))
            .await;
        let evaluator = ExpressionEvaluator::new(source);

        let expr = by_app("left").add(by_app("right")).relative(
            ComparisonOp::Gt,
            Literal::parse("-100%").unwrap(),
            Literal::parse("-1h").unwrap(),
        );
        let result = evaluator.evaluate(&expr, &interval()).await.unwrap();
        assert_eq!(result.row_count(), 0);
        assert!(result.column(DELTA_COLUMN).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_siblings_run_concurrently() {
        let source = Arc::new(InMemoryDataSource::new().with_latency(Duration::from_millis(50)));
        source
            .register("left", &apps_table("left", vec!["app1"], vec![1]))
            .await;
        source
            .register("right", &apps_table("right", vec!["app1"], vec![2]))
            .await;
        let evaluator = ExpressionEvaluator::new(source.clone());

        let result = evaluator
            .evaluate(&by_app("left").add(by_app("right")), &interval())
            .await
            .unwrap();
        assert_eq!(result.value_column().get_long(0), 3);
        assert_eq!(source.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_idempotent() {
        let evaluator = ExpressionEvaluator::new(source().await);
        let expr = by_app("left").add(by_app("right")).div(lit("2.0"));

        let first = evaluator.evaluate(&expr, &interval()).await.unwrap();
        let second = evaluator.evaluate(&expr, &interval()).await.unwrap();
        assert_eq!(first.table(), second.table());
        assert_eq!(first.value_column().column_type(), ColumnType::Double);

        let step = evaluator.planner().compile(&expr, &interval()).unwrap();
        assert_eq!(step.execute().await.unwrap(), step.execute().await.unwrap());
    }

    #[tokio::test]
    async fn test_data_source_failure_propagates() {
        let evaluator = ExpressionEvaluator::new(source().await);
        let result = evaluator
            .evaluate(&by_app("missing").add(by_app("qps")), &interval())
            .await;
        assert!(matches!(
            result,
            Err(QueryError::DataSource(DataSourceError::MetricNotFound(m))) if m == "missing"
        ));
    }

    #[tokio::test]
    async fn test_evaluate_json() {
        let evaluator = ExpressionEvaluator::new(source().await);
        let json = r#"{
            "type": "comparison",
            "op": ">",
            "lhs": {"type": "metric", "metric": "qps", "aggregator": "sum", "groupBy": ["appName"]},
            "rhs": {"type": "literal", "text": "20", "kind": "number", "value": {"type": "LONG", "value": 20}}
        }"#;
        let result = evaluator.evaluate_json(json, &interval()).await.unwrap();
        assert_eq!(pairs(&result, "qps"), vec![("app3".into(), 25.0)]);

        let malformed = evaluator.evaluate_json("{\"type\": \"bogus\"}", &interval()).await;
        assert!(matches!(malformed, Err(QueryError::InvalidExpression(_))));
    }

    #[tokio::test]
    async fn test_config_sets_default_data_source() {
        let source = source().await;
        let mut config = Config::default();
        config.datasource.data_source = "jvm-metrics".to_string();
        let evaluator = ExpressionEvaluator::with_config(source.clone(), &config);

        evaluator.evaluate(&by_app("qps"), &interval()).await.unwrap();
        assert_eq!(source.requests().await[0].data_source, "jvm-metrics");
    }
}
