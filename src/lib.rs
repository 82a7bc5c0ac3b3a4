//! # metric-expr
//!
//! Evaluation engine for arithmetic expressions over time-series metrics.
//!
//! An already-parsed expression such as
//!
//! ```text
//! sum(qps)[1m] by (appName) + 5
//! sum(qps)[1m] by (appName) < -5%[-1d]
//! ```
//!
//! is compiled into a tree of asynchronous steps. Metric leaves are answered
//! by an external [`DataSource`]; binary steps run their children
//! concurrently and combine the results as scalars or label-keyed vectors.
//! The output is a typed columnar [`Table`].
//!
//! ## Modules
//!
//! - [`table`]: typed columns and tables
//! - [`expression`]: expression tree, operators and unit-bearing literals
//! - [`datasource`]: the time-series query boundary (HTTP and in-memory)
//! - [`pipeline`]: planner, steps and evaluator
//! - [`config`]: file and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metric_expr::datasource::{InMemoryDataSource, IntervalRequest};
//! use metric_expr::expression::{AggregationFunc, Expression, Literal, MetricExpression};
//! use metric_expr::pipeline::ExpressionEvaluator;
//! use metric_expr::table::{Column, Table};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(InMemoryDataSource::new());
//!     let qps = Table::from_columns(vec![
//!         Column::string("appName", vec!["app1", "app2"]),
//!         Column::long("qps", vec![5, 20]),
//!     ])?;
//!     source.register("qps", &qps).await;
//!
//!     let expr = Expression::metric(
//!         MetricExpression::new(AggregationFunc::Sum, "qps").group_by(&["appName"]),
//!     )
//!     .add(Literal::parse("5")?.into());
//!
//!     let interval = IntervalRequest::last(3_600_000, 1);
//!     let result = ExpressionEvaluator::new(source).evaluate(&expr, &interval).await?;
//!     println!("{}", result.table());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod datasource;
pub mod expression;
pub mod pipeline;
pub mod table;

// Re-export top-level types for convenience
pub use config::{Config, ConfigError, DataSourceConfig, LoggingConfig, QueryConfig};

pub use datasource::{
    DataSource, DataSourceError, DataSourceResult, HttpDataSource, InMemoryDataSource,
    IntervalRequest, QueryRequest, QueryResponse,
};

pub use expression::{
    AggregationFunc, ArithmeticOp, ComparisonOp, Expression, Literal, LiteralError, Scalar,
};

pub use pipeline::{
    ExpressionEvaluator, PipelineQueryResult, QueryError, QueryPlanner, QueryResult, Shape, Step,
};

pub use table::{Column, ColumnType, Table, TableError};
