//! Metric Expressions
//!
//! The typed, already-parsed input of the evaluation pipeline:
//!
//! - **ast**: expression tree and metric selectors
//! - **literal**: literal unit parser (sizes, percentages, durations)
//! - **scalar**: LONG/DOUBLE scalar values and numeric promotion
//! - **operator**: arithmetic and comparison operators
//!
//! # Example
//!
//! ```rust
//! use metric_expr::expression::{AggregationFunc, Expression, Literal, MetricExpression};
//!
//! // avg(cpu)[1m] by (appName) * 100
//! let expr = Expression::metric(
//!     MetricExpression::new(AggregationFunc::Avg, "cpu")
//!         .window(Literal::parse("1m").unwrap())
//!         .group_by(&["appName"]),
//! )
//! .mul(Expression::literal(Literal::long(100)));
//!
//! assert!(expr.has_metric());
//! ```

mod ast;
mod error;
mod literal;
mod operator;
mod scalar;

pub use ast::{AggregationFunc, Expression, LabelFilter, MetricExpression};
pub use error::{LiteralError, LiteralResult};
pub use literal::{parse_literal, Literal, LiteralKind};
pub use operator::{ArithmeticOp, ComparisonOp};
pub use scalar::{promote, Scalar};
