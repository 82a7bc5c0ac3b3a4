//! Evaluation Pipeline
//!
//! Compiles an [`Expression`](crate::expression::Expression) into a tree of
//! asynchronous steps and executes it against a data source.
//!
//! - **planner**: expression → step tree
//! - **literal**, **metric**: leaf steps
//! - **arithmetic**, **filter**, **relative**: binary steps, children run concurrently
//! - **join**: label-set matching shared by the binary steps
//! - **executor**: compile-and-run entry point
//!
//! Every intermediate result is either a scalar (no dimension columns, one
//! row) or a vector (rows keyed by dimension values); see [`Shape`].

mod arithmetic;
mod error;
mod executor;
mod filter;
mod join;
mod literal;
mod metric;
mod planner;
mod relative;
mod result;
mod step;

pub use arithmetic::{combine, ArithmeticStep};
pub use error::{QueryError, QueryResult};
pub use executor::ExpressionEvaluator;
pub use filter::{filter, FilterStep};
pub use join::{match_rows, JoinedRows};
pub use literal::LiteralQueryStep;
pub use metric::MetricQueryStep;
pub use planner::{QueryPlanner, DEFAULT_DATA_SOURCE};
pub use relative::{compare_relative, RelativeComparisonStep, DELTA_COLUMN};
pub use result::{PipelineQueryResult, Shape, VALUE_COLUMN};
pub use step::{BoxedStep, Step};
