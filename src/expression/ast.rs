//! Expression Abstract Syntax Tree
//!
//! The already-parsed form of a metric expression such as
//!
//! ```text
//! avg(cpu{appName = 'app1'})[1m] by (appName) * 100
//! sum(qps)[1m] by (appName) > -5%[-1d]
//! ```
//!
//! Trees are built by a host-side parser or programmatically with the helper
//! constructors below, and can be exchanged as JSON.

use crate::expression::literal::Literal;
use crate::expression::operator::{ArithmeticOp, ComparisonOp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A metric expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Expression {
    /// A typed constant
    Literal(Literal),
    /// An aggregated metric selector
    Metric(MetricExpression),
    /// `lhs (+|-|*|/) rhs`
    Arithmetic {
        op: ArithmeticOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// `lhs (>|>=|<|<=|==|!=) rhs`, keeps the rows of `lhs` that satisfy it
    Comparison {
        op: ComparisonOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// `lhs OP threshold[offset]`, compares `lhs` to itself shifted by `offset`
    RelativeComparison {
        op: ComparisonOp,
        lhs: Box<Expression>,
        threshold: Literal,
        offset: Literal,
    },
}

impl Expression {
    pub fn literal(literal: Literal) -> Self {
        Self::Literal(literal)
    }

    pub fn metric(metric: MetricExpression) -> Self {
        Self::Metric(metric)
    }

    pub fn arithmetic(self, op: ArithmeticOp, rhs: Expression) -> Self {
        Self::Arithmetic {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    pub fn add(self, rhs: Expression) -> Self {
        self.arithmetic(ArithmeticOp::Add, rhs)
    }

    pub fn sub(self, rhs: Expression) -> Self {
        self.arithmetic(ArithmeticOp::Sub, rhs)
    }

    pub fn mul(self, rhs: Expression) -> Self {
        self.arithmetic(ArithmeticOp::Mul, rhs)
    }

    pub fn div(self, rhs: Expression) -> Self {
        self.arithmetic(ArithmeticOp::Div, rhs)
    }

    pub fn compare(self, op: ComparisonOp, rhs: Expression) -> Self {
        Self::Comparison {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    /// Build `self OP threshold[offset]`
    pub fn relative(self, op: ComparisonOp, threshold: Literal, offset: Literal) -> Self {
        Self::RelativeComparison {
            op,
            lhs: Box::new(self),
            threshold,
            offset,
        }
    }

    /// Whether the tree contains at least one metric selector
    pub fn has_metric(&self) -> bool {
        match self {
            Self::Literal(_) => false,
            Self::Metric(_) => true,
            Self::Arithmetic { lhs, rhs, .. } | Self::Comparison { lhs, rhs, .. } => {
                lhs.has_metric() || rhs.has_metric()
            }
            Self::RelativeComparison { lhs, .. } => lhs.has_metric(),
        }
    }
}

impl From<Literal> for Expression {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<MetricExpression> for Expression {
    fn from(metric: MetricExpression) -> Self {
        Self::Metric(metric)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => write!(f, "{}", literal),
            Self::Metric(metric) => write!(f, "{}", metric),
            Self::Arithmetic { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Self::Comparison { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
            Self::RelativeComparison {
                op,
                lhs,
                threshold,
                offset,
            } => write!(f, "{} {} {}[{}]", lhs, op, threshold, offset),
        }
    }
}

/// Aggregation functions applied by the data source per bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationFunc {
    Avg,
    Sum,
    Min,
    Max,
    Count,
    Last,
    First,
    Rate,
}

impl AggregationFunc {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "avg" | "average" => Some(Self::Avg),
            "sum" => Some(Self::Sum),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "count" => Some(Self::Count),
            "last" => Some(Self::Last),
            "first" => Some(Self::First),
            "rate" => Some(Self::Rate),
            _ => None,
        }
    }
}

impl fmt::Display for AggregationFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Avg => write!(f, "avg"),
            Self::Sum => write!(f, "sum"),
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
            Self::Count => write!(f, "count"),
            Self::Last => write!(f, "last"),
            Self::First => write!(f, "first"),
            Self::Rate => write!(f, "rate"),
        }
    }
}

/// A label condition inside a metric selector's braces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelFilter {
    pub dimension: String,
    pub op: ComparisonOp,
    pub value: String,
}

impl LabelFilter {
    pub fn new(dimension: impl Into<String>, op: ComparisonOp, value: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(dimension: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(dimension, ComparisonOp::Eq, value)
    }
}

impl fmt::Display for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.replace('\'', "\\'");
        write!(f, "{} {} '{}'", self.dimension, self.op, value)
    }
}

/// `AGG(<data_source>.<metric>{<filters>})[<window>] by (<dims>)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricExpression {
    /// Data source holding the metric; the evaluator's default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    /// Metric field name
    pub metric: String,
    pub aggregator: AggregationFunc,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<LabelFilter>,
    /// Aggregation window, a duration literal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<Literal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
}

impl MetricExpression {
    pub fn new(aggregator: AggregationFunc, metric: impl Into<String>) -> Self {
        Self {
            data_source: None,
            metric: metric.into(),
            aggregator,
            filters: Vec::new(),
            window: None,
            group_by: Vec::new(),
        }
    }

    pub fn data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = Some(data_source.into());
        self
    }

    pub fn filter(mut self, filter: LabelFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn window(mut self, window: Literal) -> Self {
        self.window = Some(window);
        self
    }

    pub fn group_by(mut self, dims: &[&str]) -> Self {
        self.group_by = dims.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Filters rendered as a single `AND`-joined expression
    pub fn filter_expression(&self) -> Option<String> {
        if self.filters.is_empty() {
            return None;
        }
        Some(
            self.filters
                .iter()
                .map(LabelFilter::to_string)
                .collect::<Vec<_>>()
                .join(" AND "),
        )
    }
}

impl fmt::Display for MetricExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.aggregator)?;
        if let Some(ds) = &self.data_source {
            write!(f, "{}.", ds)?;
        }
        write!(f, "{}", self.metric)?;
        if let Some(filter) = self.filter_expression() {
            write!(f, "{{{}}}", filter)?;
        }
        write!(f, ")")?;
        if let Some(window) = &self.window {
            write!(f, "[{}]", window)?;
        }
        if !self.group_by.is_empty() {
            write!(f, " by ({})", self.group_by.join(", "))?;
        }
        Ok(())
    }
}
