//! Label-Set Matching
//!
//! Pairs the rows of two vector results that describe the same series. A row
//! is identified by its full dimension-value tuple, and additionally by its
//! bucket timestamp when either side carries more than one bucket per series.
//!
//! The right side is indexed once; the left side is then walked in order, so
//! matched pairs follow left-operand order. A key matched twice on either
//! side is ambiguous and rejected.

use crate::pipeline::error::{QueryError, QueryResult};
use crate::pipeline::result::PipelineQueryResult;
use crate::table::{Column, Table, TIMESTAMP_COLUMN};
use std::collections::{HashMap, HashSet};

type RowKey = (Option<i64>, Vec<String>);

/// Matched row pairs of an inner join
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRows {
    /// Dimension columns the rows were matched on, in left order
    pub dimensions: Vec<String>,
    /// Whether bucket timestamps were part of the key
    pub on_timestamp: bool,
    /// `(left_row, right_row)` pairs, in left row order
    pub pairs: Vec<(usize, usize)>,
}

impl JoinedRows {
    pub fn left_rows(&self) -> Vec<usize> {
        self.pairs.iter().map(|&(l, _)| l).collect()
    }

    pub fn right_rows(&self) -> Vec<usize> {
        self.pairs.iter().map(|&(_, r)| r).collect()
    }

    /// Key columns of the matched rows, taken from the left side
    ///
    /// `_timestamp` comes first when the left side has one.
    pub fn key_table(&self, left: &PipelineQueryResult) -> QueryResult<Table> {
        let rows = self.left_rows();
        let mut table = Table::new();
        if let Some(ts) = left.timestamp_column() {
            table.add_column(ts.take(&rows))?;
        }
        for dim in &self.dimensions {
            table.add_column(left.table().column(dim)?.take(&rows))?;
        }
        Ok(table)
    }
}

/// Inner-join `left` and `right` on their series keys
///
/// Both sides must be keyed by the same set of dimension columns; when the
/// label sets differ no series can match and no pairs are returned. A key
/// matched more than once on either side is rejected.
///
/// `right_shift_ms` is added to the right side's timestamps before matching,
/// which lines up a time-shifted series with the current one.
pub fn match_rows(
    left: &PipelineQueryResult,
    right: &PipelineQueryResult,
    right_shift_ms: i64,
) -> QueryResult<JoinedRows> {
    let dimensions = left.dimensions().to_vec();

    let same_labels = dimensions.len() == right.dimensions().len()
        && dimensions.iter().all(|d| right.dimensions().contains(d));
    if !same_labels {
        tracing::debug!(
            left = ?left.dimensions(),
            right = ?right.dimensions(),
            "Label sets differ, no series match"
        );
        return Ok(JoinedRows {
            dimensions,
            on_timestamp: false,
            pairs: Vec::new(),
        });
    }

    let on_timestamp = left.timestamp_column().is_some()
        && right.timestamp_column().is_some()
        && (left.has_multiple_buckets(&dimensions) || right.has_multiple_buckets(&dimensions));

    let left_keys = KeyReader::new(left, &dimensions, on_timestamp, 0)?;
    let right_keys = KeyReader::new(right, &dimensions, on_timestamp, right_shift_ms)?;

    let mut index: HashMap<RowKey, usize> = HashMap::with_capacity(right.row_count());
    for row in 0..right.row_count() {
        let key = right_keys.key(row);
        if index.contains_key(&key) {
            return Err(QueryError::DuplicateSeries {
                side: "right",
                key: describe(&dimensions, &key),
            });
        }
        index.insert(key, row);
    }

    let mut matched: HashSet<RowKey> = HashSet::new();
    let mut pairs = Vec::new();
    for row in 0..left.row_count() {
        let key = left_keys.key(row);
        if let Some(&r) = index.get(&key) {
            if matched.contains(&key) {
                return Err(QueryError::DuplicateSeries {
                    side: "left",
                    key: describe(&dimensions, &key),
                });
            }
            matched.insert(key);
            pairs.push((row, r));
        }
    }

    Ok(JoinedRows {
        dimensions,
        on_timestamp,
        pairs,
    })
}

struct KeyReader<'a> {
    columns: Vec<&'a Column>,
    timestamps: Option<&'a Column>,
    shift_ms: i64,
}

impl<'a> KeyReader<'a> {
    fn new(
        result: &'a PipelineQueryResult,
        dimensions: &[String],
        on_timestamp: bool,
        shift_ms: i64,
    ) -> QueryResult<Self> {
        let columns = dimensions
            .iter()
            .map(|d| result.table().column(d))
            .collect::<Result<Vec<_>, _>>()?;
        let timestamps = if on_timestamp {
            Some(result.table().column(TIMESTAMP_COLUMN)?)
        } else {
            None
        };
        Ok(Self {
            columns,
            timestamps,
            shift_ms,
        })
    }

    fn key(&self, row: usize) -> RowKey {
        (
            self.timestamps.map(|ts| ts.get_long(row) + self.shift_ms),
            self.columns.iter().map(|c| c.get_string(row)).collect(),
        )
    }
}

fn describe(dimensions: &[String], key: &RowKey) -> String {
    let mut parts: Vec<String> = dimensions
        .iter()
        .zip(&key.1)
        .map(|(d, v)| format!("{}={}", d, v))
        .collect();
    if let Some(ts) = key.0 {
        parts.push(format!("{}={}", TIMESTAMP_COLUMN, ts));
    }
    format!("{{{}}}", parts.join(", "))
}
