use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

pub mod column;
pub mod features;
pub mod query_builder;
pub mod report;
pub mod table;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("load error: {0}")]
    Load(String),

    #[error("timestamp parse error: {failed} row(s) failed, first at row {row} ({value:?}): {reason}")]
    Parse {
        failed: usize,
        row: usize,
        value: String,
        reason: String,
    },

    #[error("invalid timestamp pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("empty table: cannot {0} over zero rows")]
    EmptyTable(String),

    #[error("render error for {chart}: {reason}")]
    Render { chart: String, reason: String },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("column {column} has the wrong type: expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },
}

/// A single row that failed to parse
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based data row number (the header is not counted)
    pub row: usize,
    pub column: String,
    pub value: String,
    pub error: String,
}

/// Cell value (owned for simplicity)
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// Integer column
    Int(i64),
    /// Float column
    Float(f64),
    /// String column
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

/// Group key of an aggregate report.
///
/// Keys of one report always share a variant; `Null` sorts first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Null,
    Int(i64),
    Str(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Null => f.write_str("null"),
            GroupKey::Int(v) => write!(f, "{v}"),
            GroupKey::Str(v) => f.write_str(v),
        }
    }
}

/// Aggregate operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    /// Sum of all numeric values
    Sum,
    /// Count of all rows
    Count,
    /// Average of numeric values
    Avg,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
}

impl AggregateOp {
    pub fn name(self) -> &'static str {
        match self {
            AggregateOp::Sum => "sum",
            AggregateOp::Count => "count",
            AggregateOp::Avg => "avg",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
        }
    }
}

/// Result of an aggregation
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateResult {
    Int(i64),
    Float(f64),
    /// Every input value of the group was null
    Null,
}

impl AggregateResult {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AggregateResult::Int(v) => Some(*v as f64),
            AggregateResult::Float(v) => Some(*v),
            AggregateResult::Null => None,
        }
    }

    /// Total order used for sorting reports: nulls below every number.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
        }
    }
}

impl fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateResult::Int(v) => write!(f, "{v}"),
            AggregateResult::Float(v) => write!(f, "{v}"),
            AggregateResult::Null => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_order_puts_null_first() {
        let mut keys = vec![GroupKey::Int(3), GroupKey::Null, GroupKey::Int(1)];
        keys.sort();
        assert_eq!(keys, vec![GroupKey::Null, GroupKey::Int(1), GroupKey::Int(3)]);
    }

    #[test]
    fn test_aggregate_result_cmp() {
        let a = AggregateResult::Int(2);
        let b = AggregateResult::Float(2.5);
        assert_eq!(a.total_cmp(&b), Ordering::Less);
        assert_eq!(AggregateResult::Null.total_cmp(&a), Ordering::Less);
        assert_eq!(a.to_string(), "2");
        assert_eq!(AggregateResult::Float(200.0).to_string(), "200");
    }
}
