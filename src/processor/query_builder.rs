use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::processor::column::Column;
use crate::processor::report::{AggregateReport, ReportRow};
use crate::processor::table::Table;
use crate::processor::{AggregateOp, AggregateResult, GroupKey, ProcessorError};

/// Row order of an executed query
///
/// Measure orderings fall back to ascending group key on ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    KeyAscending,
    KeyDescending,
    MeasureAscending(usize),
    MeasureDescending(usize),
}

#[derive(Debug, Clone)]
struct Aggregation {
    /// `None` counts rows
    column: Option<String>,
    op: AggregateOp,
    alias: Option<String>,
}

impl Aggregation {
    fn measure_name(&self) -> String {
        match (&self.alias, &self.column) {
            (Some(alias), _) => alias.clone(),
            (None, Some(col)) => format!("{}_{}", self.op.name(), col),
            (None, None) => "count".to_string(),
        }
    }
}

/// Resolved input of one measure
enum MeasureInput<'a> {
    Rows,
    Int(&'a [Option<i64>], AggregateOp),
    Float(&'a [Option<f64>], AggregateOp),
}

impl MeasureInput<'_> {
    fn aggregate_rows(&self, rows: &[usize]) -> AggregateResult {
        match self {
            MeasureInput::Rows => AggregateResult::Int(rows.len() as i64),
            MeasureInput::Int(values, op) => {
                let group: Vec<i64> = rows.iter().filter_map(|&i| values[i]).collect();
                aggregate_int_values(&group, *op)
            }
            MeasureInput::Float(values, op) => {
                let group: Vec<f64> = rows.iter().filter_map(|&i| values[i]).collect();
                aggregate_float_values(&group, *op)
            }
        }
    }
}

/// Grouped query over a [`Table`]
///
/// # Example
///
/// ```rust
/// # use transaction_analytics::processor::{AggregateOp, table::Table, query_builder::SortOrder};
/// let table = Table::from_csv_bytes(b"category,amount\nA,10\nB,20\nA,30\n").unwrap();
/// let report = table
///     .query()
///     .group_by("category")
///     .aggregate_as("amount", AggregateOp::Avg, "avg_amount")
///     .order_by(SortOrder::MeasureDescending(0))
///     .execute()
///     .unwrap();
/// assert_eq!(report.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    table: &'a Table,
    name: Option<String>,
    group_by_column: Option<String>,
    aggregations: Vec<Aggregation>,
    order: SortOrder,
    limit: Option<usize>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            name: None,
            group_by_column: None,
            aggregations: Vec::new(),
            order: SortOrder::KeyAscending,
            limit: None,
        }
    }

    /// Name carried by the resulting report
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Group by a string or integer column
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by_column = Some(column.to_string());
        self
    }

    /// Add an aggregation named `<op>_<column>`
    pub fn aggregate(mut self, column: &str, op: AggregateOp) -> Self {
        self.aggregations.push(Aggregation {
            column: Some(column.to_string()),
            op,
            alias: None,
        });
        self
    }

    /// Add an aggregation with a custom alias
    pub fn aggregate_as(mut self, column: &str, op: AggregateOp, alias: &str) -> Self {
        self.aggregations.push(Aggregation {
            column: Some(column.to_string()),
            op,
            alias: Some(alias.to_string()),
        });
        self
    }

    /// Add a row count per group
    pub fn count_as(mut self, alias: &str) -> Self {
        self.aggregations.push(Aggregation {
            column: None,
            op: AggregateOp::Count,
            alias: Some(alias.to_string()),
        });
        self
    }

    pub fn order_by(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Limit number of groups returned
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Execute the query
    pub fn execute(self) -> Result<AggregateReport, ProcessorError> {
        let group_col = self
            .group_by_column
            .as_deref()
            .ok_or_else(|| ProcessorError::InvalidQuery("no group-by column".into()))?;

        if self.aggregations.is_empty() {
            return Err(ProcessorError::InvalidQuery("no aggregations".into()));
        }

        if let SortOrder::MeasureAscending(i) | SortOrder::MeasureDescending(i) = self.order {
            if i >= self.aggregations.len() {
                return Err(ProcessorError::InvalidQuery(format!(
                    "cannot order by measure {i}, query has {}",
                    self.aggregations.len()
                )));
            }
        }

        if self.table.is_empty() {
            return Err(ProcessorError::EmptyTable(format!("group by {group_col}")));
        }

        let gcol = self.table.get_col(group_col)?;
        if let Column::Float64(_) = gcol {
            return Err(ProcessorError::ColumnType {
                column: group_col.to_string(),
                expected: "int64 or string",
            });
        }

        let inputs = self
            .aggregations
            .iter()
            .map(|agg| self.resolve(agg))
            .collect::<Result<Vec<_>, _>>()?;

        // BTreeMap yields keys in ascending order
        let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
        for row in 0..self.table.row_count() {
            if let Some(key) = gcol.group_key(row) {
                groups.entry(key).or_default().push(row);
            }
        }

        let mut rows: Vec<ReportRow> = groups
            .into_iter()
            .map(|(key, group_rows)| ReportRow {
                key,
                values: inputs.iter().map(|m| m.aggregate_rows(&group_rows)).collect(),
            })
            .collect();

        let order = self.order;
        rows.sort_by(|a, b| compare_rows(order, a, b));

        if let Some(n) = self.limit {
            rows.truncate(n);
        }

        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("by_{group_col}"));
        debug!(report = %name, groups = rows.len(), "executed grouped query");

        Ok(AggregateReport {
            name,
            key_column: group_col.to_string(),
            measures: self.aggregations.iter().map(|a| a.measure_name()).collect(),
            rows,
        })
    }

    fn resolve(&self, agg: &Aggregation) -> Result<MeasureInput<'a>, ProcessorError> {
        let Some(column) = agg.column.as_deref() else {
            return Ok(MeasureInput::Rows);
        };

        let table: &'a Table = self.table;
        match table.get_col(column)? {
            Column::Int64(values) => Ok(MeasureInput::Int(values, agg.op)),
            Column::Float64(values) => Ok(MeasureInput::Float(values, agg.op)),
            Column::Str(_) => Err(ProcessorError::ColumnType {
                column: column.to_string(),
                expected: "numeric",
            }),
        }
    }
}

fn compare_rows(order: SortOrder, a: &ReportRow, b: &ReportRow) -> Ordering {
    match order {
        SortOrder::KeyAscending => a.key.cmp(&b.key),
        SortOrder::KeyDescending => b.key.cmp(&a.key),
        SortOrder::MeasureAscending(i) => a.values[i]
            .total_cmp(&b.values[i])
            .then_with(|| a.key.cmp(&b.key)),
        SortOrder::MeasureDescending(i) => b.values[i]
            .total_cmp(&a.values[i])
            .then_with(|| a.key.cmp(&b.key)),
    }
}

/// Aggregate non-null integer values of one group
fn aggregate_int_values(values: &[i64], op: AggregateOp) -> AggregateResult {
    if values.is_empty() {
        return match op {
            AggregateOp::Count => AggregateResult::Int(0),
            _ => AggregateResult::Null,
        };
    }

    match op {
        AggregateOp::Sum => {
            let sum: i128 = values.iter().map(|&v| v as i128).sum();
            i64::try_from(sum)
                .map(AggregateResult::Int)
                .unwrap_or(AggregateResult::Float(sum as f64))
        }
        AggregateOp::Count => AggregateResult::Int(values.len() as i64),
        AggregateOp::Avg => {
            let sum: i128 = values.iter().map(|&v| v as i128).sum();
            AggregateResult::Float(sum as f64 / values.len() as f64)
        }
        AggregateOp::Min => values
            .iter()
            .min()
            .map_or(AggregateResult::Null, |&v| AggregateResult::Int(v)),
        AggregateOp::Max => values
            .iter()
            .max()
            .map_or(AggregateResult::Null, |&v| AggregateResult::Int(v)),
    }
}

/// Aggregate non-null float values of one group
fn aggregate_float_values(values: &[f64], op: AggregateOp) -> AggregateResult {
    if values.is_empty() {
        return match op {
            AggregateOp::Count => AggregateResult::Int(0),
            _ => AggregateResult::Null,
        };
    }

    match op {
        AggregateOp::Sum => AggregateResult::Float(values.iter().sum()),
        AggregateOp::Count => AggregateResult::Int(values.len() as i64),
        AggregateOp::Avg => {
            let sum: f64 = values.iter().sum();
            AggregateResult::Float(sum / values.len() as f64)
        }
        AggregateOp::Min => {
            AggregateResult::Float(values.iter().fold(f64::INFINITY, |a, &b| a.min(b)))
        }
        AggregateOp::Max => {
            AggregateResult::Float(values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> Table {
        Table::from_csv_bytes(
            b"region,category,amount,qty\nEU,A,10,1\nUS,B,20,\nEU,A,30,3\nUS,C,20,2\nAS,B,20,5\n",
        )
        .unwrap()
    }

    #[test]
    fn test_group_by_multi_agg() {
        let table = sales();
        let report = table
            .query()
            .group_by("category")
            .aggregate("amount", AggregateOp::Max)
            .aggregate("amount", AggregateOp::Min)
            .aggregate("amount", AggregateOp::Avg)
            .execute()
            .unwrap();

        assert_eq!(report.measures, vec!["max_amount", "min_amount", "avg_amount"]);
        let a = GroupKey::Str("A".into());
        assert_eq!(report.value(&a, "max_amount"), Some(&AggregateResult::Int(30)));
        assert_eq!(report.value(&a, "min_amount"), Some(&AggregateResult::Int(10)));
        assert_eq!(report.value(&a, "avg_amount"), Some(&AggregateResult::Float(20.0)));
    }

    #[test]
    fn test_measure_order_ties_fall_back_to_key() {
        let table = sales();
        let report = table
            .query()
            .group_by("category")
            .aggregate("amount", AggregateOp::Avg)
            .order_by(SortOrder::MeasureDescending(0))
            .execute()
            .unwrap();

        let keys: Vec<String> = report.keys().map(|k| k.to_string()).collect();
        // A, B and C all average 20
        assert_eq!(keys, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_count_and_limit() {
        let table = sales();
        let report = table
            .query()
            .group_by("region")
            .count_as("count")
            .order_by(SortOrder::MeasureDescending(0))
            .limit(2)
            .execute()
            .unwrap();

        let keys: Vec<String> = report.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["EU", "US"]);
        assert_eq!(report.rows[1].values, vec![AggregateResult::Int(2)]);
    }

    #[test]
    fn test_nulls_are_skipped() {
        let table = sales();
        let report = table
            .query()
            .group_by("category")
            .aggregate("qty", AggregateOp::Avg)
            .aggregate("qty", AggregateOp::Count)
            .execute()
            .unwrap();

        let b = GroupKey::Str("B".into());
        assert_eq!(report.value(&b, "avg_qty"), Some(&AggregateResult::Float(5.0)));
        assert_eq!(report.value(&b, "count_qty"), Some(&AggregateResult::Int(1)));
    }

    #[test]
    fn test_integer_keys_sort_numerically() {
        let table = Table::from_csv_bytes(b"h,v\n10,1\n2,2\n10,3\n").unwrap();
        let report = table
            .query()
            .group_by("h")
            .aggregate("v", AggregateOp::Sum)
            .execute()
            .unwrap();
        assert_eq!(
            report.keys().cloned().collect::<Vec<_>>(),
            vec![GroupKey::Int(2), GroupKey::Int(10)]
        );
        assert_eq!(report.rows[1].values, vec![AggregateResult::Int(4)]);
    }

    #[test]
    fn test_rejects_bad_queries() {
        let table = sales();
        assert!(matches!(
            table.query().group_by("amount").count_as("n").execute(),
            Ok(_)
        ));
        let floats = Table::from_csv_bytes(b"x\n1.5\n").unwrap();
        assert!(matches!(
            floats.query().group_by("x").count_as("n").execute(),
            Err(ProcessorError::ColumnType { .. })
        ));
        assert!(matches!(
            table.query().group_by("region").execute(),
            Err(ProcessorError::InvalidQuery(_))
        ));
        assert!(matches!(
            table
                .query()
                .group_by("region")
                .count_as("n")
                .order_by(SortOrder::MeasureDescending(1))
                .execute(),
            Err(ProcessorError::InvalidQuery(_))
        ));
        assert!(matches!(
            table
                .query()
                .group_by("region")
                .aggregate("category", AggregateOp::Avg)
                .execute(),
            Err(ProcessorError::ColumnType { .. })
        ));
    }

    #[test]
    fn test_empty_table() {
        let table = Table::from_csv_bytes(b"region,amount\n").unwrap();
        assert!(matches!(
            table.query().group_by("region").count_as("n").execute(),
            Err(ProcessorError::EmptyTable(_))
        ));
    }
}
