//! The six grouped reports of the transaction analysis.

use tracing::info;

use crate::processor::{
    AggregateOp, ProcessorError,
    features::{DAY_COLUMN, HOUR_COLUMN, MONTH_COLUMN},
    query_builder::SortOrder,
    report::AggregateReport,
    table::Table,
};

/// Source column names of a transaction file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub timestamp: String,
    pub amount: String,
    pub category: String,
    pub location: String,
    pub method: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            timestamp: "Purchase Date".to_string(),
            amount: "Net Amount".to_string(),
            category: "Product Category".to_string(),
            location: "Location".to_string(),
            method: "Purchase Method".to_string(),
        }
    }
}

impl ColumnNames {
    /// Fails with [`ProcessorError::MissingColumn`] for the first absent column
    pub fn check(&self, table: &Table) -> Result<(), ProcessorError> {
        for name in [
            &self.timestamp,
            &self.amount,
            &self.category,
            &self.location,
            &self.method,
        ] {
            table.get_col(name)?;
        }
        Ok(())
    }
}

pub const COUNT_MEASURE: &str = "count";

fn average_by(
    table: &Table,
    name: &str,
    key: &str,
    amount: &str,
    alias: &str,
) -> Result<AggregateReport, ProcessorError> {
    let report = table
        .query()
        .name(name)
        .group_by(key)
        .aggregate_as(amount, AggregateOp::Avg, alias)
        .order_by(SortOrder::KeyAscending)
        .execute()?;
    info!(report = name, groups = report.len(), "computed average report");
    Ok(report)
}

/// Average net amount per hour of day, hours ascending
pub fn hourly_average(table: &Table, cols: &ColumnNames) -> Result<AggregateReport, ProcessorError> {
    average_by(table, "hourly_avg", HOUR_COLUMN, &cols.amount, "avg_net_amount")
}

/// Average net amount per day of week (1 = Sunday), days ascending
pub fn daily_average(table: &Table, cols: &ColumnNames) -> Result<AggregateReport, ProcessorError> {
    average_by(table, "day_avg", DAY_COLUMN, &cols.amount, "avg_net_amount_day")
}

/// Average net amount per month, months ascending
pub fn monthly_average(table: &Table, cols: &ColumnNames) -> Result<AggregateReport, ProcessorError> {
    average_by(table, "monthly_avg", MONTH_COLUMN, &cols.amount, "avg_net_amount_month")
}

/// Max, min and average net amount per category, highest average first
pub fn category_stats(table: &Table, cols: &ColumnNames) -> Result<AggregateReport, ProcessorError> {
    let report = table
        .query()
        .name("category_stats")
        .group_by(&cols.category)
        .aggregate_as(&cols.amount, AggregateOp::Max, "max_net_amount")
        .aggregate_as(&cols.amount, AggregateOp::Min, "min_net_amount")
        .aggregate_as(&cols.amount, AggregateOp::Avg, "avg_net_amount")
        .order_by(SortOrder::MeasureDescending(2))
        .execute()?;
    info!(report = "category_stats", groups = report.len(), "computed category report");
    Ok(report)
}

/// Row count per distinct value of `column`, most frequent first
///
/// Equal counts are ordered by ascending key.
pub fn frequency(table: &Table, name: &str, column: &str) -> Result<AggregateReport, ProcessorError> {
    let report = table
        .query()
        .name(name)
        .group_by(column)
        .count_as(COUNT_MEASURE)
        .order_by(SortOrder::MeasureDescending(0))
        .execute()?;
    info!(report = name, groups = report.len(), "computed frequency report");
    Ok(report)
}

pub fn location_frequency(
    table: &Table,
    cols: &ColumnNames,
) -> Result<AggregateReport, ProcessorError> {
    frequency(table, "location_freq", &cols.location)
}

pub fn purchase_method_frequency(
    table: &Table,
    cols: &ColumnNames,
) -> Result<AggregateReport, ProcessorError> {
    frequency(table, "purchase_method_freq", &cols.method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{AggregateResult, GroupKey};

    fn table(csv: &str) -> Table {
        Table::from_csv_bytes(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_category_scenario() {
        let t = table("Product Category,Net Amount\nA,100\nA,200\nA,300\n");
        let report = category_stats(&t, &ColumnNames::default()).unwrap();
        assert_eq!(report.len(), 1);
        let a = GroupKey::Str("A".into());
        assert_eq!(report.value(&a, "max_net_amount"), Some(&AggregateResult::Int(300)));
        assert_eq!(report.value(&a, "min_net_amount"), Some(&AggregateResult::Int(100)));
        assert_eq!(report.value(&a, "avg_net_amount"), Some(&AggregateResult::Float(200.0)));
    }

    #[test]
    fn test_category_order_by_average() {
        let t = table("Product Category,Net Amount\nB,100\nA,100\nB,200\nA,300\n");
        let report = category_stats(&t, &ColumnNames::default()).unwrap();
        let keys: Vec<String> = report.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn test_frequency_counts_sum_to_rows() {
        let t = table("Location,Net Amount\nPune,1\nDelhi,2\nPune,3\nGoa,4\nDelhi,5\nPune,6\n");
        let report = location_frequency(&t, &ColumnNames::default()).unwrap();
        let total: f64 = report
            .rows
            .iter()
            .filter_map(|r| r.values[0].as_f64())
            .sum();
        assert_eq!(total as usize, t.row_count());
        let keys: Vec<String> = report.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["Pune", "Delhi", "Goa"]);
    }

    #[test]
    fn test_check_reports_missing_column() {
        let t = table("Location,Net Amount\nPune,1\n");
        assert!(matches!(
            ColumnNames::default().check(&t),
            Err(ProcessorError::MissingColumn(c)) if c == "Purchase Date"
        ));
    }
}
