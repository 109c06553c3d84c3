//! Order-and-limit views over a table.

use std::cmp::Ordering;
use tracing::info;

use crate::aggregator;
use crate::processor::{
    ProcessorError,
    report::{AggregateReport, RankedRow, RankedRows},
    table::Table,
};

/// The `k` rows with the highest `amount_col`, highest first
///
/// The sort is stable: equal amounts keep source row order. Null amounts
/// rank after every number.
pub fn top_by_amount(table: &Table, amount_col: &str, k: usize) -> Result<RankedRows, ProcessorError> {
    if table.is_empty() {
        return Err(ProcessorError::EmptyTable(format!("rank by {amount_col}")));
    }

    let amounts = table.get_col(amount_col)?.numeric(amount_col)?;
    let mut order: Vec<usize> = (0..table.row_count()).collect();
    order.sort_by(|&a, &b| match (amounts[a], amounts[b]) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let rows: Vec<RankedRow> = order
        .into_iter()
        .take(k)
        .map(|index| RankedRow {
            index,
            values: table.row(index),
        })
        .collect();

    info!(column = amount_col, k, kept = rows.len(), "ranked rows");
    Ok(RankedRows {
        name: format!("top_{k}_by_{amount_col}"),
        headers: table.headers().to_vec(),
        rows,
    })
}

/// The `k` most frequent values of `column`; `None` keeps every group
///
/// Built on [`aggregator::frequency`], so equal counts are ordered by
/// ascending value.
pub fn top_groups(
    table: &Table,
    column: &str,
    k: Option<usize>,
) -> Result<AggregateReport, ProcessorError> {
    if table.is_empty() {
        return Err(ProcessorError::EmptyTable(format!("rank groups of {column}")));
    }
    let report = aggregator::frequency(table, &format!("top_{column}"), column)?;
    Ok(report.top(k))
}
