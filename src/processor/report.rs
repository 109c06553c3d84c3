use std::fmt;

use crate::processor::{AggregateResult, GroupKey, Value};

/// Rows shown by `Display`
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

const MAX_CELL_WIDTH: usize = 20;

/// One group of an aggregate report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub key: GroupKey,
    /// One value per measure, in measure order
    pub values: Vec<AggregateResult>,
}

/// Grouped summary table: one row per distinct key, in report order
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub name: String,
    pub key_column: String,
    pub measures: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl AggregateReport {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> + '_ {
        self.rows.iter().map(|r| &r.key)
    }

    pub fn measure_index(&self, measure: &str) -> Option<usize> {
        self.measures.iter().position(|m| m == measure)
    }

    pub fn get(&self, key: &GroupKey) -> Option<&ReportRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    /// Value of `measure` for `key`
    pub fn value(&self, key: &GroupKey, measure: &str) -> Option<&AggregateResult> {
        let idx = self.measure_index(measure)?;
        self.get(key).and_then(|r| r.values.get(idx))
    }

    /// The first `k` rows as a new report; `None` keeps every row
    pub fn top(&self, k: Option<usize>) -> AggregateReport {
        let rows = match k {
            Some(k) => self.rows.iter().take(k).cloned().collect(),
            None => self.rows.clone(),
        };
        AggregateReport {
            name: self.name.clone(),
            key_column: self.key_column.clone(),
            measures: self.measures.clone(),
            rows,
        }
    }

    /// Console preview of at most `n` rows
    pub fn show(&self, n: usize) -> String {
        let mut headers = vec![self.key_column.clone()];
        headers.extend(self.measures.iter().cloned());

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(n)
            .map(|r| {
                let mut line = vec![r.key.to_string()];
                line.extend(r.values.iter().map(|v| v.to_string()));
                line
            })
            .collect();

        format_table(&headers, &cells, self.rows.len())
    }
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.show(DEFAULT_PREVIEW_ROWS))
    }
}

/// A source row kept by a ranking
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    /// Position of the row in the source table
    pub index: usize,
    pub values: Vec<Value>,
}

/// Bounded, ordered selection of whole source rows
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRows {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RankedRow>,
}

impl RankedRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Cells of `column` in rank order
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().filter_map(|r| r.values.get(idx)).collect())
    }

    pub fn show(&self, n: usize) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(n)
            .map(|r| r.values.iter().map(|v| v.to_string()).collect())
            .collect();
        format_table(&self.headers, &cells, self.rows.len())
    }
}

impl fmt::Display for RankedRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.show(DEFAULT_PREVIEW_ROWS))
    }
}

fn truncate_cell(cell: &str) -> String {
    if cell.chars().count() > MAX_CELL_WIDTH {
        let head: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        cell.to_string()
    }
}

/// Bordered text table, cells right-aligned and cut at 20 characters
fn format_table(headers: &[String], rows: &[Vec<String>], total_rows: usize) -> String {
    let headers: Vec<String> = headers.iter().map(|h| truncate_cell(h)).collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.iter().map(|c| truncate_cell(c)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
                .max(3)
        })
        .collect();

    let border: String = widths.iter().fold(String::from("+"), |mut acc, w| {
        acc.push_str(&"-".repeat(*w));
        acc.push('+');
        acc
    });

    let line = |cells: &[String]| -> String {
        let mut out = String::from("|");
        for (i, &w) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            out.push_str(&format!("{cell:>w$}|"));
        }
        out
    };

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    out.push_str(&line(&headers));
    out.push('\n');
    out.push_str(&border);
    out.push('\n');
    for r in &rows {
        out.push_str(&line(r));
        out.push('\n');
    }
    out.push_str(&border);
    out.push('\n');
    if rows.len() < total_rows {
        let n = rows.len();
        let noun = if n == 1 { "row" } else { "rows" };
        out.push_str(&format!("only showing top {n} {noun}\n"));
    }
    out
}
