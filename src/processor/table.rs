use csv::ReaderBuilder;
use memmap2::Mmap;
use std::{collections::HashSet, fs::File, path::Path};
use tracing::debug;

use crate::processor::{
    ProcessorError, Value,
    column::{Column, ColumnType},
    query_builder::QueryBuilder,
};

/// In-memory columnar table loaded from a CSV file
///
/// The row count is fixed once the table exists. Derived columns are added
/// with [`Table::with_column`], which never replaces an existing column.
///
/// # Examples
///
/// ```rust,no_run
/// # use transaction_analytics::processor::table::Table;
/// let table = Table::load_csv("project1_df.csv".as_ref()).unwrap();
/// println!("{} rows", table.row_count());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Loads a CSV file through a read-only memory map
    ///
    /// Column types are inferred over every row (Int, Float, Str); empty
    /// cells of numeric columns become nulls.
    ///
    /// # Errors
    /// Returns [`ProcessorError::Load`] if:
    /// - the file cannot be opened, mapped or is empty
    /// - the header is missing or has duplicate names
    /// - a row's field count differs from the header, or a cell is not UTF-8
    pub fn load_csv(path: &Path) -> Result<Self, ProcessorError> {
        let file = File::open(path)
            .map_err(|e| ProcessorError::Load(format!("cannot open {}: {e}", path.display())))?;
        let len = file
            .metadata()
            .map_err(|e| ProcessorError::Load(format!("cannot stat {}: {e}", path.display())))?
            .len();
        if len == 0 {
            return Err(ProcessorError::Load(format!("{} is empty", path.display())));
        }

        // SAFETY: the map is read-only and does not outlive this call.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| ProcessorError::Load(format!("cannot map {}: {e}", path.display())))?;

        Self::from_csv_bytes(&mmap[..])
    }

    /// Parses CSV bytes (header row first) into a table
    pub fn from_csv_bytes(buf: &[u8]) -> Result<Self, ProcessorError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(buf);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ProcessorError::Load(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ProcessorError::Load("missing header line".into()));
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| ProcessorError::Load(format!("row {}: {e}", idx + 1)))?;
            for (col_idx, field) in record.iter().enumerate() {
                cells[col_idx].push(field.to_string());
            }
        }

        let named: Vec<(String, Column)> = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| {
                let column = Self::infer_column(values);
                debug!(column = %name, column_type = column.column_type().name(), "inferred column type");
                (name, column)
            })
            .collect();

        Self::from_columns(named)
    }

    /// Builds a table from named columns of equal length
    pub fn from_columns(named: Vec<(String, Column)>) -> Result<Self, ProcessorError> {
        let row_count = named.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut seen = HashSet::new();

        for (name, column) in &named {
            if !seen.insert(name.as_str()) {
                return Err(ProcessorError::Load(format!("duplicate column name {name:?}")));
            }
            if column.len() != row_count {
                return Err(ProcessorError::Load(format!(
                    "column {name:?} has {} rows, expected {row_count}",
                    column.len()
                )));
            }
        }

        let (headers, columns) = named.into_iter().unzip();
        Ok(Table {
            headers,
            columns,
            row_count,
        })
    }

    fn infer_column(cells: Vec<String>) -> Column {
        let ty = Self::infer_type(&cells);
        match ty {
            ColumnType::Int64 => Column::Int64(
                cells
                    .iter()
                    .map(|c| atoi_simd::parse::<i64>(c.trim().as_bytes()).ok())
                    .collect(),
            ),
            ColumnType::Float64 => Column::Float64(
                cells
                    .iter()
                    .map(|c| fast_float::parse::<f64, _>(c.trim()).ok())
                    .collect(),
            ),
            ColumnType::Str => Column::Str(cells),
        }
    }

    fn infer_type(cells: &[String]) -> ColumnType {
        let mut non_empty = cells.iter().map(|c| c.trim()).filter(|c| !c.is_empty()).peekable();
        if non_empty.peek().is_none() {
            return ColumnType::Str;
        }

        let mut ty = ColumnType::Int64;
        for cell in non_empty {
            if ty == ColumnType::Int64 && atoi_simd::parse::<i64>(cell.as_bytes()).is_ok() {
                continue;
            }
            match fast_float::parse::<f64, _>(cell) {
                Ok(v) if v.is_finite() => ty = ColumnType::Float64,
                _ => return ColumnType::Str,
            }
        }
        ty
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn get_col(&self, col_name: &str) -> Result<&Column, ProcessorError> {
        let col_pos = self
            .headers
            .iter()
            .position(|cn| cn == col_name)
            .ok_or_else(|| ProcessorError::MissingColumn(col_name.to_string()))?;

        self.columns
            .get(col_pos)
            .ok_or_else(|| ProcessorError::MissingColumn(col_name.to_string()))
    }

    /// Returns a new table with `column` appended under `name`
    ///
    /// Fails if the name is already taken or the length differs from the
    /// row count.
    pub fn with_column(mut self, name: &str, column: Column) -> Result<Self, ProcessorError> {
        if self.headers.iter().any(|h| h == name) {
            return Err(ProcessorError::Load(format!(
                "column {name:?} already exists"
            )));
        }
        if column.len() != self.row_count {
            return Err(ProcessorError::Load(format!(
                "column {name:?} has {} rows, expected {}",
                column.len(),
                self.row_count
            )));
        }
        self.headers.push(name.to_string());
        self.columns.push(column);
        Ok(self)
    }

    pub fn value(&self, row: usize, col_name: &str) -> Result<Value, ProcessorError> {
        self.get_col(col_name)?
            .value(row)
            .ok_or_else(|| ProcessorError::Load(format!("row {row} out of range")))
    }

    /// All cells of one row, in header order
    pub fn row(&self, idx: usize) -> Vec<Value> {
        self.columns
            .iter()
            .map(|c| c.value(idx).unwrap_or(Value::Null))
            .collect()
    }

    /// Start a grouped query over this table
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }
}
