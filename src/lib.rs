//! # transaction-analytics
//!
//! Batch report over a purchase transaction CSV. One run:
//!
//! - Loads the file into an in-memory columnar [`Table`] with inferred
//!   column types (int, float, string)
//! - Derives hour, day-of-week (1 = Sunday) and month columns from the
//!   timestamp column
//! - Computes six grouped reports: average amount by hour, day and month,
//!   max/min/average by category, and purchase counts by location and by
//!   purchase method
//! - Ranks the top purchases and the most frequent locations
//! - Prints console previews and renders one PNG chart per report
//!
//! # Example
//!
//! ```rust,no_run
//! use transaction_analytics::pipeline::{self, PipelineConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig {
//!         input: "project1_df.csv".into(),
//!         output_dir: "charts".into(),
//!         ..PipelineConfig::default()
//!     };
//!     let summary = pipeline::run(&config)?;
//!     println!("{} rows, {} charts", summary.rows, summary.charts.len());
//!     Ok(())
//! }
//! ```
//!
//! Individual steps are available on their own:
//!
//! ```rust
//! use transaction_analytics::aggregator::{self, ColumnNames};
//! use transaction_analytics::processor::table::Table;
//!
//! let table = Table::from_csv_bytes(b"Product Category,Net Amount\nA,100\nA,300\nB,150\n").unwrap();
//! let report = aggregator::category_stats(&table, &ColumnNames::default()).unwrap();
//! println!("{report}");
//! ```

pub mod aggregator;
pub mod logging;
pub mod pipeline;
pub mod processor;
pub mod ranker;
pub mod reporter;

pub use processor::{
    AggregateOp, AggregateResult, GroupKey, ProcessorError, Value,
    report::{AggregateReport, RankedRows},
    table::Table,
};
