use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use transaction_analytics::aggregator::ColumnNames;
use transaction_analytics::logging;
use transaction_analytics::pipeline::{self, PipelineConfig};
use transaction_analytics::processor::features::DEFAULT_PATTERN;

#[derive(Parser, Debug)]
#[command(name = "transaction-analytics")]
#[command(version)]
#[command(about = "Aggregate purchase transactions and render report charts", long_about = None)]
struct Cli {
    /// Input CSV file with a header row
    #[arg(default_value = "project1_df.csv")]
    input: PathBuf,

    /// Directory the chart images are written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Pattern of the timestamp column (Spark style, e.g. dd/MM/yyyy HH:mm:ss)
    #[arg(long, value_name = "PATTERN", default_value = DEFAULT_PATTERN)]
    timestamp_format: String,

    /// Rows kept by the top purchases ranking
    #[arg(long, default_value_t = 10)]
    top_purchases: usize,

    /// Locations kept by the console location ranking
    #[arg(long, default_value_t = 5)]
    top_locations: usize,

    /// Locations drawn in the location chart
    #[arg(long, default_value_t = 10)]
    top_locations_chart: usize,

    /// Purchase methods shown (all when omitted)
    #[arg(long)]
    top_methods: Option<usize>,

    /// Keep rendering the remaining charts when one fails
    #[arg(long)]
    keep_going: bool,

    /// Do not print report previews
    #[arg(long)]
    no_preview: bool,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, value_name = "NAME", default_value = "Purchase Date")]
    date_column: String,

    #[arg(long, value_name = "NAME", default_value = "Net Amount")]
    amount_column: String,

    #[arg(long, value_name = "NAME", default_value = "Product Category")]
    category_column: String,

    #[arg(long, value_name = "NAME", default_value = "Location")]
    location_column: String,

    #[arg(long, value_name = "NAME", default_value = "Purchase Method")]
    method_column: String,
}

impl Cli {
    fn into_config(self) -> PipelineConfig {
        PipelineConfig {
            input: self.input,
            output_dir: self.output_dir,
            columns: ColumnNames {
                timestamp: self.date_column,
                amount: self.amount_column,
                category: self.category_column,
                location: self.location_column,
                method: self.method_column,
            },
            timestamp_pattern: self.timestamp_format,
            top_purchases: self.top_purchases,
            top_locations: self.top_locations,
            top_locations_chart: self.top_locations_chart,
            top_methods: self.top_methods,
            keep_going: self.keep_going,
            print_previews: !self.no_preview,
        }
    }
}

fn run(config: PipelineConfig) -> anyhow::Result<()> {
    let summary = pipeline::run(&config)
        .with_context(|| format!("report over {} failed", config.input.display()))?;

    for path in &summary.charts {
        println!("wrote {}", path.display());
    }
    for (chart, reason) in &summary.failed_charts {
        println!("skipped {chart}: {reason}");
    }
    if !summary.failed_charts.is_empty() {
        anyhow::bail!("{} chart(s) failed", summary.failed_charts.len());
    }
    Ok(())
}

fn failure_message(e: &anyhow::Error) -> String {
    format!("error: {e:#}")
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level) {
        eprintln!("error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli.into_config()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // printed directly so `--log-level off` still reports it
            eprintln!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_names_stage() {
        let cli = Cli::parse_from([
            "transaction-analytics",
            "does/not/exist.csv",
            "--log-level",
            "off",
            "--no-preview",
        ]);
        assert_eq!(cli.log_level, "off");
        let err = run(cli.into_config()).unwrap_err();
        let msg = failure_message(&err);
        assert!(msg.starts_with("error: report over does/not/exist.csv failed"));
        assert!(msg.contains("stage `load` failed"));
        assert!(msg.contains("cannot open"));
    }
}
