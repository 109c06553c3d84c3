//! Load → derive → aggregate → rank → preview → render.
//!
//! Every report is computed once and shared by its console preview and
//! its chart. The first failure halts the run unless
//! [`PipelineConfig::keep_going`] is set, in which case chart failures are
//! logged and collected instead.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::aggregator::{self, COUNT_MEASURE, ColumnNames};
use crate::processor::{
    ProcessorError,
    features::{self, DEFAULT_PATTERN, TimestampPattern},
    report::{AggregateReport, RankedRows},
    table::Table,
};
use crate::ranker;
use crate::reporter::{self, ChartKind, ChartSeries, ChartSpec};

/// A stage failure: which stage, and why
#[derive(Debug, Error)]
#[error("stage `{stage}` failed")]
pub struct PipelineError {
    pub stage: String,
    #[source]
    pub source: ProcessorError,
}

trait StageExt<T> {
    fn stage(self, stage: &str) -> Result<T, PipelineError>;
}

impl<T> StageExt<T> for Result<T, ProcessorError> {
    fn stage(self, stage: &str) -> Result<T, PipelineError> {
        self.map_err(|source| PipelineError {
            stage: stage.to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub columns: ColumnNames,
    /// Spark/Java style pattern of the timestamp column
    pub timestamp_pattern: String,
    pub top_purchases: usize,
    /// Locations in the console ranking
    pub top_locations: usize,
    /// Locations in the chart
    pub top_locations_chart: usize,
    /// Purchase methods shown; `None` shows all
    pub top_methods: Option<usize>,
    pub keep_going: bool,
    pub print_previews: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            input: PathBuf::from("project1_df.csv"),
            output_dir: PathBuf::from("."),
            columns: ColumnNames::default(),
            timestamp_pattern: DEFAULT_PATTERN.to_string(),
            top_purchases: 10,
            top_locations: 5,
            top_locations_chart: 10,
            top_methods: None,
            keep_going: false,
            print_previews: true,
        }
    }
}

/// All reports of one run
#[derive(Debug, Clone, PartialEq)]
pub struct Reports {
    pub hourly: AggregateReport,
    pub daily: AggregateReport,
    pub monthly: AggregateReport,
    pub category: AggregateReport,
    pub locations: AggregateReport,
    pub methods: AggregateReport,
    pub top_purchases: RankedRows,
    pub top_locations: AggregateReport,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub rows: usize,
    /// Report name and group count
    pub reports: Vec<(String, usize)>,
    pub charts: Vec<PathBuf>,
    /// Chart file name and reason, only with `keep_going`
    pub failed_charts: Vec<(String, String)>,
}

/// Loads `path` and appends the calendar feature columns
pub fn load(config: &PipelineConfig) -> Result<Table, PipelineError> {
    let table = Table::load_csv(&config.input).stage("load")?;
    config.columns.check(&table).stage("load")?;
    info!(
        input = %config.input.display(),
        rows = table.row_count(),
        columns = table.headers().len(),
        "loaded table"
    );

    let pattern = TimestampPattern::parse(&config.timestamp_pattern).stage("derive")?;
    features::derive_calendar_features(table, &config.columns.timestamp, &pattern).stage("derive")
}

/// Computes every report from a feature-augmented table
pub fn analyze(table: &Table, config: &PipelineConfig) -> Result<Reports, PipelineError> {
    let cols = &config.columns;

    let hourly = aggregator::hourly_average(table, cols).stage("aggregate:hourly_avg")?;
    let daily = aggregator::daily_average(table, cols).stage("aggregate:day_avg")?;
    let monthly = aggregator::monthly_average(table, cols).stage("aggregate:monthly_avg")?;
    let category = aggregator::category_stats(table, cols).stage("aggregate:category_stats")?;
    let locations = aggregator::location_frequency(table, cols).stage("aggregate:location_freq")?;
    let methods =
        aggregator::purchase_method_frequency(table, cols).stage("aggregate:purchase_method_freq")?;

    let top_purchases = ranker::top_by_amount(table, &cols.amount, config.top_purchases)
        .stage("rank:top_purchases")?;
    let top_locations = locations.top(Some(config.top_locations));

    Ok(Reports {
        hourly,
        daily,
        monthly,
        category,
        locations,
        methods,
        top_purchases,
        top_locations,
    })
}

/// Prints every report in run order
pub fn print_previews(reports: &Reports, config: &PipelineConfig) {
    println!("{}", reports.hourly);
    println!("{}", reports.daily);
    println!("{}", reports.monthly);
    println!("{}", reports.category);
    println!("{}", reports.top_purchases.show(config.top_purchases));
    println!("{}", reports.top_locations);
    println!("{}", reports.methods.top(config.top_methods));
}

/// The six standard charts with the report and measure each one plots
pub fn standard_charts(
    reports: &Reports,
    config: &PipelineConfig,
) -> Vec<(ChartSpec, AggregateReport, &'static str)> {
    let inr = "Average Net Amount (INR)";
    let top_locations = reports.locations.top(Some(config.top_locations_chart));
    let methods = reports.methods.top(config.top_methods);

    vec![
        (
            ChartSpec::new(
                ChartKind::Line,
                "Average Net Purchase Amount by Hour",
                "chart_hourly_net_amount.png",
            )
            .labels("Hour of Day", inr)
            .color((0, 0, 255))
            .grid(true)
            .x_range(0, 23),
            reports.hourly.clone(),
            "avg_net_amount",
        ),
        (
            ChartSpec::new(
                ChartKind::VerticalBar,
                "Average Net Amount by Day of Week (1=Sun, 7=Sat)",
                "chart_day_avg.png",
            )
            .labels("Day of Week", inr)
            .color((255, 165, 0)),
            reports.daily.clone(),
            "avg_net_amount_day",
        ),
        (
            ChartSpec::new(ChartKind::Line, "Average Net Amount by Month", "chart_month_avg.png")
                .labels("Month", inr)
                .color((0, 128, 0)),
            reports.monthly.clone(),
            "avg_net_amount_month",
        ),
        (
            ChartSpec::new(
                ChartKind::HorizontalBar,
                "Average Net Amount by Product Category",
                "chart_category_avg.png",
            )
            .labels("Avg Net Amount (INR)", "")
            .size(1200, 600)
            .color((128, 0, 128)),
            reports.category.clone(),
            "avg_net_amount",
        ),
        (
            ChartSpec::new(
                ChartKind::VerticalBar,
                &format!("Top {} Locations by Purchase Count", config.top_locations_chart),
                "chart_top_locations.png",
            )
            .labels("Location", "Number of Purchases")
            .size(1200, 600)
            .color((0, 128, 128)),
            top_locations,
            COUNT_MEASURE,
        ),
        (
            ChartSpec::new(
                ChartKind::HorizontalBar,
                "Purchase Method Frequency",
                "chart_payment_method.png",
            )
            .labels("Count", "")
            .color((165, 42, 42)),
            methods,
            COUNT_MEASURE,
        ),
    ]
}

fn render_one(
    spec: &ChartSpec,
    report: &AggregateReport,
    measure: &str,
    out_dir: &Path,
) -> Result<PathBuf, ProcessorError> {
    let series = ChartSeries::from_report(report, measure)?;
    reporter::render_chart(&series, spec, out_dir)
}

/// Renders the standard charts into `config.output_dir`
pub fn render_all(
    reports: &Reports,
    config: &PipelineConfig,
    summary: &mut RunSummary,
) -> Result<(), PipelineError> {
    for (spec, report, measure) in standard_charts(reports, config) {
        match render_one(&spec, &report, measure, &config.output_dir) {
            Ok(path) => summary.charts.push(path),
            Err(e) if config.keep_going => {
                warn!(chart = %spec.file_name, error = %e, "chart skipped");
                summary.failed_charts.push((spec.file_name.clone(), e.to_string()));
            }
            Err(source) => {
                return Err(PipelineError {
                    stage: format!("render:{}", spec.file_name),
                    source,
                });
            }
        }
    }
    Ok(())
}

/// Runs the whole report
pub fn run(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    let table = load(config)?;
    let reports = analyze(&table, config)?;

    if config.print_previews {
        print_previews(&reports, config);
    }

    let mut summary = RunSummary {
        rows: table.row_count(),
        reports: [
            &reports.hourly,
            &reports.daily,
            &reports.monthly,
            &reports.category,
            &reports.locations,
            &reports.methods,
        ]
        .iter()
        .map(|r| (r.name.clone(), r.len()))
        .collect(),
        ..RunSummary::default()
    };

    render_all(&reports, config, &mut summary)?;

    info!(
        rows = summary.rows,
        charts = summary.charts.len(),
        failed = summary.failed_charts.len(),
        "report finished"
    );
    Ok(summary)
}
