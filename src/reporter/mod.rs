//! Chart rendering of reports and rankings.
//!
//! A [`ChartSeries`] is extracted from an [`AggregateReport`] measure or a
//! [`RankedRows`] column, validated against a [`ChartSpec`] and drawn to a
//! PNG with plotters.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::processor::{
    GroupKey, ProcessorError, Value,
    report::{AggregateReport, RankedRows},
};

mod render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    VerticalBar,
    HorizontalBar,
}

/// Everything needed to draw and save one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub file_name: String,
    /// Pixels, width by height
    pub size: (u32, u32),
    /// RGB fill or stroke colour
    pub color: (u8, u8, u8),
    pub grid: bool,
    /// Fixed numeric x axis (inclusive); otherwise fitted to the data
    pub x_range: Option<(i64, i64)>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: &str, file_name: &str) -> Self {
        ChartSpec {
            kind,
            title: title.to_string(),
            x_label: String::new(),
            y_label: String::new(),
            file_name: file_name.to_string(),
            size: (1000, 600),
            color: (31, 119, 180),
            grid: false,
            x_range: None,
        }
    }

    pub fn labels(mut self, x: &str, y: &str) -> Self {
        self.x_label = x.to_string();
        self.y_label = y.to_string();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn color(mut self, color: (u8, u8, u8)) -> Self {
        self.color = color;
        self
    }

    pub fn grid(mut self, grid: bool) -> Self {
        self.grid = grid;
        self
    }

    pub fn x_range(mut self, lo: i64, hi: i64) -> Self {
        self.x_range = Some((lo, hi));
        self
    }
}

/// X axis of a series
#[derive(Debug, Clone, PartialEq)]
pub enum XValues {
    Numeric(Vec<i64>),
    Labels(Vec<String>),
}

impl XValues {
    pub fn len(&self) -> usize {
        match self {
            XValues::Numeric(v) => v.len(),
            XValues::Labels(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tick labels in series order
    pub fn labels(&self) -> Vec<String> {
        match self {
            XValues::Numeric(v) => v.iter().map(|x| x.to_string()).collect(),
            XValues::Labels(v) => v.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub x: XValues,
    pub y: Vec<f64>,
}

impl ChartSeries {
    /// Series of one measure; integer keys give a numeric x axis
    pub fn from_report(report: &AggregateReport, measure: &str) -> Result<Self, ProcessorError> {
        let idx = report.measure_index(measure).ok_or_else(|| ProcessorError::Render {
            chart: report.name.clone(),
            reason: format!("report has no measure {measure:?}"),
        })?;

        let y = report
            .rows
            .iter()
            .map(|r| {
                r.values.get(idx).and_then(|v| v.as_f64()).ok_or_else(|| ProcessorError::Render {
                    chart: report.name.clone(),
                    reason: format!("{measure} is null for group {}", r.key),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let ints: Option<Vec<i64>> = report
            .keys()
            .map(|k| match k {
                GroupKey::Int(v) => Some(*v),
                _ => None,
            })
            .collect();

        let x = match ints {
            Some(v) if !v.is_empty() => XValues::Numeric(v),
            _ => XValues::Labels(report.keys().map(|k| k.to_string()).collect()),
        };

        Ok(ChartSeries { x, y })
    }

    /// Series of ranked rows: `label_col` as labels, `value_col` as bar length
    pub fn from_ranked(
        ranked: &RankedRows,
        label_col: &str,
        value_col: &str,
    ) -> Result<Self, ProcessorError> {
        let missing = |col: &str| ProcessorError::Render {
            chart: ranked.name.clone(),
            reason: format!("ranking has no column {col:?}"),
        };
        let labels = ranked.column_values(label_col).ok_or_else(|| missing(label_col))?;
        let values = ranked.column_values(value_col).ok_or_else(|| missing(value_col))?;

        let y = values
            .into_iter()
            .map(|v| match v {
                Value::Int(i) => Ok(*i as f64),
                Value::Float(f) => Ok(*f),
                other => Err(ProcessorError::Render {
                    chart: ranked.name.clone(),
                    reason: format!("{value_col} value {other} is not numeric"),
                }),
            })
            .collect::<Result<Vec<f64>, _>>()?;

        Ok(ChartSeries {
            x: XValues::Labels(labels.into_iter().map(|v| v.to_string()).collect()),
            y,
        })
    }

    fn validate(&self, spec: &ChartSpec) -> Result<(), ProcessorError> {
        let fail = |reason: &str| -> Result<(), ProcessorError> {
            Err(ProcessorError::Render {
                chart: spec.file_name.clone(),
                reason: reason.to_string(),
            })
        };

        if self.y.is_empty() || self.x.is_empty() {
            return fail("no data to plot");
        }
        if self.x.len() != self.y.len() {
            return fail("x and y lengths differ");
        }
        if self.y.iter().any(|v| !v.is_finite()) {
            return fail("y values must be finite");
        }
        if spec.kind == ChartKind::Line && matches!(self.x, XValues::Labels(_)) {
            return fail("line chart needs a numeric x axis");
        }
        if let (Some((lo, hi)), XValues::Numeric(xs)) = (spec.x_range, &self.x) {
            if lo > hi || xs.iter().any(|x| *x < lo || *x > hi) {
                return fail("x values fall outside the fixed x range");
            }
        }
        Ok(())
    }
}

/// Validates, draws and writes `series` to `out_dir/spec.file_name`
///
/// An existing file is overwritten.
pub fn render_chart(
    series: &ChartSeries,
    spec: &ChartSpec,
    out_dir: &Path,
) -> Result<PathBuf, ProcessorError> {
    series.validate(spec)?;
    std::fs::create_dir_all(out_dir)?;

    let path = out_dir.join(&spec.file_name);
    match spec.kind {
        ChartKind::Line => render::line(series, spec, &path)?,
        ChartKind::VerticalBar => render::vertical_bars(series, spec, &path)?,
        ChartKind::HorizontalBar => render::horizontal_bars(series, spec, &path)?,
    }

    info!(chart = %path.display(), points = series.y.len(), "chart written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{
        AggregateResult,
        report::{RankedRow, ReportRow},
    };

    fn report(keys: Vec<GroupKey>, values: Vec<AggregateResult>) -> AggregateReport {
        AggregateReport {
            name: "r".into(),
            key_column: "k".into(),
            measures: vec!["m".into()],
            rows: keys
                .into_iter()
                .zip(values)
                .map(|(key, v)| ReportRow {
                    key,
                    values: vec![v],
                })
                .collect(),
        }
    }

    #[test]
    fn test_integer_keys_are_numeric() {
        let r = report(
            vec![GroupKey::Int(1), GroupKey::Int(2)],
            vec![AggregateResult::Float(1.5), AggregateResult::Int(3)],
        );
        let s = ChartSeries::from_report(&r, "m").unwrap();
        assert_eq!(s.x, XValues::Numeric(vec![1, 2]));
        assert_eq!(s.y, vec![1.5, 3.0]);
    }

    #[test]
    fn test_string_keys_are_labels() {
        let r = report(
            vec![GroupKey::Str("a".into())],
            vec![AggregateResult::Int(3)],
        );
        let s = ChartSeries::from_report(&r, "m").unwrap();
        assert_eq!(s.x, XValues::Labels(vec!["a".into()]));
    }

    #[test]
    fn test_null_measure_is_render_error() {
        let r = report(vec![GroupKey::Int(1)], vec![AggregateResult::Null]);
        assert!(matches!(
            ChartSeries::from_report(&r, "m"),
            Err(ProcessorError::Render { .. })
        ));
        assert!(ChartSeries::from_report(&r, "other").is_err());
    }

    #[test]
    fn test_from_ranked() {
        let ranked = RankedRows {
            name: "top".into(),
            headers: vec!["id".into(), "amt".into()],
            rows: vec![RankedRow {
                index: 0,
                values: vec![Value::Str("x".into()), Value::Float(2.5)],
            }],
        };
        let s = ChartSeries::from_ranked(&ranked, "id", "amt").unwrap();
        assert_eq!(s.y, vec![2.5]);
        assert!(ChartSeries::from_ranked(&ranked, "amt", "id").is_err());
    }

    #[test]
    fn test_empty_series_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let series = ChartSeries {
            x: XValues::Numeric(vec![]),
            y: vec![],
        };
        let spec = ChartSpec::new(ChartKind::VerticalBar, "t", "empty.png");
        let err = render_chart(&series, &spec, dir.path()).unwrap_err();
        assert!(matches!(err, ProcessorError::Render { chart, .. } if chart == "empty.png"));
        assert!(!dir.path().join("empty.png").exists());
    }

    #[test]
    fn test_line_over_labels_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let series = ChartSeries {
            x: XValues::Labels(vec!["a".into()]),
            y: vec![1.0],
        };
        let spec = ChartSpec::new(ChartKind::Line, "t", "line.png");
        assert!(matches!(
            render_chart(&series, &spec, dir.path()),
            Err(ProcessorError::Render { .. })
        ));
    }

    #[test]
    fn test_fixed_range_must_cover_data() {
        let series = ChartSeries {
            x: XValues::Numeric(vec![0, 30]),
            y: vec![1.0, 2.0],
        };
        let spec = ChartSpec::new(ChartKind::Line, "t", "h.png").x_range(0, 23);
        assert!(series.validate(&spec).is_err());
        let spec = spec.x_range(0, 30);
        assert!(series.validate(&spec).is_ok());
    }

    #[test]
    fn test_line_over_wide_x_range_renders() {
        let dir = tempfile::tempdir().unwrap();
        for (i, xs) in [vec![0, 5_000_000], vec![i64::MIN / 2, i64::MAX / 2]]
            .into_iter()
            .enumerate()
        {
            let series = ChartSeries {
                x: XValues::Numeric(xs),
                y: vec![1.0, 2.0],
            };
            let spec = ChartSpec::new(ChartKind::Line, "wide", &format!("wide_{i}.png"));
            let path = render_chart(&series, &spec, dir.path()).unwrap();
            assert!(path.exists());
        }
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let series = ChartSeries {
            x: XValues::Labels(vec!["Delhi".into(), "Pune".into()]),
            y: vec![3.0, 1.0],
        };
        let spec = ChartSpec::new(ChartKind::HorizontalBar, "t", "bars.png");
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let first = std::fs::read(render_chart(&series, &spec, a.path()).unwrap()).unwrap();
        let second = std::fs::read(render_chart(&series, &spec, b.path()).unwrap()).unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
