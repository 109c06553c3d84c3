use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

use super::{ChartSeries, ChartSpec, XValues};
use crate::processor::ProcessorError;

const MAX_X_LABELS: usize = 24;

fn draw_err<E: Display>(spec: &ChartSpec) -> impl Fn(E) -> ProcessorError + '_ {
    move |e| ProcessorError::Render {
        chart: spec.file_name.clone(),
        reason: e.to_string(),
    }
}

fn rgb(spec: &ChartSpec) -> RGBColor {
    let (r, g, b) = spec.color;
    RGBColor(r, g, b)
}

/// Value axis of a bar chart: always includes zero
fn bar_range(values: &[f64]) -> Range<f64> {
    let lo = values.iter().copied().fold(0.0, f64::min);
    let hi = values.iter().copied().fold(0.0, f64::max);
    if lo == hi {
        return 0.0..1.0;
    }
    (lo * 1.1)..(hi * 1.1)
}

/// Value axis of a line chart: data extent plus 10%
fn line_range(values: &[f64]) -> Range<f64> {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut pad = (hi - lo) * 0.1;
    if pad == 0.0 {
        pad = (hi.abs() * 0.1).max(1.0);
    }
    (lo - pad)..(hi + pad)
}

/// Line chart x axis and its tick count, at most one tick per integer
fn x_axis(lo: i64, hi: i64) -> (Range<i64>, usize) {
    let (lo, hi) = if lo == hi {
        (lo.saturating_sub(1), hi.saturating_add(1))
    } else {
        (lo, hi)
    };
    let span = (i128::from(hi) - i128::from(lo) + 1).clamp(1, MAX_X_LABELS as i128);
    (lo..hi, span as usize)
}

fn label_at(labels: &[String], v: &SegmentValue<i32>) -> String {
    match v {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| labels.get(i))
            .cloned()
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

pub(super) fn line(series: &ChartSeries, spec: &ChartSpec, path: &Path) -> Result<(), ProcessorError> {
    let XValues::Numeric(xs) = &series.x else {
        return Err(ProcessorError::Render {
            chart: spec.file_name.clone(),
            reason: "line chart needs a numeric x axis".into(),
        });
    };

    let (lo, hi) = spec.x_range.unwrap_or_else(|| {
        let lo = xs.iter().copied().min().unwrap_or(0);
        let hi = xs.iter().copied().max().unwrap_or(0);
        (lo, hi)
    });
    let (x_range, x_labels) = x_axis(lo, hi);

    let points: Vec<(i64, f64)> = xs.iter().copied().zip(series.y.iter().copied()).collect();
    let color = rgb(spec);

    let root = BitMapBackend::new(path, spec.size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err(spec))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, line_range(&series.y))
        .map_err(draw_err(spec))?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(x_labels)
            .x_desc(&spec.x_label)
            .y_desc(&spec.y_label);
        if !spec.grid {
            mesh.disable_mesh();
        }
        mesh.draw().map_err(draw_err(spec))?;
    }

    chart
        .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
        .map_err(draw_err(spec))?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, color.filled())))
        .map_err(draw_err(spec))?;

    root.present().map_err(draw_err(spec))?;
    Ok(())
}

pub(super) fn vertical_bars(
    series: &ChartSeries,
    spec: &ChartSpec,
    path: &Path,
) -> Result<(), ProcessorError> {
    let labels = series.x.labels();
    let n = labels.len() as i32;
    let color = rgb(spec);

    let root = BitMapBackend::new(path, spec.size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err(spec))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d((0..n).into_segmented(), bar_range(&series.y))
        .map_err(draw_err(spec))?;

    let x_label = |v: &SegmentValue<i32>| label_at(&labels, v);
    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .x_labels(labels.len())
            .x_label_formatter(&x_label)
            .x_desc(&spec.x_label)
            .y_desc(&spec.y_label);
        if !spec.grid {
            mesh.disable_y_mesh();
        }
        mesh.draw().map_err(draw_err(spec))?;
    }

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(color.filled())
                .margin(8)
                .data(series.y.iter().enumerate().map(|(i, &v)| (i as i32, v))),
        )
        .map_err(draw_err(spec))?;

    root.present().map_err(draw_err(spec))?;
    Ok(())
}

/// First series entry is drawn at the top
pub(super) fn horizontal_bars(
    series: &ChartSeries,
    spec: &ChartSpec,
    path: &Path,
) -> Result<(), ProcessorError> {
    let mut labels = series.x.labels();
    labels.reverse();
    let n = labels.len() as i32;
    let color = rgb(spec);

    let root = BitMapBackend::new(path, spec.size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err(spec))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(160)
        .build_cartesian_2d(bar_range(&series.y), (0..n).into_segmented())
        .map_err(draw_err(spec))?;

    let y_label = |v: &SegmentValue<i32>| label_at(&labels, v);
    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_y_mesh()
            .y_labels(labels.len())
            .y_label_formatter(&y_label)
            .x_desc(&spec.x_label)
            .y_desc(&spec.y_label);
        if !spec.grid {
            mesh.disable_x_mesh();
        }
        mesh.draw().map_err(draw_err(spec))?;
    }

    chart
        .draw_series(
            Histogram::horizontal(&chart)
                .style(color.filled())
                .margin(6)
                .data(
                    series
                        .y
                        .iter()
                        .enumerate()
                        .map(|(i, &v)| (n - 1 - i as i32, v)),
                ),
        )
        .map_err(draw_err(spec))?;

    root.present().map_err(draw_err(spec))?;
    Ok(())
}
