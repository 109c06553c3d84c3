//! Calendar features derived from a textual timestamp column.
//!
//! Timestamps are described with Spark/Java style patterns such as
//! `dd/MM/yyyy HH:mm:ss`, compiled once into a chrono format string.
//! Day of week is numbered 1 = Sunday through 7 = Saturday regardless of
//! locale.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, format::ParseErrorKind};
use tracing::{debug, info};

use crate::processor::{ProcessorError, RowError, column::Column, table::Table};

pub const HOUR_COLUMN: &str = "purchase_hour";
pub const DAY_COLUMN: &str = "purchase_day";
pub const MONTH_COLUMN: &str = "purchase_month";

pub const DEFAULT_PATTERN: &str = "dd/MM/yyyy HH:mm:ss";

/// A compiled datetime pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampPattern {
    source: String,
    chrono_format: String,
}

impl TimestampPattern {
    /// Compiles a Spark/Java style pattern
    ///
    /// Supported letters: `y M d H h m s S a E`. Text inside single quotes
    /// is literal, `''` is a quote. Any non-letter is literal.
    pub fn parse(pattern: &str) -> Result<Self, ProcessorError> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut out = String::with_capacity(pattern.len() * 2);
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '\'' {
                if chars.get(i + 1) == Some(&'\'') {
                    out.push('\'');
                    i += 2;
                    continue;
                }
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        None => return Err(pattern_error(pattern, "unterminated quote")),
                        Some('\'') if chars.get(j + 1) == Some(&'\'') => {
                            out.push('\'');
                            j += 2;
                        }
                        Some('\'') => break,
                        Some(&lit) => {
                            push_literal(&mut out, lit);
                            j += 1;
                        }
                    }
                }
                i = j + 1;
                continue;
            }

            if !c.is_ascii_alphabetic() {
                push_literal(&mut out, c);
                i += 1;
                continue;
            }

            let run = chars[i..].iter().take_while(|&&x| x == c).count();
            let spec = match (c, run) {
                ('y', 2) => "%y".to_string(),
                ('y', _) => "%Y".to_string(),
                ('M', 1 | 2) => "%m".to_string(),
                ('M', 3) => "%b".to_string(),
                ('M', _) => "%B".to_string(),
                ('d', 1 | 2) => "%d".to_string(),
                ('H', 1 | 2) => "%H".to_string(),
                ('h', 1 | 2) => "%I".to_string(),
                ('m', 1 | 2) => "%M".to_string(),
                ('s', 1 | 2) => "%S".to_string(),
                ('S', 3 | 6 | 9) => format!("%{run}f"),
                ('a', 1) => "%p".to_string(),
                ('E', 1..=3) => "%a".to_string(),
                ('E', _) => "%A".to_string(),
                _ => {
                    return Err(pattern_error(
                        pattern,
                        &format!("unsupported field {:?}", c.to_string().repeat(run)),
                    ));
                }
            };
            out.push_str(&spec);
            i += run;
        }

        debug!(pattern, chrono_format = %out, "compiled timestamp pattern");
        Ok(TimestampPattern {
            source: pattern.to_string(),
            chrono_format: out,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn chrono_format(&self) -> &str {
        &self.chrono_format
    }

    /// Parses one value; date-only patterns yield midnight
    pub fn parse_value(&self, value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        match NaiveDateTime::parse_from_str(value, &self.chrono_format) {
            Ok(ts) => Ok(ts),
            Err(e) if e.kind() == ParseErrorKind::NotEnough => {
                let date = NaiveDate::parse_from_str(value, &self.chrono_format)?;
                Ok(date.and_time(chrono::NaiveTime::MIN))
            }
            Err(e) => Err(e),
        }
    }
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn pattern_error(pattern: &str, reason: &str) -> ProcessorError {
    ProcessorError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}

/// Day of week with 1 = Sunday, 7 = Saturday
pub fn day_of_week(ts: &NaiveDateTime) -> i64 {
    ts.weekday().number_from_sunday() as i64
}

/// Parses every value of `column`, returning the failures
///
/// Values and failures keep row order; a failing row yields `None`.
pub fn parse_column(
    table: &Table,
    column: &str,
    pattern: &TimestampPattern,
) -> Result<(Vec<Option<NaiveDateTime>>, Vec<RowError>), ProcessorError> {
    let values = table.get_col(column)?.as_str(column)?;
    let mut parsed = Vec::with_capacity(values.len());
    let mut errors = Vec::new();

    for (idx, raw) in values.iter().enumerate() {
        match pattern.parse_value(raw) {
            Ok(ts) => parsed.push(Some(ts)),
            Err(e) => {
                parsed.push(None);
                errors.push(RowError {
                    row: idx + 1,
                    column: column.to_string(),
                    value: raw.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok((parsed, errors))
}

/// Appends hour, day-of-week and month columns derived from `column`
///
/// Aborts with [`ProcessorError::Parse`] if any value fails to parse; the
/// error carries the number of failing rows and the first one. The source
/// column is kept.
pub fn derive_calendar_features(
    table: Table,
    column: &str,
    pattern: &TimestampPattern,
) -> Result<Table, ProcessorError> {
    let (parsed, errors) = parse_column(&table, column, pattern)?;

    if let Some(first) = errors.first() {
        for e in errors.iter().take(5) {
            debug!(row = e.row, value = %e.value, error = %e.error, "timestamp did not match pattern");
        }
        return Err(ProcessorError::Parse {
            failed: errors.len(),
            row: first.row,
            value: first.value.clone(),
            reason: first.error.clone(),
        });
    }

    let timestamps: Vec<NaiveDateTime> = parsed.into_iter().flatten().collect();
    let hours = timestamps.iter().map(|ts| Some(ts.hour() as i64)).collect();
    let days = timestamps.iter().map(|ts| Some(day_of_week(ts))).collect();
    let months = timestamps.iter().map(|ts| Some(ts.month() as i64)).collect();

    info!(rows = timestamps.len(), column, pattern = pattern.source(), "derived calendar features");

    table
        .with_column(HOUR_COLUMN, Column::Int64(hours))?
        .with_column(DAY_COLUMN, Column::Int64(days))?
        .with_column(MONTH_COLUMN, Column::Int64(months))
}
