//! Parsers used by the type corrector.
//!
//! Every parser is all-or-nothing: it returns `Some(series)` only when every
//! non-null value parses, and `None` otherwise. Nothing here raises.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// A parse attempt the type corrector can make on a text column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseAttempt {
    /// `i64` if every value is an integer, else finite `f64`.
    Numeric,
    /// Timestamps, using the first format in [`DATETIME_FORMATS`] that fits
    /// every value.
    Datetime,
}

/// Order in which parse attempts are made. Numeric comes first, so a column
/// of bare numbers is never read as dates.
pub const PARSE_PRIORITY: [ParseAttempt; 2] = [ParseAttempt::Numeric, ParseAttempt::Datetime];

impl ParseAttempt {
    /// Run this attempt over a column's values.
    pub fn try_parse(&self, name: PlSmallStr, values: &[Option<&str>]) -> Option<Series> {
        if values.iter().all(|v| v.is_none()) {
            return None;
        }
        match self {
            Self::Numeric => parse_integer(name.clone(), values).or_else(|| parse_float(name, values)),
            Self::Datetime => parse_datetime(name, values),
        }
    }
}

/// A chrono format and whether it carries a time of day.
#[derive(Debug, Clone, Copy)]
pub struct DateFormat {
    pub pattern: &'static str,
    pub with_time: bool,
}

const fn date(pattern: &'static str) -> DateFormat {
    DateFormat {
        pattern,
        with_time: false,
    }
}

const fn date_time(pattern: &'static str) -> DateFormat {
    DateFormat {
        pattern,
        with_time: true,
    }
}

/// Accepted date formats, tried in order. Month-first slashes come before
/// day-first ones.
pub const DATETIME_FORMATS: [DateFormat; 15] = [
    date_time("%Y-%m-%d %H:%M:%S"),
    date_time("%Y-%m-%dT%H:%M:%S"),
    date_time("%Y-%m-%d %H:%M:%S%.f"),
    date_time("%Y-%m-%dT%H:%M:%S%.f"),
    date_time("%Y-%m-%d %H:%M"),
    date("%Y-%m-%d"),
    date("%Y/%m/%d"),
    date_time("%m/%d/%Y %H:%M"),
    date_time("%d/%m/%Y %H:%M"),
    date("%m/%d/%Y"),
    date("%d/%m/%Y"),
    date("%d-%m-%Y"),
    date("%d.%m.%Y"),
    date("%d %b %Y"),
    date("%b %d, %Y"),
];

/// Parse into `Int64` if every value is a whole number.
pub(crate) fn parse_integer(name: PlSmallStr, values: &[Option<&str>]) -> Option<Series> {
    let parsed = values
        .iter()
        .map(|v| match v {
            Some(s) => s.trim().parse::<i64>().ok().map(Some),
            None => Some(None),
        })
        .collect::<Option<Vec<Option<i64>>>>()?;
    Some(Series::new(name, parsed))
}

/// Parse into `Float64` if every value is a finite number.
pub(crate) fn parse_float(name: PlSmallStr, values: &[Option<&str>]) -> Option<Series> {
    let parsed = values
        .iter()
        .map(|v| match v {
            Some(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Some),
            None => Some(None),
        })
        .collect::<Option<Vec<Option<f64>>>>()?;
    Some(Series::new(name, parsed))
}

/// Parse into millisecond `Datetime` with the first format that fits all values.
pub(crate) fn parse_datetime(name: PlSmallStr, values: &[Option<&str>]) -> Option<Series> {
    DATETIME_FORMATS.iter().find_map(|format| {
        let millis = values
            .iter()
            .map(|v| match v {
                Some(s) => parse_timestamp(s.trim(), format).map(Some),
                None => Some(None),
            })
            .collect::<Option<Vec<Option<i64>>>>()?;
        Series::new(name.clone(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .ok()
    })
}

/// Milliseconds since the epoch for `value` in `format`.
pub(crate) fn parse_timestamp(value: &str, format: &DateFormat) -> Option<i64> {
    let datetime = if format.with_time {
        NaiveDateTime::parse_from_str(value, format.pattern).ok()?
    } else {
        NaiveDate::parse_from_str(value, format.pattern)
            .ok()?
            .and_hms_opt(0, 0, 0)?
    };
    Some(datetime.and_utc().timestamp_millis())
}

/// Render a float column as text when any value is non-finite.
///
/// Non-finite floats render as `NaN`, `inf` or `-inf`, the only float
/// renderings that contain letters. Returns `None` when every value is
/// finite.
pub(crate) fn float_to_text(series: &Series) -> Option<Series> {
    let as_float = series.cast(&DataType::Float64).ok()?;
    let values: Vec<Option<f64>> = as_float.f64().ok()?.into_iter().collect();

    let rendered: Vec<Option<String>> = values
        .iter()
        .map(|v| v.map(|f| format!("{}", f)))
        .collect();
    let has_letters = rendered
        .iter()
        .flatten()
        .any(|s| s.chars().any(|c| c.is_alphabetic()));

    has_letters.then(|| Series::new(series.name().clone(), rendered))
}
