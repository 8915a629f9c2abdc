//! Missing-value filling.
//!
//! Text columns get the configured placeholder, numeric columns their
//! median, boolean columns their majority value and temporal columns their
//! median timestamp.

use super::{CleaningStage, StageOutput};
use crate::config::CleaningConfig;
use crate::pipeline::PipelineStage;
use crate::types::{ColumnType, ReportFragment, StageChange};
use crate::utils::{column_type, finite_values, text_values};
use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Fills every null cell it has a rule for.
///
/// A non-text column with no usable values has no median and is left as is;
/// so are columns of unsupported dtypes. Both cases produce a warning.
pub struct NullHandler;

impl CleaningStage for NullHandler {
    fn stage(&self) -> PipelineStage {
        PipelineStage::NullHandling
    }

    fn apply(&self, mut df: DataFrame, config: &CleaningConfig) -> Result<StageOutput> {
        let mut cells = 0;
        let mut columns = Vec::new();
        let mut warnings = Vec::new();

        let names: Vec<PlSmallStr> = df.get_columns().iter().map(|c| c.name().clone()).collect();

        for name in names {
            let series = df.column(&name)?.as_materialized_series().clone();
            let nulls = series.null_count();
            if nulls == 0 {
                continue;
            }

            let kind = column_type(&series);
            let filled = match kind {
                ColumnType::Text => Some(fill_text(&series, &config.text_fill_value)?),
                ColumnType::Integer | ColumnType::Float => fill_numeric(&series)?,
                ColumnType::Boolean => fill_boolean(&series)?,
                ColumnType::Datetime => fill_temporal(&series)?,
                ColumnType::Other => None,
            };

            match filled {
                Some(filled) => {
                    df.replace(&name, filled)
                        .with_context(|| format!("Failed to replace column '{}'", name))?;
                    debug!("Filled {} nulls in '{}' ({})", nulls, name, kind);
                    cells += nulls;
                    columns.push(name.to_string());
                }
                None => {
                    let message = if kind == ColumnType::Other {
                        format!(
                            "Column '{}' has unsupported type {}; {} nulls left unfilled",
                            name,
                            series.dtype(),
                            nulls
                        )
                    } else {
                        format!(
                            "Column '{}' has no values to derive a fill from; {} nulls left unfilled",
                            name, nulls
                        )
                    };
                    warn!("{}", message);
                    warnings.push(message);
                }
            }
        }

        if cells > 0 {
            info!("Filled {} null cells across {} columns", cells, columns.len());
        } else {
            debug!("No null values to fill");
        }

        Ok(StageOutput::new(
            df,
            ReportFragment::new(StageChange::NullsFilled { cells, columns }).with_warnings(warnings),
        ))
    }
}

/// Replace nulls in a text column with `placeholder`.
fn fill_text(series: &Series, placeholder: &str) -> Result<Series> {
    let filled: Vec<Option<String>> = text_values(series)?
        .into_iter()
        .map(|v| Some(v.unwrap_or_else(|| placeholder.to_string())))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Replace nulls with the median of the finite values.
///
/// Integer columns stay integer when the median is integral and become
/// `Float64` otherwise. Returns `None` when there is nothing to take a median of.
fn fill_numeric(series: &Series) -> Result<Option<Series>> {
    let as_float = series.cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = as_float.f64()?.into_iter().collect();

    let Some(fill) = finite_values(series)?.median() else {
        return Ok(None);
    };

    let is_integer = column_type(series) == ColumnType::Integer;
    if is_integer && fill.fract() == 0.0 {
        let as_int = series.cast(&DataType::Int64)?;
        let filled: Vec<Option<i64>> = as_int
            .i64()?
            .into_iter()
            .map(|v| Some(v.unwrap_or(fill as i64)))
            .collect();
        let filled = Series::new(series.name().clone(), filled).cast(series.dtype())?;
        return Ok(Some(filled));
    }

    let filled: Vec<Option<f64>> = values.into_iter().map(|v| Some(v.unwrap_or(fill))).collect();
    let filled = Series::new(series.name().clone(), filled);
    if is_integer {
        Ok(Some(filled))
    } else {
        Ok(Some(filled.cast(series.dtype())?))
    }
}

/// Replace nulls with the majority value; ties go to `true`.
fn fill_boolean(series: &Series) -> Result<Option<Series>> {
    let values: Vec<Option<bool>> = series.bool()?.into_iter().collect();
    let present = values.iter().flatten().count();
    if present == 0 {
        return Ok(None);
    }

    let trues = values.iter().flatten().filter(|v| **v).count();
    let fill = trues * 2 >= present;

    let filled: Vec<Option<bool>> = values.into_iter().map(|v| Some(v.unwrap_or(fill))).collect();
    Ok(Some(Series::new(series.name().clone(), filled)))
}

/// Replace nulls with the median timestamp, computed on the physical values.
fn fill_temporal(series: &Series) -> Result<Option<Series>> {
    let physical = series.cast(&DataType::Int64)?;
    let values: Vec<Option<i64>> = physical.i64()?.into_iter().collect();

    let Some(fill) = physical.median() else {
        return Ok(None);
    };
    let fill = fill.round() as i64;

    let filled: Vec<Option<i64>> = values.into_iter().map(|v| Some(v.unwrap_or(fill))).collect();
    let filled = Series::new(series.name().clone(), filled);
    let filled = match series.dtype() {
        DataType::Date => filled.cast(&DataType::Int32)?.cast(&DataType::Date)?,
        dtype => filled.cast(dtype)?,
    };
    Ok(Some(filled))
}
