//! Shared utilities for the cleaning stages.
//!
//! Helpers for classifying columns and pulling typed values out of a `Series`.

use crate::types::ColumnType;
use polars::prelude::*;
use std::collections::HashSet;

// =============================================================================
// Column Classification
// =============================================================================

/// Logical type of a series.
#[inline]
pub fn column_type(series: &Series) -> ColumnType {
    ColumnType::of(series.dtype())
}

/// Names of all columns of the given logical types, in frame order.
pub fn columns_of_type(df: &DataFrame, types: &[ColumnType]) -> Vec<PlSmallStr> {
    df.get_columns()
        .iter()
        .filter(|col| types.contains(&ColumnType::of(col.dtype())))
        .map(|col| col.name().clone())
        .collect()
}

/// Names of the integer and float columns, in frame order.
pub fn numeric_columns(df: &DataFrame) -> Vec<PlSmallStr> {
    columns_of_type(df, &[ColumnType::Integer, ColumnType::Float])
}

// =============================================================================
// Value Extraction
// =============================================================================

/// Render every cell as text, keeping nulls.
///
/// Floats keep their textual form, so non-finite values come out as `NaN`,
/// `inf` or `-inf`.
pub fn text_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let as_text = if series.dtype() == &DataType::String {
        series.clone()
    } else {
        series.cast(&DataType::String)?
    };
    Ok(as_text
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Numeric cells as `Float64`, with non-finite values turned into nulls.
///
/// The result has the same length as the input, so row positions line up.
pub fn finite_values(series: &Series) -> PolarsResult<Float64Chunked> {
    let as_float = series.cast(&DataType::Float64)?;
    let finite: Float64Chunked = as_float
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Ok(finite.with_name(series.name().clone()))
}

/// Distinct values in order of first appearance. Nulls are listed as `null`.
pub fn distinct_in_order<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen = HashSet::new();
    let mut distinct = Vec::new();
    for value in values {
        let value = value.unwrap_or("null");
        if seen.insert(value) {
            distinct.push(value.to_string());
        }
    }
    distinct
}

// =============================================================================
// Tests
// =============================================================================
