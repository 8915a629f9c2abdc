//! Pearson correlation over the numeric columns of a cleaned dataset.

use crate::utils::{finite_values, numeric_columns};
use polars::prelude::*;
use polars_ops::chunked_array::cov::pearson_corr;
use serde::{Deserialize, Serialize};

/// Minimum numeric columns before a correlation matrix is worth computing.
pub const MIN_CORRELATION_COLUMNS: usize = 2;

/// Square matrix of pairwise Pearson coefficients.
///
/// `values[i][j]` is the correlation of `columns[i]` and `columns[j]`, or
/// `None` when either column has zero variance over their shared rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Coefficient for a pair of columns by name.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Correlate every pair of numeric columns.
///
/// Returns `None` with fewer than [`MIN_CORRELATION_COLUMNS`] numeric columns.
/// Each pair uses the rows where both cells are finite.
pub fn correlation_matrix(df: &DataFrame) -> PolarsResult<Option<CorrelationMatrix>> {
    let numeric = numeric_columns(df);
    if numeric.len() < MIN_CORRELATION_COLUMNS {
        return Ok(None);
    }

    let mut data = Vec::with_capacity(numeric.len());
    for name in &numeric {
        data.push(finite_values(df.column(name)?.as_materialized_series())?);
    }

    let n = numeric.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pair_correlation(&data[i], &data[j])?;
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(Some(CorrelationMatrix {
        columns: numeric.iter().map(|c| c.to_string()).collect(),
        values,
    }))
}

/// Pearson coefficient over the rows where both columns hold a value.
///
/// `None` when fewer than two such rows exist or either side is constant.
fn pair_correlation(x: &Float64Chunked, y: &Float64Chunked) -> PolarsResult<Option<f64>> {
    let shared = x.is_not_null() & y.is_not_null();
    let x = x.filter(&shared)?;
    let y = y.filter(&shared)?;
    if x.len() < 2 {
        return Ok(None);
    }

    Ok(pearson_corr(&x, &y)
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(-1.0, 1.0)))
}
