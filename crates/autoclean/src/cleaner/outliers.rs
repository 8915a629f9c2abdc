//! Z-score outlier filtering.
//!
//! For each numeric column, z = (value - mean) / std with the population
//! standard deviation. A row whose |z| exceeds the threshold in any numeric
//! column is removed. All statistics are taken once, before any row is
//! dropped.

use super::{CleaningStage, StageOutput};
use crate::config::CleaningConfig;
use crate::pipeline::PipelineStage;
use crate::types::{ReportFragment, StageChange};
use crate::utils::{finite_values, numeric_columns};
use anyhow::Result;
use polars::prelude::*;
use tracing::{debug, info};

/// Removes rows holding a numeric outlier.
///
/// Zero-variance columns never flag a row, nor do null or non-finite cells.
/// With fewer than `min_numeric_columns` numeric columns the stage does
/// nothing.
pub struct OutlierFilter;

impl OutlierFilter {
    /// Mask of rows to keep under the given threshold.
    pub fn keep_mask(df: &DataFrame, numeric: &[PlSmallStr], threshold: f64) -> Result<Vec<bool>> {
        let mut keep = vec![true; df.height()];

        for name in numeric {
            let values = finite_values(df.column(name)?.as_materialized_series())?;

            let (Some(mean), Some(std)) = (values.mean(), values.std(0)) else {
                continue;
            };
            if std == 0.0 || !std.is_finite() {
                debug!("Column '{}' has zero variance; skipped", name);
                continue;
            }

            let mut flagged = 0;
            for (row, value) in values.into_iter().enumerate() {
                if let Some(v) = value
                    && ((v - mean) / std).abs() > threshold
                {
                    if keep[row] {
                        flagged += 1;
                    }
                    keep[row] = false;
                }
            }
            if flagged > 0 {
                debug!("Column '{}' flagged {} new outlier rows", name, flagged);
            }
        }

        Ok(keep)
    }
}

impl CleaningStage for OutlierFilter {
    fn stage(&self) -> PipelineStage {
        PipelineStage::OutlierFiltering
    }

    fn apply(&self, df: DataFrame, config: &CleaningConfig) -> Result<StageOutput> {
        let numeric = numeric_columns(&df);
        if numeric.len() < config.min_numeric_columns {
            let message = format!(
                "Outlier filter skipped: {} numeric columns (needs at least {})",
                numeric.len(),
                config.min_numeric_columns
            );
            debug!("{}", message);
            return Ok(StageOutput::new(
                df,
                ReportFragment::new(StageChange::OutliersRemoved(0)).with_warning(message),
            ));
        }

        let keep = Self::keep_mask(&df, &numeric, config.z_threshold)?;
        let removed = keep.iter().filter(|k| !**k).count();

        let df = if removed > 0 {
            let mask = BooleanChunked::from_slice("keep".into(), &keep);
            let filtered = df.filter(&mask)?;
            info!(
                "Removed {} outlier rows (|z| > {})",
                removed, config.z_threshold
            );
            filtered
        } else {
            debug!("No outliers found");
            df
        };

        Ok(StageOutput::new(
            df,
            ReportFragment::new(StageChange::OutliersRemoved(removed)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn removed(fragment: &ReportFragment) -> usize {
        match fragment.change {
            StageChange::OutliersRemoved(n) => n,
            ref other => panic!("Unexpected fragment: {:?}", other),
        }
    }

    /// Twenty values near 10 and one far away.
    fn spiky_frame() -> DataFrame {
        let mut a: Vec<f64> = (0..20).map(|i| 10.0 + (i % 3) as f64).collect();
        a.push(1000.0);
        let b: Vec<f64> = (0..21).map(|i| i as f64).collect();
        df![
            "a" => a,
            "b" => b,
        ]
        .unwrap()
    }

    #[test]
    fn test_removes_extreme_row() {
        let output = OutlierFilter
            .apply(spiky_frame(), &CleaningConfig::default())
            .unwrap();
        assert_eq!(output.data.height(), 20);
        assert_eq!(removed(&output.fragment), 1);

        let max = output
            .data
            .column("a")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .max()
            .unwrap();
        assert!(max < 1000.0);
    }

    #[test]
    fn test_five_values_cannot_exceed_threshold() {
        // With n = 5 the largest possible |z| is 2.0
        let df = df![
            "a" => [1.0, 2.0, 3.0, 4.0, 1000.0],
            "b" => [5.0, 4.0, 3.0, 2.0, 1.0],
        ]
        .unwrap();

        let output = OutlierFilter.apply(df, &CleaningConfig::default()).unwrap();
        assert_eq!(output.data.height(), 5);
        assert_eq!(removed(&output.fragment), 0);
    }

    #[test]
    fn test_lower_threshold_flags_more() {
        let df = df![
            "a" => [1.0, 2.0, 3.0, 4.0, 1000.0],
            "b" => [5.0, 4.0, 3.0, 2.0, 1.0],
        ]
        .unwrap();
        let config = CleaningConfig::builder().z_threshold(1.5).build().unwrap();

        let output = OutlierFilter.apply(df, &config).unwrap();
        assert_eq!(removed(&output.fragment), 1);
    }

    #[test]
    fn test_single_numeric_column_is_skipped() {
        let mut a: Vec<f64> = vec![10.0; 20];
        a.push(1000.0);
        let labels: Vec<String> = (0..21).map(|i| format!("r{}", i)).collect();
        let df = df![
            "a" => a,
            "label" => labels,
        ]
        .unwrap();

        let output = OutlierFilter.apply(df, &CleaningConfig::default()).unwrap();
        assert_eq!(output.data.height(), 21);
        assert_eq!(removed(&output.fragment), 0);
        assert_eq!(output.fragment.warnings.len(), 1);
    }

    #[test]
    fn test_zero_variance_column_never_flags() {
        let df = df![
            "flat" => [5.0; 10],
            "other" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        ]
        .unwrap();

        let output = OutlierFilter.apply(df, &CleaningConfig::default()).unwrap();
        assert_eq!(removed(&output.fragment), 0);
    }

    #[test]
    fn test_nan_cells_are_ignored() {
        let mut a: Vec<f64> = (0..20).map(|i| 10.0 + (i % 3) as f64).collect();
        a.push(f64::NAN);
        let b: Vec<f64> = (0..21).map(|i| i as f64).collect();
        let df = df!["a" => a, "b" => b].unwrap();

        let output = OutlierFilter.apply(df, &CleaningConfig::default()).unwrap();
        assert_eq!(removed(&output.fragment), 0);
    }

    #[test]
    fn test_no_columns_is_a_noop() {
        let output = OutlierFilter
            .apply(DataFrame::empty(), &CleaningConfig::default())
            .unwrap();
        assert_eq!(removed(&output.fragment), 0);
    }
}
