//! Constant-column pruning.

use super::{CleaningStage, StageOutput};
use crate::config::CleaningConfig;
use crate::pipeline::PipelineStage;
use crate::types::{ReportFragment, StageChange};
use anyhow::Result;
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Drops columns with at most one distinct value. Null counts as a value of
/// its own, so `[null, "a"]` has two.
pub struct ConstantPruner;

/// Distinct values in `series`, with null counted once if present.
pub(crate) fn distinct_count(series: &Series) -> PolarsResult<usize> {
    let non_null = series.drop_nulls();
    let values = if non_null.is_empty() {
        0
    } else {
        non_null.n_unique()?
    };
    Ok(values + usize::from(series.null_count() > 0))
}

impl CleaningStage for ConstantPruner {
    fn stage(&self) -> PipelineStage {
        PipelineStage::ConstantPruning
    }

    fn apply(&self, df: DataFrame, _config: &CleaningConfig) -> Result<StageOutput> {
        let mut constant = Vec::new();
        for col in df.get_columns() {
            let distinct = distinct_count(col.as_materialized_series())?;
            if distinct <= 1 {
                debug!("Column '{}' has {} distinct values", col.name(), distinct);
                constant.push(col.name().clone());
            }
        }

        if constant.is_empty() {
            debug!("No constant columns found");
            return Ok(StageOutput::new(
                df,
                ReportFragment::new(StageChange::ConstantColumnsRemoved(Vec::new())),
            ));
        }

        let removed: Vec<String> = constant.iter().map(|c| c.to_string()).collect();
        let all_constant = constant.len() == df.width();
        let df = df.drop_many(constant);
        info!("Removed {} constant columns: {:?}", removed.len(), removed);

        let mut fragment = ReportFragment::new(StageChange::ConstantColumnsRemoved(removed));
        if all_constant {
            let message = "Every column was constant; the dataset has no columns left";
            warn!("{}", message);
            fragment = fragment.with_warning(message);
        }

        Ok(StageOutput::new(df, fragment))
    }
}
