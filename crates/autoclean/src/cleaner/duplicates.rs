//! Exact-duplicate row removal.

use super::{CleaningStage, StageOutput};
use crate::config::CleaningConfig;
use crate::pipeline::PipelineStage;
use crate::types::{ReportFragment, StageChange};
use anyhow::Result;
use polars::prelude::*;
use tracing::{debug, info};

/// Drops every row identical (across all columns) to an earlier row.
///
/// The first occurrence is kept and surviving rows keep their relative order.
pub struct DuplicateRemover;

impl CleaningStage for DuplicateRemover {
    fn stage(&self) -> PipelineStage {
        PipelineStage::DuplicateRemoval
    }

    fn apply(&self, df: DataFrame, _config: &CleaningConfig) -> Result<StageOutput> {
        if df.width() == 0 {
            return Ok(StageOutput::new(
                df,
                ReportFragment::new(StageChange::DuplicatesRemoved(0)),
            ));
        }

        let deduped = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        let removed = df.height() - deduped.height();

        let df = if removed > 0 {
            info!("Removed {} duplicate rows", removed);
            deduped
        } else {
            debug!("No duplicate rows found");
            df
        };

        Ok(StageOutput::new(
            df,
            ReportFragment::new(StageChange::DuplicatesRemoved(removed)),
        ))
    }
}
