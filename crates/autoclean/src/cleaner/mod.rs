//! Cleaning stages.
//!
//! Each stage detects one kind of defect and repairs it:
//! - Filling missing values ([`NullHandler`])
//! - Removing duplicate rows ([`DuplicateRemover`])
//! - Dropping columns with a single distinct value ([`ConstantPruner`])
//! - Normalizing column names ([`ColumnNormalizer`])
//! - Removing z-score outlier rows ([`OutlierFilter`])
//! - Re-typing mistyped columns ([`TypeCorrector`])
//! - Standardizing small-cardinality text ([`CategoryStandardizer`])
//!
//! Stages take ownership of the frame and hand it back together with a
//! [`ReportFragment`] describing what they did.

mod categories;
mod constants;
mod converters;
mod duplicates;
mod names;
mod nulls;
mod outliers;
mod type_corrector;

pub use categories::CategoryStandardizer;
pub use constants::ConstantPruner;
pub use converters::{DATETIME_FORMATS, DateFormat, PARSE_PRIORITY, ParseAttempt};
pub use duplicates::DuplicateRemover;
pub use names::{ColumnNormalizer, normalize_name};
pub use nulls::NullHandler;
pub use outliers::OutlierFilter;
pub use type_corrector::TypeCorrector;

use crate::config::CleaningConfig;
use crate::pipeline::PipelineStage;
use crate::types::ReportFragment;
use anyhow::Result;
use polars::prelude::*;

/// Frame and report fragment produced by one stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub data: DataFrame,
    pub fragment: ReportFragment,
}

impl StageOutput {
    pub fn new(data: DataFrame, fragment: ReportFragment) -> Self {
        Self { data, fragment }
    }
}

/// A single detection-and-repair step.
///
/// Stages are stateless; everything they need comes from the frame and the
/// configuration.
pub trait CleaningStage: Send + Sync {
    /// Which pipeline stage this is, for progress reporting.
    fn stage(&self) -> PipelineStage;

    /// Apply the stage to `df`.
    fn apply(&self, df: DataFrame, config: &CleaningConfig) -> Result<StageOutput>;
}
