//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder that run the
//! cleaning stages in their fixed order and assemble the report.

use crate::cleaner::{
    CategoryStandardizer, CleaningStage, ColumnNormalizer, ConstantPruner, DuplicateRemover,
    NullHandler, OutlierFilter, StageOutput, TypeCorrector,
};
use crate::config::{CleaningConfig, ConfigValidationError};
use crate::error::{CleaningError, Result};
use crate::pipeline::progress::{
    CancellationToken, ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::stats::{MIN_CORRELATION_COLUMNS, correlation_matrix};
use crate::types::{CleaningReport, CleaningSummary, PipelineResult, StageChange};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use autoclean::{CancellationToken, CleaningConfig, Pipeline};
///
/// let token = CancellationToken::new();
///
/// let result = Pipeline::builder()
///     .config(CleaningConfig::builder().z_threshold(2.5).build()?)
///     .cancellation_token(token.clone())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(dataframe)?;
///
/// println!("{} duplicates removed", result.report.duplicates_removed);
/// ```
pub struct Pipeline {
    config: CleaningConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
    stages: Vec<Box<dyn CleaningStage>>,
}

// Pipelines may be handed to a worker thread by an embedding application.
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Stages that will run, in order.
    pub fn stages(&self) -> Vec<PipelineStage> {
        self.stages.iter().map(|s| s.stage()).collect()
    }

    /// Clean a DataFrame.
    ///
    /// # Errors
    ///
    /// - [`CleaningError::EmptyDataset`] if the input has no rows or no
    ///   columns, or if a stage leaves no rows behind.
    /// - [`CleaningError::Cancelled`] if the token was cancelled before a
    ///   stage started.
    /// - [`CleaningError::Internal`] if a stage fails unexpectedly.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Cleaning completed successfully"));
                Ok(result)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled());
                } else {
                    self.report_progress(ProgressUpdate::failed(e.to_string()));
                }
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Check if cancellation has been requested.
    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(CleaningError::Cancelled);
        }
        Ok(())
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, df: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();

        info!("Starting cleaning pipeline...");
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Initializing,
            0.0,
            "Validating dataset...",
        ));

        if df.width() == 0 {
            return Err(CleaningError::EmptyDataset("input has no columns".to_string()));
        }
        if df.height() == 0 {
            return Err(CleaningError::EmptyDataset("input has no rows".to_string()));
        }

        let mut summary = CleaningSummary {
            rows_before: df.height(),
            columns_before: df.width(),
            ..Default::default()
        };
        let mut report = CleaningReport::new();

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Initializing,
            1.0,
            format!("Dataset has {} rows and {} columns", df.height(), df.width()),
        ));

        let mut df = df;
        let mut rows = summary.rows_before;

        for stage in &self.stages {
            self.check_cancelled()?;

            let kind = stage.stage();
            self.report_progress(ProgressUpdate::new(
                kind,
                0.0,
                format!("{}...", kind.display_name()),
            ));
            debug!("Running stage: {}", kind.display_name());

            let StageOutput { data, fragment } = stage.apply(df, &self.config).map_err(|e| {
                CleaningError::Internal(format!("{:#}", e))
                    .with_context(format!("{} failed", kind.display_name()))
            })?;

            rows = surviving_rows(&data, rows);
            if rows == 0 {
                return Err(CleaningError::EmptyDataset(format!(
                    "no rows left after {}",
                    kind.display_name().to_lowercase()
                )));
            }

            if let StageChange::ColumnsRenamed(renames) = &fragment.change {
                summary.renamed_columns.extend(renames.iter().cloned());
            }
            report.apply(fragment);
            df = data;

            self.report_progress(ProgressUpdate::new(
                kind,
                1.0,
                format!("{} complete", kind.display_name()),
            ));
        }

        self.check_cancelled()?;

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Summarizing,
            0.0,
            "Summarizing...",
        ));

        summary.correlation = correlation_matrix(&df).map_err(|e| {
            CleaningError::Polars(e).with_context("Failed to compute correlation matrix")
        })?;
        if summary.correlation.is_none() {
            let note = format!(
                "Correlation matrix skipped: fewer than {} numeric columns",
                MIN_CORRELATION_COLUMNS
            );
            info!("{}", note);
            report.add_warning(note);
        }

        summary.rows_after = rows;
        summary.columns_after = df.width();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Summarizing,
            1.0,
            format!(
                "{} rows x {} columns remain",
                summary.rows_after, summary.columns_after
            ),
        ));

        info!(
            "Cleaning finished in {}ms: {} -> {} rows, {} -> {} columns",
            summary.duration_ms,
            summary.rows_before,
            summary.rows_after,
            summary.columns_before,
            summary.columns_after
        );

        Ok(PipelineResult {
            data: df,
            report,
            summary,
        })
    }
}

/// Row count after a stage.
///
/// A frame with no columns carries no rows of its own, so the previous
/// count stands.
fn surviving_rows(df: &DataFrame, previous: usize) -> usize {
    if df.width() == 0 {
        previous
    } else {
        df.height()
    }
}

/// Stages enabled by `config`, in execution order.
fn stages_for(config: &CleaningConfig) -> Vec<Box<dyn CleaningStage>> {
    let mut stages: Vec<Box<dyn CleaningStage>> = vec![Box::new(NullHandler)];
    if config.remove_duplicates {
        stages.push(Box::new(DuplicateRemover));
    }
    stages.push(Box::new(ConstantPruner));
    stages.push(Box::new(ColumnNormalizer));
    if config.remove_outliers {
        stages.push(Box::new(OutlierFilter));
    }
    if config.enable_type_correction {
        stages.push(Box::new(TypeCorrector));
    }
    if config.standardize_categories {
        stages.push(Box::new(CategoryStandardizer));
    }
    stages
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<CleaningConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the cleaning configuration.
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// Convenience wrapper around [`progress_reporter`](Self::progress_reporter).
    ///
    /// ```rust,ignore
    /// let pipeline = Pipeline::builder()
    ///     .on_progress(|update| {
    ///         println!("[{:.0}%] {:?}: {}", update.progress * 100.0, update.stage, update.message);
    ///     })
    ///     .build()?;
    /// ```
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set a cancellation token for stopping the pipeline.
    ///
    /// Clone the token and call [`CancellationToken::cancel()`] from any
    /// thread. The pipeline checks it before each stage and returns
    /// [`CleaningError::Cancelled`] once it is set.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let stages = stages_for(&config);
        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
            stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_frame() -> DataFrame {
        df![
            "Customer ID" => [1, 2, 3, 3, 4, 5],
            "Gender" => [Some("M"), Some("F"), None, None, Some("f"), Some("male")],
            "Age" => [Some(30.0), None, Some(40.0), Some(40.0), Some(35.0), Some(28.0)],
            "Country" => ["FR", "FR", "FR", "FR", "FR", "FR"],
        ]
        .unwrap()
    }

    // ========================================================================
    // Builder
    // ========================================================================

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.config.enable_type_correction);
        assert_eq!(
            pipeline.stages(),
            vec![
                PipelineStage::NullHandling,
                PipelineStage::DuplicateRemoval,
                PipelineStage::ConstantPruning,
                PipelineStage::ColumnNormalization,
                PipelineStage::OutlierFiltering,
                PipelineStage::TypeCorrection,
                PipelineStage::CategoryStandardization,
            ]
        );
    }

    #[test]
    fn test_disabled_stages_are_skipped() {
        let config = CleaningConfig::builder()
            .remove_duplicates(false)
            .remove_outliers(false)
            .enable_type_correction(false)
            .standardize_categories(false)
            .build()
            .unwrap();

        let pipeline = Pipeline::builder().config(config).build().unwrap();
        assert_eq!(
            pipeline.stages(),
            vec![
                PipelineStage::NullHandling,
                PipelineStage::ConstantPruning,
                PipelineStage::ColumnNormalization,
            ]
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CleaningConfig {
            z_threshold: -1.0,
            ..Default::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    // ========================================================================
    // Processing
    // ========================================================================

    #[test]
    fn test_process_sample_frame() {
        let result = Pipeline::builder()
            .build()
            .unwrap()
            .process(sample_frame())
            .unwrap();

        let names: Vec<String> = result
            .data
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["customer_id", "gender", "age"]);

        assert_eq!(result.report.duplicates_removed, 1);
        assert_eq!(result.report.constant_columns_removed, vec!["Country"]);
        assert_eq!(result.report.null_fill_count, 3);
        assert_eq!(result.summary.rows_before, 6);
        assert_eq!(result.summary.rows_after, 5);
        assert_eq!(result.summary.columns_after, 3);
        assert!(result.summary.correlation.is_some());
        assert_eq!(result.data.height(), 5);

        for column in result.data.get_columns() {
            assert_eq!(column.null_count(), 0, "nulls left in {}", column.name());
        }
    }

    #[test]
    fn test_renames_land_in_summary() {
        let result = Pipeline::builder()
            .build()
            .unwrap()
            .process(sample_frame())
            .unwrap();

        let renamed: Vec<(&str, &str)> = result
            .summary
            .renamed_columns
            .iter()
            .map(|r| (r.from.as_str(), r.to.as_str()))
            .collect();
        assert!(renamed.contains(&("Customer ID", "customer_id")));
        assert!(renamed.contains(&("Gender", "gender")));
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let pipeline = Pipeline::builder().build().unwrap();

        let err = pipeline.process(DataFrame::empty()).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_DATASET");

        let no_rows = df!["a" => Vec::<i64>::new()].unwrap();
        let err = pipeline.process(no_rows).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_DATASET");
    }

    #[test]
    fn test_all_constant_frame_keeps_row_count() {
        let df = df![
            "a" => ["x", "x", "x"],
            "b" => [1, 1, 1],
        ]
        .unwrap();
        let config = CleaningConfig::builder()
            .remove_duplicates(false)
            .build()
            .unwrap();

        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process(df)
            .unwrap();
        assert_eq!(result.data.width(), 0);
        assert_eq!(result.summary.rows_after, 3);
        assert!(result.summary.correlation.is_none());
        assert!(!result.report.warnings.is_empty());
    }

    #[test]
    fn test_heavy_row_loss_adds_no_warning() {
        let df = df![
            "a" => [1, 1, 1, 1, 2, 3],
            "c" => [5.0, 5.0, 5.0, 5.0, 7.0, 4.0],
        ]
        .unwrap();

        let result = Pipeline::builder().build().unwrap().process(df).unwrap();
        assert_eq!(result.report.duplicates_removed, 3);
        assert_eq!(result.summary.rows_after, 3);
        assert!(result.summary.rows_removed_percentage() > 30.0);
        assert!(result.report.warnings.is_empty());
    }

    #[test]
    fn test_surviving_rows() {
        let df = df!["a" => [1, 2]].unwrap();
        assert_eq!(surviving_rows(&df, 10), 2);
        assert_eq!(surviving_rows(&DataFrame::empty(), 10), 10);
    }

    // ========================================================================
    // Progress & cancellation
    // ========================================================================

    #[test]
    fn test_progress_is_reported_per_stage() {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();

        Pipeline::builder()
            .on_progress(move |update| sink.lock().unwrap().push(update))
            .build()
            .unwrap()
            .process(sample_frame())
            .unwrap();

        let updates = updates.lock().unwrap();
        let last = updates.last().unwrap();
        assert_eq!(last.stage, PipelineStage::Complete);
        assert_eq!(last.progress, 1.0);

        let progress: Vec<f32> = updates.iter().map(|u| u.progress).collect();
        assert!(progress.windows(2).all(|w| w[0] <= w[1] + 1e-6));
        assert!(updates.iter().any(|u| u.stage == PipelineStage::OutlierFiltering));
    }

    #[test]
    fn test_pre_cancelled_token_stops_run() {
        let token = CancellationToken::new();
        token.cancel();

        let last_stage = Arc::new(Mutex::new(None));
        let sink = last_stage.clone();

        let err = Pipeline::builder()
            .cancellation_token(token)
            .on_progress(move |update| *sink.lock().unwrap() = Some(update.stage))
            .build()
            .unwrap()
            .process(sample_frame())
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(*last_stage.lock().unwrap(), Some(PipelineStage::Cancelled));
    }

    #[test]
    fn test_cancel_between_stages() {
        let token = CancellationToken::new();
        let stopper = token.clone();
        let stages_started = Arc::new(AtomicUsize::new(0));
        let counter = stages_started.clone();

        let err = Pipeline::builder()
            .cancellation_token(token)
            .on_progress(move |update| {
                if update.stage == PipelineStage::DuplicateRemoval && update.stage_progress == 1.0 {
                    stopper.cancel();
                }
                let working = !matches!(
                    update.stage,
                    PipelineStage::Initializing | PipelineStage::Cancelled
                );
                if working && update.stage_progress == 0.0 {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap()
            .process(sample_frame())
            .unwrap_err();

        assert!(matches!(err, CleaningError::Cancelled));
        // null handling and duplicate removal started; nothing after
        assert_eq!(stages_started.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_check_cancelled() {
        let token = CancellationToken::new();
        let pipeline = Pipeline::builder()
            .cancellation_token(token.clone())
            .build()
            .unwrap();

        assert!(pipeline.check_cancelled().is_ok());
        token.cancel();
        assert!(matches!(
            pipeline.check_cancelled().unwrap_err(),
            CleaningError::Cancelled
        ));
    }
}
