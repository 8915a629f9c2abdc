//! Progress reporting and cooperative cancellation for cleaning runs.
//!
//! The pipeline emits a [`ProgressUpdate`] when each stage starts and
//! finishes, and checks its [`CancellationToken`] between stages.
//!
//! # Example
//!
//! ```rust,ignore
//! use autoclean::{CancellationToken, Pipeline};
//!
//! let token = CancellationToken::new();
//! let stopper = token.clone();
//! std::thread::spawn(move || stopper.cancel());
//!
//! let result = Pipeline::builder()
//!     .cancellation_token(token)
//!     .on_progress(|update| println!("[{:?}] {}", update.stage, update.message))
//!     .build()?
//!     .process(df);
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stages of a cleaning run, in execution order, plus terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Validating the input dataset
    Initializing,
    NullHandling,
    DuplicateRemoval,
    ConstantPruning,
    ColumnNormalization,
    OutlierFiltering,
    TypeCorrection,
    CategoryStandardization,
    /// Computing the final shape and correlations
    Summarizing,
    Complete,
    Cancelled,
    Failed,
}

impl PipelineStage {
    /// The working stages in the order the pipeline runs them.
    pub const ORDER: [PipelineStage; 9] = [
        Self::Initializing,
        Self::NullHandling,
        Self::DuplicateRemoval,
        Self::ConstantPruning,
        Self::ColumnNormalization,
        Self::OutlierFiltering,
        Self::TypeCorrection,
        Self::CategoryStandardization,
        Self::Summarizing,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::NullHandling => "Handling Null Values",
            Self::DuplicateRemoval => "Removing Duplicates",
            Self::ConstantPruning => "Removing Constant Columns",
            Self::ColumnNormalization => "Cleaning Column Names",
            Self::OutlierFiltering => "Removing Outliers",
            Self::TypeCorrection => "Correcting Types",
            Self::CategoryStandardization => "Standardizing Categories",
            Self::Summarizing => "Summarizing",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run attributed to this stage. The working stages
    /// sum to 1.0; terminal states weigh nothing.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.05,
            Self::NullHandling => 0.15,
            Self::DuplicateRemoval => 0.15,
            Self::ConstantPruning => 0.10,
            Self::ColumnNormalization => 0.05,
            Self::OutlierFiltering => 0.15,
            Self::TypeCorrection => 0.15,
            Self::CategoryStandardization => 0.10,
            Self::Summarizing => 0.10,
            Self::Complete | Self::Cancelled | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing => 0.0,
            Self::NullHandling => 0.05,
            Self::DuplicateRemoval => 0.20,
            Self::ConstantPruning => 0.35,
            Self::ColumnNormalization => 0.45,
            Self::OutlierFiltering => 0.50,
            Self::TypeCorrection => 0.65,
            Self::CategoryStandardization => 0.80,
            Self::Summarizing => 0.90,
            Self::Complete => 1.0,
            Self::Cancelled | Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,
}

impl ProgressUpdate {
    /// Creates a progress update positioned within `stage`.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            stage: PipelineStage::Cancelled,
            progress: 0.0,
            stage_progress: 0.0,
            message: "Pipeline cancelled".to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receiver of progress updates.
///
/// Implementations must be `Send + Sync` so a run can execute on a worker
/// thread while updates are consumed elsewhere. `report` is called on the
/// pipeline's thread and should return quickly.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Shared flag for cancelling a running pipeline.
///
/// Clones share state, so the caller keeps one clone and hands another to
/// the pipeline. The pipeline checks the flag between stages and returns
/// [`CleaningError::Cancelled`](crate::error::CleaningError::Cancelled)
/// once it is set.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(CancellationToken: Send, Sync);
static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for another run.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
