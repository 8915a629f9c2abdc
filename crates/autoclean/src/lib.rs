//! Automatic Tabular Data Cleaning
//!
//! A single-pass cleaning library for CSV-shaped datasets, built with Rust
//! and Polars.
//!
//! # Overview
//!
//! A [`Pipeline`] runs a fixed sequence of stages over a `DataFrame`:
//!
//! 1. **Null handling**: fills every null by column type (median, majority
//!    or a text placeholder)
//! 2. **Duplicate removal**: keeps the first of each group of identical rows
//! 3. **Constant pruning**: drops columns with at most one distinct value
//! 4. **Column normalization**: lowercase `snake_case` names, kept unique
//! 5. **Outlier filtering**: drops rows with a z-score above the threshold in
//!    any numeric column
//! 6. **Type correction**: parses text columns holding numbers or dates, and
//!    turns float columns holding `NaN` back into text
//! 7. **Category standardization**: trims and lowercases small-cardinality
//!    text columns
//!
//! Every stage contributes to a [`CleaningReport`]; the run also produces a
//! [`CleaningSummary`] with the final shape and a correlation matrix.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use autoclean::{CleaningConfig, Pipeline, TextEncoding, load_csv};
//!
//! let df = load_csv("data.csv", TextEncoding::Utf8)?;
//!
//! let config = CleaningConfig::builder()
//!     .z_threshold(2.5)
//!     .cardinality_cutoff(20)
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//!
//! println!("{} duplicates removed", result.report.duplicates_removed);
//! println!("{} rows remain", result.summary.rows_after);
//! ```
//!
//! # Cancellation
//!
//! ```rust,ignore
//! use autoclean::{CancellationToken, CleaningError, Pipeline};
//!
//! let token = CancellationToken::new();
//! let token_for_cancel = token.clone();
//! std::thread::spawn(move || token_for_cancel.cancel());
//!
//! match Pipeline::builder().cancellation_token(token).build()?.process(df) {
//!     Ok(result) => println!("Cleaned {} rows", result.summary.rows_after),
//!     Err(CleaningError::Cancelled) => println!("Cancelled by user"),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod reporting;
pub mod stats;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{
    CategoryStandardizer, CleaningStage, ColumnNormalizer, ConstantPruner, DuplicateRemover,
    NullHandler, OutlierFilter, StageOutput, TypeCorrector, normalize_name,
};
pub use config::{CleaningConfig, CleaningConfigBuilder, ConfigValidationError};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use io::{TextEncoding, load_csv, parse_csv, to_csv_string, write_csv};
pub use pipeline::{
    CancellationToken, ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage,
    ProgressReporter, ProgressUpdate,
};
pub use reporting::{CleaningReportDocument, ReportGenerator, render_summary};
pub use stats::{CorrelationMatrix, correlation_matrix};
pub use types::{
    CategoryStandardization, CleaningReport, CleaningSummary, ColumnRename, ColumnType,
    ConversionKind, PipelineResult, ReportFragment, StageChange, TypeCorrection,
};
