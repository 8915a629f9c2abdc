//! Report output module.
//!
//! Saves cleaned datasets, writes JSON reports and renders the plain-text
//! summary printed by the CLI.
//!
//! # Example
//!
//! ```rust,ignore
//! use autoclean::reporting::{ReportGenerator, render_summary};
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"), None);
//! let csv_path = generator.write_dataset(&mut result.data)?;
//!
//! let document = ReportGenerator::build_document(
//!     "data/sales.csv",
//!     csv_path.to_str(),
//!     pipeline.config(),
//!     &result,
//! );
//! generator.write_report_to_file(&document, "sales")?;
//!
//! println!("{}", render_summary(&result.report, &result.summary));
//! ```

mod generator;

pub use generator::{
    CleaningReportDocument, DEFAULT_OUTPUT_NAME, ReportGenerator, render_summary,
};
