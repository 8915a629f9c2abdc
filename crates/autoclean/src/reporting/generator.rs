use crate::config::CleaningConfig;
use crate::io::write_csv;
use crate::types::{CleaningReport, CleaningSummary, PipelineResult};
use anyhow::Result;
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// File name used for the cleaned dataset when none is given.
pub const DEFAULT_OUTPUT_NAME: &str = "cleaned_dataset";

// ============================================================================
// Report Document
// ============================================================================

/// Everything written to `<stem>_report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReportDocument {
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub input_file: String,
    /// Path to the cleaned CSV, if one was written
    pub output_file: Option<String>,
    /// Settings the run used
    pub config: CleaningConfig,
    pub report: CleaningReport,
    pub summary: CleaningSummary,
}

// ============================================================================
// Report Generator
// ============================================================================

/// Writes cleaned datasets and JSON reports into an output directory.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    /// Path the cleaned dataset is written to.
    pub fn dataset_path(&self) -> PathBuf {
        let name = self.output_name.as_deref().unwrap_or(DEFAULT_OUTPUT_NAME);
        self.output_dir.join(format!("{}.csv", name))
    }

    /// Save the cleaned dataset as `<name>.csv`.
    pub fn write_dataset(&self, df: &mut DataFrame) -> Result<PathBuf> {
        let path = self.dataset_path();
        write_csv(df, &path)?;
        Ok(path)
    }

    /// Assemble the JSON report for a finished run.
    pub fn build_document(
        input_file: &str,
        output_file: Option<&str>,
        config: &CleaningConfig,
        result: &PipelineResult,
    ) -> CleaningReportDocument {
        CleaningReportDocument {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            output_file: output_file.map(String::from),
            config: config.clone(),
            report: result.report.clone(),
            summary: result.summary.clone(),
        }
    }

    /// Write a report to `<report_base_name>_report.json` in the output
    /// directory.
    pub fn write_report_to_file(
        &self,
        document: &CleaningReportDocument,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(document)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

// ============================================================================
// Human-readable summary
// ============================================================================

/// Render the per-stage outcome and final summary as plain text.
pub fn render_summary(report: &CleaningReport, summary: &CleaningSummary) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("Null Value Handling".to_string());
    if report.null_fill_count == 0 {
        lines.push("  No nulls found.".to_string());
    } else {
        lines.push(format!(
            "  {} null values filled in: {}",
            report.null_fill_count,
            report.null_fill_columns.join(", ")
        ));
    }

    lines.push("Duplicate Removal".to_string());
    if report.duplicates_removed == 0 {
        lines.push("  No duplicates found.".to_string());
    } else {
        lines.push(format!("  {} duplicates removed.", report.duplicates_removed));
    }

    lines.push("Constant Columns Removal".to_string());
    if report.constant_columns_removed.is_empty() {
        lines.push("  No constant columns.".to_string());
    } else {
        lines.push(format!(
            "  Removed: {}",
            report.constant_columns_removed.join(", ")
        ));
    }

    lines.push("Column Names".to_string());
    lines.push(format!(
        "  Cleaned column names ({} renamed).",
        summary.renamed_columns.len()
    ));
    for rename in &summary.renamed_columns {
        lines.push(format!("    {} -> {}", rename.from, rename.to));
    }

    lines.push("Outlier Detection & Removal".to_string());
    if report.outliers_removed == 0 {
        lines.push("  No outliers found.".to_string());
    } else {
        lines.push(format!("  {} outliers removed.", report.outliers_removed));
    }

    lines.push("Data Type Corrections".to_string());
    if report.type_corrections.is_empty() {
        lines.push("  No data type changes needed.".to_string());
    } else {
        lines.push(format!(
            "  {:<24} {:<10} {:<10} {}",
            "Column", "Old Type", "New Type", "Conversion"
        ));
        for c in &report.type_corrections {
            lines.push(format!(
                "  {:<24} {:<10} {:<10} {}",
                c.column, c.old_type, c.new_type, c.kind
            ));
        }
    }

    if !report.category_standardizations.is_empty() {
        lines.push("Categorical Standardization".to_string());
        lines.push(format!("  {:<24} {:<30} {}", "Column", "Before", "After"));
        for s in &report.category_standardizations {
            lines.push(format!(
                "  {:<24} {:<30} {}",
                s.column,
                s.before.join(", "),
                s.after.join(", ")
            ));
        }
    }

    lines.push("Correlation".to_string());
    match &summary.correlation {
        Some(matrix) => {
            let header: Vec<String> = matrix.columns.iter().map(|c| format!("{:>10}", c)).collect();
            lines.push(format!("  {:<16}{}", "", header.join("")));
            for (name, row) in matrix.columns.iter().zip(&matrix.values) {
                let cells: Vec<String> = row
                    .iter()
                    .map(|v| match v {
                        Some(r) => format!("{:>10.2}", r),
                        None => format!("{:>10}", "-"),
                    })
                    .collect();
                lines.push(format!("  {:<16}{}", name, cells.join("")));
            }
        }
        None => lines.push("  Not enough numeric columns for a correlation matrix.".to_string()),
    }

    if !report.warnings.is_empty() {
        lines.push("Warnings".to_string());
        for warning in &report.warnings {
            lines.push(format!("  - {}", warning));
        }
    }

    lines.push("Final Summary".to_string());
    lines.push(format!("  - Rows: {}", summary.rows_after));
    lines.push(format!("  - Columns: {}", summary.columns_after));
    lines.push(format!("  - Removed Duplicates: {}", report.duplicates_removed));
    lines.push(format!(
        "  - Removed Constant Columns: {}",
        report.constant_columns_removed.len()
    ));
    lines.push(format!("  - Outliers Removed: {}", report.outliers_removed));

    lines.join("\n")
}
