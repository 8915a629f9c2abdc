use crate::stats::CorrelationMatrix;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Column Types
// ============================================================================

/// Logical type of a column, inferred from its polars dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Boolean,
    Datetime,
    /// Lists, structs, binary and anything else the cleaner does not model.
    Other,
}

impl ColumnType {
    /// Classify a polars dtype.
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::String | DataType::Categorical(_, _) => Self::Text,
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => Self::Integer,
            DataType::Float32 | DataType::Float64 => Self::Float,
            DataType::Boolean => Self::Boolean,
            DataType::Datetime(_, _) | DataType::Date | DataType::Time => Self::Datetime,
            _ => Self::Other,
        }
    }

    /// Whether the type takes part in numeric statistics.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the type corrector changed a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionKind {
    /// Text parsed into integers or floats.
    Numeric,
    /// Text parsed into timestamps.
    Datetime,
    /// Numeric column carrying non-numeric tokens, turned back into text.
    TextFallback,
}

impl ConversionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Datetime => "datetime",
            Self::TextFallback => "text-fallback",
        }
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Report Entries
// ============================================================================

/// One column re-typed by the type corrector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCorrection {
    pub column: String,
    pub old_type: ColumnType,
    pub new_type: ColumnType,
    pub kind: ConversionKind,
}

impl TypeCorrection {
    pub fn new(
        column: impl Into<String>,
        old_type: ColumnType,
        new_type: ColumnType,
        kind: ConversionKind,
    ) -> Self {
        Self {
            column: column.into(),
            old_type,
            new_type,
            kind,
        }
    }
}

/// Distinct values of a categorical column before and after standardization,
/// each in order of first appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStandardization {
    pub column: String,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

/// A column renamed by the column normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

// ============================================================================
// Report Fragments
// ============================================================================

/// What a single stage changed.
#[derive(Debug, Clone, PartialEq)]
pub enum StageChange {
    NullsFilled { cells: usize, columns: Vec<String> },
    DuplicatesRemoved(usize),
    ConstantColumnsRemoved(Vec<String>),
    ColumnsRenamed(Vec<ColumnRename>),
    OutliersRemoved(usize),
    TypesCorrected(Vec<TypeCorrection>),
    CategoriesStandardized(Vec<CategoryStandardization>),
}

/// Immutable record of one stage's effect, merged into the [`CleaningReport`]
/// by the pipeline together with the stage's output frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFragment {
    pub change: StageChange,
    pub warnings: Vec<String>,
}

impl ReportFragment {
    pub fn new(change: StageChange) -> Self {
        Self {
            change,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

// ============================================================================
// Cleaning Report
// ============================================================================

/// Accumulated record of everything the pipeline changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Null cells present before filling.
    pub null_fill_count: usize,
    /// Columns that had at least one null filled.
    pub null_fill_columns: Vec<String>,
    pub duplicates_removed: usize,
    pub constant_columns_removed: Vec<String>,
    pub outliers_removed: usize,
    pub type_corrections: Vec<TypeCorrection>,
    pub category_standardizations: Vec<CategoryStandardization>,
    /// Non-fatal conditions met along the way.
    pub warnings: Vec<String>,
}

impl CleaningReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a stage fragment into the report.
    ///
    /// Renames are not part of the report; the pipeline moves them into the
    /// [`CleaningSummary`].
    pub fn apply(&mut self, fragment: ReportFragment) {
        match fragment.change {
            StageChange::NullsFilled { cells, columns } => {
                self.null_fill_count += cells;
                self.null_fill_columns.extend(columns);
            }
            StageChange::DuplicatesRemoved(n) => self.duplicates_removed += n,
            StageChange::ConstantColumnsRemoved(columns) => {
                self.constant_columns_removed.extend(columns)
            }
            StageChange::ColumnsRenamed(_) => {}
            StageChange::OutliersRemoved(n) => self.outliers_removed += n,
            StageChange::TypesCorrected(entries) => self.type_corrections.extend(entries),
            StageChange::CategoriesStandardized(entries) => {
                self.category_standardizations.extend(entries)
            }
        }
        self.warnings.extend(fragment.warnings);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Rows removed by the row-dropping stages.
    pub fn rows_removed(&self) -> usize {
        self.duplicates_removed + self.outliers_removed
    }

    /// Whether any stage changed the data.
    pub fn has_changes(&self) -> bool {
        self.null_fill_count > 0
            || self.rows_removed() > 0
            || !self.constant_columns_removed.is_empty()
            || !self.type_corrections.is_empty()
            || !self.category_standardizations.is_empty()
    }
}

// ============================================================================
// Summary & Result
// ============================================================================

/// Shape and timing of a finished run.
///
/// # Example
///
/// ```rust,ignore
/// let summary = &result.summary;
/// println!("Cleaned {} rows in {}ms", summary.rows_after, summary.duration_ms);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    pub renamed_columns: Vec<ColumnRename>,
    /// Pearson correlations of the cleaned numeric columns, when at least
    /// two remain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<CorrelationMatrix>,
}

impl CleaningSummary {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    pub fn columns_removed(&self) -> usize {
        self.columns_before.saturating_sub(self.columns_after)
    }

    /// Calculate the percentage of rows removed.
    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed() as f32 / self.rows_before as f32) * 100.0
        }
    }

    /// Calculate the percentage of columns removed.
    pub fn columns_removed_percentage(&self) -> f32 {
        if self.columns_before == 0 {
            0.0
        } else {
            (self.columns_removed() as f32 / self.columns_before as f32) * 100.0
        }
    }
}

/// Output of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The cleaned dataset.
    pub data: DataFrame,
    pub report: CleaningReport,
    pub summary: CleaningSummary,
}

// ============================================================================
// Tests
// ============================================================================
