//! Configuration types for the cleaning pipeline.
//!
//! Every threshold and token list the stages use lives here with a documented
//! default, so callers (and tests) can exercise boundary values without
//! touching stage code.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default z-score above which a numeric value marks its row as an outlier.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Default minimum number of numeric columns for the outlier filter to run.
pub const DEFAULT_MIN_NUMERIC_COLUMNS: usize = 2;

/// Default cardinality cutoff for categorical standardization.
pub const DEFAULT_CARDINALITY_CUTOFF: usize = 50;

/// Default placeholder for missing or null-like text.
pub const DEFAULT_TEXT_FILL: &str = "unknown";

/// Default substring that marks a column as holding gender values.
pub const DEFAULT_GENDER_MARKER: &str = "gender";

/// Default textual forms that the category standardizer treats as missing.
pub const DEFAULT_MISSING_TOKENS: [&str; 4] = ["", "nan", "none", "null"];

/// Configuration for the cleaning pipeline.
///
/// Use [`CleaningConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use autoclean::config::CleaningConfig;
///
/// let config = CleaningConfig::builder()
///     .z_threshold(2.5)
///     .cardinality_cutoff(20)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Absolute z-score above which a value is an outlier.
    /// Default: 3.0
    pub z_threshold: f64,

    /// Minimum number of numeric columns required before the outlier
    /// filter does anything.
    /// Default: 2
    pub min_numeric_columns: usize,

    /// Text columns with fewer distinct values than this are standardized
    /// as categories. Higher-cardinality columns are treated as free text
    /// or identifiers and left alone.
    /// Default: 50
    pub cardinality_cutoff: usize,

    /// Placeholder written into missing text cells and null-like categories.
    /// Default: "unknown"
    pub text_fill_value: String,

    /// Lowercased textual forms mapped to the placeholder during
    /// categorical standardization.
    /// Default: ["", "nan", "none", "null"]
    pub missing_tokens: Vec<String>,

    /// Substring of a (normalized) column name that enables gender mapping.
    /// Default: "gender"
    pub gender_marker: String,

    /// Whether to remove exact-duplicate rows.
    /// Default: true
    pub remove_duplicates: bool,

    /// Whether to remove statistical outlier rows.
    /// Default: true
    pub remove_outliers: bool,

    /// Whether to re-type text and mistyped numeric columns.
    /// Default: true
    pub enable_type_correction: bool,

    /// Whether to standardize small-cardinality text columns.
    /// Default: true
    pub standardize_categories: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_Z_THRESHOLD,
            min_numeric_columns: DEFAULT_MIN_NUMERIC_COLUMNS,
            cardinality_cutoff: DEFAULT_CARDINALITY_CUTOFF,
            text_fill_value: DEFAULT_TEXT_FILL.to_string(),
            missing_tokens: default_missing_tokens(),
            gender_marker: DEFAULT_GENDER_MARKER.to_string(),
            remove_duplicates: true,
            remove_outliers: true,
            enable_type_correction: true,
            standardize_categories: true,
        }
    }
}

fn default_missing_tokens() -> Vec<String> {
    DEFAULT_MISSING_TOKENS.iter().map(|t| t.to_string()).collect()
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Load a configuration from a JSON file.
    ///
    /// Missing fields take their defaults; the result is validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: CleaningConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check whether a lowercased, trimmed value is a null-like token.
    pub fn is_missing_token(&self, value: &str) -> bool {
        self.missing_tokens.iter().any(|t| t == value)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidZThreshold(self.z_threshold));
        }

        if self.min_numeric_columns == 0 {
            return Err(ConfigValidationError::InvalidCount {
                field: "min_numeric_columns".to_string(),
                value: self.min_numeric_columns,
            });
        }

        if self.cardinality_cutoff == 0 {
            return Err(ConfigValidationError::InvalidCount {
                field: "cardinality_cutoff".to_string(),
                value: self.cardinality_cutoff,
            });
        }

        if self.text_fill_value.trim().is_empty() {
            return Err(ConfigValidationError::EmptyValue(
                "text_fill_value".to_string(),
            ));
        }

        if self.gender_marker.trim().is_empty() {
            return Err(ConfigValidationError::EmptyValue("gender_marker".to_string()));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid z-score threshold: {0} (must be a finite number above 0)")]
    InvalidZThreshold(f64),

    #[error("Invalid value for '{field}': {value} (must be at least 1)")]
    InvalidCount { field: String, value: usize },

    #[error("'{0}' must not be empty")]
    EmptyValue(String),
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    z_threshold: Option<f64>,
    min_numeric_columns: Option<usize>,
    cardinality_cutoff: Option<usize>,
    text_fill_value: Option<String>,
    missing_tokens: Option<Vec<String>>,
    gender_marker: Option<String>,
    remove_duplicates: Option<bool>,
    remove_outliers: Option<bool>,
    enable_type_correction: Option<bool>,
    standardize_categories: Option<bool>,
}

impl CleaningConfigBuilder {
    /// Set the z-score threshold for outlier removal.
    pub fn z_threshold(mut self, threshold: f64) -> Self {
        self.z_threshold = Some(threshold);
        self
    }

    /// Set the minimum number of numeric columns for outlier removal.
    pub fn min_numeric_columns(mut self, count: usize) -> Self {
        self.min_numeric_columns = Some(count);
        self
    }

    /// Set the cardinality cutoff for categorical standardization.
    pub fn cardinality_cutoff(mut self, cutoff: usize) -> Self {
        self.cardinality_cutoff = Some(cutoff);
        self
    }

    /// Set the placeholder used for missing text.
    pub fn text_fill_value(mut self, value: impl Into<String>) -> Self {
        self.text_fill_value = Some(value.into());
        self
    }

    /// Replace the null-like token list. Tokens are lowercased and trimmed.
    pub fn missing_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.missing_tokens = Some(
            tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .collect(),
        );
        self
    }

    /// Set the column-name substring that enables gender mapping.
    pub fn gender_marker(mut self, marker: impl Into<String>) -> Self {
        self.gender_marker = Some(marker.into());
        self
    }

    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Enable or disable outlier row removal.
    pub fn remove_outliers(mut self, remove: bool) -> Self {
        self.remove_outliers = Some(remove);
        self
    }

    /// Enable or disable automatic type correction.
    pub fn enable_type_correction(mut self, enable: bool) -> Self {
        self.enable_type_correction = Some(enable);
        self
    }

    /// Enable or disable categorical standardization.
    pub fn standardize_categories(mut self, enable: bool) -> Self {
        self.standardize_categories = Some(enable);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let config = CleaningConfig {
            z_threshold: self.z_threshold.unwrap_or(DEFAULT_Z_THRESHOLD),
            min_numeric_columns: self
                .min_numeric_columns
                .unwrap_or(DEFAULT_MIN_NUMERIC_COLUMNS),
            cardinality_cutoff: self
                .cardinality_cutoff
                .unwrap_or(DEFAULT_CARDINALITY_CUTOFF),
            text_fill_value: self
                .text_fill_value
                .unwrap_or_else(|| DEFAULT_TEXT_FILL.to_string()),
            missing_tokens: self.missing_tokens.unwrap_or_else(default_missing_tokens),
            gender_marker: self
                .gender_marker
                .unwrap_or_else(|| DEFAULT_GENDER_MARKER.to_string()),
            remove_duplicates: self.remove_duplicates.unwrap_or(true),
            remove_outliers: self.remove_outliers.unwrap_or(true),
            enable_type_correction: self.enable_type_correction.unwrap_or(true),
            standardize_categories: self.standardize_categories.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
