//! Categorical standardization of small-cardinality text columns.

use super::{CleaningStage, StageOutput};
use crate::config::CleaningConfig;
use crate::pipeline::PipelineStage;
use crate::types::{CategoryStandardization, ColumnType, ReportFragment, StageChange};
use crate::utils::{column_type, distinct_in_order, text_values};
use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::{debug, info};

/// Trims and lowercases text columns with fewer distinct values than the
/// cardinality cutoff, mapping null-like tokens to the placeholder.
///
/// Columns whose name contains the gender marker are reduced to
/// `male`/`female`/placeholder.
pub struct CategoryStandardizer;

impl CategoryStandardizer {
    /// Standardize a single value.
    pub fn standardize_value(value: Option<&str>, gender: bool, config: &CleaningConfig) -> String {
        let Some(value) = value else {
            return config.text_fill_value.clone();
        };
        let normalized = value.trim().to_lowercase();

        if gender {
            return match normalized.as_str() {
                "m" | "male" => "male".to_string(),
                "f" | "female" => "female".to_string(),
                _ => config.text_fill_value.clone(),
            };
        }

        if config.is_missing_token(&normalized) {
            config.text_fill_value.clone()
        } else {
            normalized
        }
    }

    fn is_gender_column(name: &str, config: &CleaningConfig) -> bool {
        name.to_lowercase()
            .contains(&config.gender_marker.to_lowercase())
    }
}

impl CleaningStage for CategoryStandardizer {
    fn stage(&self) -> PipelineStage {
        PipelineStage::CategoryStandardization
    }

    fn apply(&self, mut df: DataFrame, config: &CleaningConfig) -> Result<StageOutput> {
        let mut entries = Vec::new();
        let names: Vec<PlSmallStr> = df.get_columns().iter().map(|c| c.name().clone()).collect();

        for name in names {
            let series = df.column(&name)?.as_materialized_series().clone();
            if column_type(&series) != ColumnType::Text {
                continue;
            }

            let non_null = series.drop_nulls();
            let cardinality = if non_null.is_empty() {
                0
            } else {
                non_null.n_unique()?
            };
            if cardinality >= config.cardinality_cutoff {
                debug!(
                    "'{}' has {} distinct values; not treated as categorical",
                    name, cardinality
                );
                continue;
            }

            let values = text_values(&series)?;
            let gender = Self::is_gender_column(&name, config);
            let standardized: Vec<Option<String>> = values
                .iter()
                .map(|v| Some(Self::standardize_value(v.as_deref(), gender, config)))
                .collect();

            let before = distinct_in_order(values.iter().map(|v| v.as_deref()));
            let after = distinct_in_order(standardized.iter().map(|v| v.as_deref()));
            debug!("Standardized '{}': {:?} -> {:?}", name, before, after);

            df.replace(&name, Series::new(name.clone(), standardized))
                .with_context(|| format!("Failed to replace column '{}'", name))?;
            entries.push(CategoryStandardization {
                column: name.to_string(),
                before,
                after,
            });
        }

        if !entries.is_empty() {
            info!("Standardized {} categorical columns", entries.len());
        }

        Ok(StageOutput::new(
            df,
            ReportFragment::new(StageChange::CategoriesStandardized(entries)),
        ))
    }
}
