//! Column name normalization.

use super::{CleaningStage, StageOutput};
use crate::config::CleaningConfig;
use crate::pipeline::PipelineStage;
use crate::types::{ColumnRename, ReportFragment, StageChange};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

static DISALLOWED_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_\s]").expect("Invalid regex: disallowed chars"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));

/// Normalize a single column name.
///
/// Lowercases, drops every character outside `[a-z0-9_]` and whitespace,
/// trims, then joins the remaining words with single underscores. The result
/// always matches `[a-z0-9_]*` and may be empty.
///
/// ```rust,ignore
/// assert_eq!(normalize_name("  First Name "), "first_name");
/// assert_eq!(normalize_name("Price ($)"), "price");
/// ```
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = DISALLOWED_CHARS.replace_all(&lowered, "");
    WHITESPACE_RUN
        .replace_all(stripped.trim(), "_")
        .into_owned()
}

/// Renames every column to its normalized form, keeping names unique.
///
/// An empty result becomes `column_<position>` (0-based) and a name already
/// taken by an earlier column gets a `_<n>` suffix.
pub struct ColumnNormalizer;

impl ColumnNormalizer {
    /// Compute the final names for `names`, in order.
    pub fn unique_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
        let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
        let mut result = Vec::with_capacity(names.len());

        for (position, name) in names.iter().enumerate() {
            let mut base = normalize_name(name.as_ref());
            if base.is_empty() {
                base = format!("column_{}", position);
            }

            let mut candidate = base.clone();
            let mut suffix = 1;
            while taken.contains(&candidate) {
                candidate = format!("{}_{}", base, suffix);
                suffix += 1;
            }

            taken.insert(candidate.clone());
            result.push(candidate);
        }

        result
    }
}

impl CleaningStage for ColumnNormalizer {
    fn stage(&self) -> PipelineStage {
        PipelineStage::ColumnNormalization
    }

    fn apply(&self, df: DataFrame, _config: &CleaningConfig) -> Result<StageOutput> {
        let old_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        let new_names = Self::unique_names(&old_names);

        let renames: Vec<ColumnRename> = old_names
            .iter()
            .zip(&new_names)
            .filter(|(old, new)| old != new)
            .map(|(old, new)| ColumnRename {
                from: old.clone(),
                to: new.clone(),
            })
            .collect();

        let df = if renames.is_empty() {
            df
        } else {
            let columns: Vec<Column> = df
                .get_columns()
                .iter()
                .zip(&new_names)
                .map(|(col, name)| {
                    col.as_materialized_series()
                        .clone()
                        .with_name(name.as_str().into())
                        .into()
                })
                .collect();
            DataFrame::new(columns).context("Failed to rebuild frame with normalized names")?
        };

        for rename in &renames {
            debug!("Renamed column '{}' -> '{}'", rename.from, rename.to);
        }

        Ok(StageOutput::new(
            df,
            ReportFragment::new(StageChange::ColumnsRenamed(renames)),
        ))
    }
}
