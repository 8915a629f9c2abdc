//! Type correction for mistyped columns.

use super::converters::{PARSE_PRIORITY, ParseAttempt, float_to_text};
use super::{CleaningStage, StageOutput};
use crate::config::CleaningConfig;
use crate::pipeline::PipelineStage;
use crate::types::{ColumnType, ConversionKind, ReportFragment, StageChange, TypeCorrection};
use crate::utils::{column_type, text_values};
use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::{debug, info};

/// Re-types columns whose values say they are something else.
///
/// Text columns are offered to each [`ParseAttempt`] in [`PARSE_PRIORITY`]
/// order and take the first one that parses every value. Float columns
/// holding `NaN` or infinities are turned back into text. Columns that fit
/// neither case are left untouched.
pub struct TypeCorrector;

impl TypeCorrector {
    /// Work out the replacement for one column, if any.
    pub fn correct_column(series: &Series) -> Result<Option<(Series, TypeCorrection)>> {
        let old_type = column_type(series);
        let name = series.name().to_string();

        let converted = match old_type {
            ColumnType::Text => {
                let owned = text_values(series)?;
                let values: Vec<Option<&str>> = owned.iter().map(|v| v.as_deref()).collect();
                PARSE_PRIORITY.iter().find_map(|attempt| {
                    attempt
                        .try_parse(series.name().clone(), &values)
                        .map(|parsed| (parsed, Self::kind_of(*attempt)))
                })
            }
            ColumnType::Float => {
                float_to_text(series).map(|text| (text, ConversionKind::TextFallback))
            }
            _ => None,
        };

        Ok(converted.map(|(parsed, kind)| {
            let new_type = column_type(&parsed);
            (parsed, TypeCorrection::new(name, old_type, new_type, kind))
        }))
    }

    fn kind_of(attempt: ParseAttempt) -> ConversionKind {
        match attempt {
            ParseAttempt::Numeric => ConversionKind::Numeric,
            ParseAttempt::Datetime => ConversionKind::Datetime,
        }
    }
}

impl CleaningStage for TypeCorrector {
    fn stage(&self) -> PipelineStage {
        PipelineStage::TypeCorrection
    }

    fn apply(&self, mut df: DataFrame, _config: &CleaningConfig) -> Result<StageOutput> {
        let mut corrections = Vec::new();
        let names: Vec<PlSmallStr> = df.get_columns().iter().map(|c| c.name().clone()).collect();

        for name in names {
            let series = df.column(&name)?.as_materialized_series().clone();
            match Self::correct_column(&series)? {
                Some((converted, correction)) => {
                    df.replace(&name, converted)
                        .with_context(|| format!("Failed to replace column '{}'", name))?;
                    debug!(
                        "Corrected '{}': {} -> {} ({})",
                        name, correction.old_type, correction.new_type, correction.kind
                    );
                    corrections.push(correction);
                }
                None => debug!("'{}': no conversion", name),
            }
        }

        if !corrections.is_empty() {
            info!("Corrected the type of {} columns", corrections.len());
        }

        Ok(StageOutput::new(
            df,
            ReportFragment::new(StageChange::TypesCorrected(corrections)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrections(fragment: &ReportFragment) -> Vec<TypeCorrection> {
        match &fragment.change {
            StageChange::TypesCorrected(entries) => entries.clone(),
            other => panic!("Unexpected fragment: {:?}", other),
        }
    }

    fn run(df: DataFrame) -> (DataFrame, Vec<TypeCorrection>) {
        let output = TypeCorrector.apply(df, &CleaningConfig::default()).unwrap();
        let entries = corrections(&output.fragment);
        (output.data, entries)
    }

    #[test]
    fn test_text_integers_become_integer() {
        let df = df!["qty" => ["1", "2", "30"]].unwrap();

        let (df, entries) = run(df);
        assert_eq!(df.column("qty").unwrap().dtype(), &DataType::Int64);
        assert_eq!(
            entries,
            vec![TypeCorrection::new(
                "qty",
                ColumnType::Text,
                ColumnType::Integer,
                ConversionKind::Numeric
            )]
        );
    }

    #[test]
    fn test_text_decimals_become_float() {
        let df = df!["price" => ["1.5", "2", "3.25"]].unwrap();

        let (df, entries) = run(df);
        assert_eq!(df.column("price").unwrap().dtype(), &DataType::Float64);
        assert_eq!(entries[0].new_type, ColumnType::Float);
    }

    #[test]
    fn test_text_dates_become_datetime() {
        let df = df!["joined" => ["2024-01-05", "2023-12-31"]].unwrap();

        let (df, entries) = run(df);
        assert!(matches!(
            df.column("joined").unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
        assert_eq!(entries[0].kind, ConversionKind::Datetime);
        assert_eq!(entries[0].new_type, ColumnType::Datetime);
    }

    #[test]
    fn test_numbers_are_never_read_as_dates() {
        let df = df!["year" => ["2020", "2021"]].unwrap();

        let (df, entries) = run(df);
        assert_eq!(df.column("year").unwrap().dtype(), &DataType::Int64);
        assert_eq!(entries[0].kind, ConversionKind::Numeric);
    }

    #[test]
    fn test_mixed_text_is_left_alone() {
        let df = df!["code" => ["1", "2", "abc"]].unwrap();

        let (df, entries) = run(df);
        assert_eq!(df.column("code").unwrap().dtype(), &DataType::String);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_float_with_nan_falls_back_to_text() {
        let df = df!["reading" => [1.5, f64::NAN, 2.5]].unwrap();

        let (df, entries) = run(df);
        assert_eq!(df.column("reading").unwrap().dtype(), &DataType::String);
        assert_eq!(
            entries,
            vec![TypeCorrection::new(
                "reading",
                ColumnType::Float,
                ColumnType::Text,
                ConversionKind::TextFallback
            )]
        );
    }

    #[test]
    fn test_clean_numeric_columns_are_untouched() {
        let df = df![
            "a" => [1, 2, 3],
            "b" => [1.5, 2.5, 3.5],
            "c" => [true, false, true],
        ]
        .unwrap();

        let (_, entries) = run(df);
        assert!(entries.is_empty());
    }
}
