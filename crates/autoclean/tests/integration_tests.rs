//! Integration tests for the cleaning pipeline.
//!
//! These tests run the whole pipeline over CSV fixtures and in-memory frames.

use autoclean::{
    CancellationToken, CleaningConfig, CleaningError, ColumnType, ConversionKind, Pipeline,
    PipelineResult, PipelineStage, ProgressUpdate, TextEncoding, load_csv, parse_csv,
    to_csv_string,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> DataFrame {
    load_csv(fixtures_path().join(filename), TextEncoding::Utf8).expect("Failed to load fixture")
}

fn clean(df: DataFrame) -> PipelineResult {
    Pipeline::builder()
        .build()
        .unwrap()
        .process(df)
        .expect("Pipeline should complete successfully")
}

fn strings(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or("<null>").to_string())
        .collect()
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect()
}

/// Checks that hold for every cleaned dataset.
fn assert_cleaned_invariants(result: &PipelineResult) {
    let df = &result.data;

    for column in df.get_columns() {
        assert_eq!(column.null_count(), 0, "nulls left in '{}'", column.name());
    }

    if df.width() > 0 {
        let duplicated = df.is_duplicated().unwrap();
        assert!(!duplicated.any(), "duplicate rows remain");
    }

    let mut seen = HashSet::new();
    for name in column_names(df) {
        assert!(!name.is_empty());
        assert!(
            name.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
            "bad column name '{}'",
            name
        );
        assert!(seen.insert(name.clone()), "duplicate column name '{}'", name);
    }

    let summary = &result.summary;
    let report = &result.report;
    assert_eq!(
        summary.rows_before - summary.rows_after,
        report.duplicates_removed + report.outliers_removed
    );
    assert_eq!(
        summary.columns_before - summary.columns_after,
        report.constant_columns_removed.len()
    );
    assert_eq!(summary.columns_after, df.width());
}

// ============================================================================
// Full Pipeline
// ============================================================================

#[test]
fn test_full_pipeline_customers() {
    let df = load_fixture("customers.csv");
    assert_eq!(df.shape(), (6, 6));

    let result = clean(df);
    assert_cleaned_invariants(&result);

    assert_eq!(
        column_names(&result.data),
        vec!["customer_id", "gender", "age", "signup_date", "score"]
    );
    assert_eq!(result.report.null_fill_count, 4);
    assert_eq!(
        result.report.null_fill_columns,
        vec!["Gender", "Age", "Score"]
    );
    assert_eq!(result.report.duplicates_removed, 1);
    assert_eq!(result.report.constant_columns_removed, vec!["Country"]);
    assert_eq!(result.report.outliers_removed, 0);
    assert_eq!(result.summary.rows_after, 5);
    assert_eq!(result.summary.columns_after, 5);
    assert!(result.summary.correlation.is_some());
}

#[test]
fn test_customers_gender_standardized() {
    let result = clean(load_fixture("customers.csv"));

    assert_eq!(
        strings(&result.data, "gender"),
        vec!["male", "female", "male", "unknown", "unknown"]
    );

    let entry = result
        .report
        .category_standardizations
        .iter()
        .find(|s| s.column == "gender")
        .expect("gender should be standardized");
    assert_eq!(entry.before, vec!["M", " f ", "Male", "unknown", "NaN"]);
    assert_eq!(entry.after, vec!["male", "female", "unknown"]);
}

#[test]
fn test_customers_signup_date_parsed() {
    let result = clean(load_fixture("customers.csv"));

    assert!(matches!(
        result.data.column("signup_date").unwrap().dtype(),
        DataType::Datetime(_, _)
    ));
    let correction = result
        .report
        .type_corrections
        .iter()
        .find(|c| c.column == "signup_date")
        .unwrap();
    assert_eq!(correction.old_type, ColumnType::Text);
    assert_eq!(correction.new_type, ColumnType::Datetime);
    assert_eq!(correction.kind, ConversionKind::Datetime);
}

#[test]
fn test_customers_idempotent() {
    let first = clean(load_fixture("customers.csv"));
    let second = clean(first.data.clone());

    assert_eq!(second.report.null_fill_count, 0);
    assert_eq!(second.report.duplicates_removed, 0);
    assert!(second.report.constant_columns_removed.is_empty());
    assert_eq!(second.report.outliers_removed, 0);
    assert_eq!(second.data.shape(), first.data.shape());
    assert_eq!(column_names(&second.data), column_names(&first.data));
}

#[test]
fn test_cleaned_output_round_trips_through_csv() {
    let mut result = clean(load_fixture("customers.csv"));

    let csv = to_csv_string(&mut result.data).unwrap();
    assert!(csv.starts_with("customer_id,gender,age,signup_date,score"));

    let reloaded = parse_csv(csv.as_bytes(), TextEncoding::Utf8).unwrap();
    assert_eq!(reloaded.shape(), result.data.shape());
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_float_column_with_nan_falls_back_to_text() {
    let df = df![
        "id" => [1, 2, 3, 4],
        "reading" => [1.5, f64::NAN, 2.5, 3.0],
    ]
    .unwrap();

    let result = clean(df);
    assert_eq!(
        result.data.column("reading").unwrap().dtype(),
        &DataType::String
    );

    let correction = result
        .report
        .type_corrections
        .iter()
        .find(|c| c.column == "reading")
        .unwrap();
    assert_eq!(correction.old_type, ColumnType::Float);
    assert_eq!(correction.new_type, ColumnType::Text);
    assert_eq!(correction.kind, ConversionKind::TextFallback);
}

#[test]
fn test_nan_token_in_csv_falls_back_to_text() {
    let df = load_fixture("readings.csv");
    assert_eq!(df.column("reading").unwrap().dtype(), &DataType::Float64);

    let result = clean(df);
    assert_eq!(result.summary.rows_after, 4);
    assert_eq!(
        result.data.column("reading").unwrap().dtype(),
        &DataType::String
    );

    let corrections: Vec<_> = result
        .report
        .type_corrections
        .iter()
        .filter(|c| c.column == "reading")
        .collect();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].old_type, ColumnType::Float);
    assert_eq!(corrections[0].new_type, ColumnType::Text);
    assert_eq!(corrections[0].kind, ConversionKind::TextFallback);
    assert_cleaned_invariants(&result);
}

#[test]
fn test_constant_text_column_is_pruned() {
    let df = df![
        "Flag" => ["X", "X", "X"],
        "value" => [1, 2, 3],
    ]
    .unwrap();

    let result = clean(df);
    assert_eq!(result.report.constant_columns_removed, vec!["Flag"]);
    assert_eq!(column_names(&result.data), vec!["value"]);
    assert_cleaned_invariants(&result);
}

#[test]
fn test_repeated_rows_collapse_to_one() {
    let df = df![
        "n" => [1, 1, 1],
        "s" => ["a", "a", "a"],
    ]
    .unwrap();

    let result = clean(df);
    assert_eq!(result.report.duplicates_removed, 2);
    assert_eq!(result.summary.rows_after, 1);
    // both columns are constant once the duplicates are gone
    assert_eq!(result.report.constant_columns_removed, vec!["n", "s"]);
    assert_eq!(result.data.width(), 0);
}

#[test]
fn test_five_values_never_exceed_default_threshold() {
    let df = df![
        "a" => [1, 2, 3, 4, 1000],
        "b" => [5, 3, 4, 1, 2],
    ]
    .unwrap();

    let result = clean(df);
    assert_eq!(result.report.outliers_removed, 0);
    assert_eq!(result.summary.rows_after, 5);
}

#[test]
fn test_outlier_removed_and_survivors_within_bound() {
    let df = load_fixture("sensors.csv");
    let threshold = CleaningConfig::default().z_threshold;

    let stats: Vec<(f64, f64)> = ["id", "sensor", "reading"]
        .iter()
        .map(|name| {
            let values = df
                .column(name)
                .unwrap()
                .as_materialized_series()
                .cast(&DataType::Float64)
                .unwrap();
            let values = values.f64().unwrap();
            (values.mean().unwrap(), values.std(0).unwrap())
        })
        .collect();

    let result = clean(df);
    assert_eq!(result.report.outliers_removed, 1);
    assert_eq!(result.summary.rows_after, 29);
    assert_cleaned_invariants(&result);

    for (name, (mean, std)) in ["id", "sensor", "reading"].iter().zip(stats) {
        let kept = result
            .data
            .column(name)
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::Float64)
            .unwrap();
        for value in kept.f64().unwrap().into_no_null_iter() {
            assert!(((value - mean) / std).abs() <= threshold);
        }
    }
}

#[test]
fn test_outlier_filter_can_be_disabled() {
    let config = CleaningConfig::builder()
        .remove_outliers(false)
        .build()
        .unwrap();

    let result = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .process(load_fixture("sensors.csv"))
        .unwrap();
    assert_eq!(result.report.outliers_removed, 0);
    assert_eq!(result.summary.rows_after, 30);
}

// ============================================================================
// Loader
// ============================================================================

#[test]
fn test_load_latin1_fixture() {
    let df = load_csv(fixtures_path().join("cities_latin1.csv"), TextEncoding::Latin1).unwrap();
    assert_eq!(df.shape(), (3, 3));
    assert_eq!(strings(&df, "city"), vec!["München", "Zürich", "Genève"]);

    let result = clean(df);
    assert_eq!(
        column_names(&result.data),
        vec!["city", "population", "country_code"]
    );
    // a single numeric column is not enough for outlier filtering
    assert!(
        result
            .report
            .warnings
            .iter()
            .any(|w| w.contains("numeric"))
    );
}

#[test]
fn test_latin1_bytes_rejected_as_utf8() {
    let err = load_csv(fixtures_path().join("cities_latin1.csv"), TextEncoding::Utf8).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_ENCODING");
    assert!(err.is_input_error());
}

#[test]
fn test_unsupported_encoding_name() {
    let err = "cp1252".parse::<TextEncoding>().unwrap_err();
    assert!(matches!(err, CleaningError::UnsupportedEncoding(_)));
}

#[test]
fn test_header_only_file_is_empty_dataset() {
    let err = load_csv(fixtures_path().join("header_only.csv"), TextEncoding::Utf8).unwrap_err();
    assert_eq!(err.error_code(), "EMPTY_DATASET");
}

#[test]
fn test_missing_file() {
    let err = load_csv(fixtures_path().join("missing.csv"), TextEncoding::Utf8).unwrap_err();
    assert_eq!(err.error_code(), "IO_ERROR");
}

// ============================================================================
// Progress & Cancellation
// ============================================================================

#[test]
fn test_pipeline_cancellation_before_start() {
    let token = CancellationToken::new();
    token.cancel();

    let result = Pipeline::builder()
        .cancellation_token(token)
        .build()
        .unwrap()
        .process(load_fixture("customers.csv"));

    assert!(matches!(result, Err(CleaningError::Cancelled)));
}

#[test]
fn test_pipeline_progress_stages_reported() {
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();

    Pipeline::builder()
        .on_progress(move |update| sink.lock().unwrap().push(update))
        .build()
        .unwrap()
        .process(load_fixture("customers.csv"))
        .unwrap();

    let stages: Vec<PipelineStage> = updates
        .lock()
        .unwrap()
        .iter()
        .filter(|u| u.stage_progress == 0.0)
        .map(|u| u.stage)
        .collect();
    assert_eq!(stages, PipelineStage::ORDER.to_vec());
}

#[test]
fn test_pipeline_runs_on_worker_thread() {
    let pipeline = Pipeline::builder().build().unwrap();
    let df = load_fixture("customers.csv");

    let handle = std::thread::spawn(move || pipeline.process(df).map(|r| r.summary.rows_after));
    assert_eq!(handle.join().unwrap().unwrap(), 5);
}
