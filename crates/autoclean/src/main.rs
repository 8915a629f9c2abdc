//! CLI entry point for the cleaning pipeline.

use anyhow::{Result, anyhow};
use autoclean::{
    CleaningConfig, Pipeline, PipelineResult, ReportGenerator, TextEncoding, load_csv,
    render_summary,
};
use clap::Parser;
use dotenv::dotenv;
use polars::prelude::*;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Environment variable naming a JSON config file.
const CONFIG_ENV_VAR: &str = "AUTOCLEAN_CONFIG";

#[derive(Parser, Debug)]
#[command(
    author = "Autoclean Contributors",
    version,
    about = "Automatic tabular data cleaning",
    long_about = "Cleans a CSV dataset in one pass: fills nulls, removes duplicates, \
                  drops constant columns, normalizes column names, filters outliers, \
                  corrects types and standardizes categories.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  AUTOCLEAN_CONFIG    Path to a JSON config file (same as --config)\n  \
                  RUST_LOG            Log filter, overrides --log-level\n\n\
                  EXAMPLES:\n  \
                  # Clean with defaults\n  \
                  autoclean -i data.csv\n\n  \
                  # Latin-1 input, custom output name and a JSON report\n  \
                  autoclean -i data.csv --encoding latin1 --output-name sales -r\n\n  \
                  # Look at the data without cleaning it\n  \
                  autoclean -i data.csv --preview"
)]
struct Args {
    /// Path to the CSV file to clean
    #[arg(short, long)]
    input: String,

    /// Output directory for results
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Custom output file name (without extension)
    ///
    /// If not specified, uses "cleaned_dataset"
    #[arg(long)]
    output_name: Option<String>,

    /// Text encoding of the input (utf-8 or latin1)
    #[arg(long, default_value = "utf-8")]
    encoding: String,

    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Z-score above which a row counts as an outlier
    #[arg(long)]
    z_threshold: Option<f64>,

    /// Text columns with fewer distinct values than this are standardized
    #[arg(long)]
    cardinality_cutoff: Option<usize>,

    /// Keep duplicate rows
    #[arg(long)]
    keep_duplicates: bool,

    /// Disable type correction
    #[arg(long)]
    no_type_correction: bool,

    /// Disable categorical standardization
    #[arg(long)]
    no_category_standardization: bool,

    /// Disable outlier filtering
    #[arg(long)]
    no_outliers: bool,

    /// Print the original shape and first rows, then exit without cleaning
    #[arg(long)]
    preview: bool,

    /// Rows shown by --preview
    #[arg(long, default_value = "5")]
    preview_rows: usize,

    /// Output JSON to stdout instead of the human-readable summary
    ///
    /// Disables all progress logs; only the final JSON report is printed.
    #[arg(long)]
    json: bool,

    /// Write a JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let encoding: TextEncoding = args.encoding.parse()?;

    info!("Loading dataset from: {}", args.input);
    let data = load_csv(&args.input, encoding)?;

    if args.preview {
        print_preview(&args, &data);
        return Ok(());
    }

    let config = build_config(&args)?;
    let pipeline = build_pipeline(&args, config)?;

    run_pipeline(&pipeline, &args, data)
}

/// Resolve the config: file from `--config` or the environment, then flag
/// overrides.
fn build_config(args: &Args) -> Result<CleaningConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

    let mut config = match path {
        Some(path) => {
            info!("Loading config from: {}", path.display());
            CleaningConfig::from_json_file(&path)?
        }
        None => CleaningConfig::default(),
    };

    if let Some(threshold) = args.z_threshold {
        config.z_threshold = threshold;
    }
    if let Some(cutoff) = args.cardinality_cutoff {
        config.cardinality_cutoff = cutoff;
    }
    if args.keep_duplicates {
        config.remove_duplicates = false;
    }
    if args.no_type_correction {
        config.enable_type_correction = false;
    }
    if args.no_category_standardization {
        config.standardize_categories = false;
    }
    if args.no_outliers {
        config.remove_outliers = false;
    }

    config.validate()?;
    Ok(config)
}

fn build_pipeline(args: &Args, config: CleaningConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Print the original dataset preview.
///
/// Uses `println!` because this is the requested output, not a log line.
fn print_preview(args: &Args, data: &DataFrame) {
    println!("\n{}", "=".repeat(80));
    println!("ORIGINAL DATASET PREVIEW");
    println!("{}\n", "=".repeat(80));
    println!("{}", data.head(Some(args.preview_rows)));
    println!();
    println!(
        "Original Shape: {} rows x {} columns",
        data.height(),
        data.width()
    );
    println!("{}", "=".repeat(80));
}

fn run_pipeline(pipeline: &Pipeline, args: &Args, data: DataFrame) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let original_shape = data.shape();

    match pipeline.process(data) {
        Ok(mut result) => handle_pipeline_output(pipeline, &mut result, original_shape, args),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Handle pipeline output based on CLI flags.
///
/// - Default: write the cleaned CSV and print the human-readable summary
/// - `--json`: write the cleaned CSV and print only the JSON report
/// - `--emit-report`: also write the JSON report to a file
fn handle_pipeline_output(
    pipeline: &Pipeline,
    result: &mut PipelineResult,
    original_shape: (usize, usize),
    args: &Args,
) -> Result<()> {
    let generator = ReportGenerator::new(PathBuf::from(&args.output), args.output_name.clone());
    let output_path = generator.write_dataset(&mut result.data)?;

    let document = ReportGenerator::build_document(
        &args.input,
        output_path.to_str(),
        pipeline.config(),
        result,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    if args.emit_report {
        let input_stem = extract_file_stem(&args.input);
        let report_path = generator.write_report_to_file(&document, &input_stem)?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(result, original_shape, &output_path, args);

    Ok(())
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

fn print_human_readable_summary(
    result: &PipelineResult,
    original_shape: (usize, usize),
    output_path: &Path,
    args: &Args,
) {
    let summary = &result.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        args.input, original_shape.0, original_shape.1
    );
    println!(
        "Output: {} ({} rows x {} columns)",
        output_path.display(),
        summary.rows_after,
        summary.columns_after
    );
    println!("Duration: {}ms", summary.duration_ms);
    println!();

    println!("{}", render_summary(&result.report, summary));
    println!();

    if !args.emit_report {
        println!("Use --emit-report to save a detailed JSON report");
    }
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
