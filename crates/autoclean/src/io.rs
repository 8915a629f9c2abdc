//! CSV loading and export.
//!
//! Input bytes are decoded with an explicit [`TextEncoding`] before polars
//! sees them, so encoding problems surface as [`CleaningError::InvalidEncoding`]
//! rather than as parse failures further down.

use crate::error::{CleaningError, Result};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Text encodings the loader can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// Strict UTF-8; a leading byte-order mark is ignored.
    #[default]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin1",
        }
    }

    /// Decode raw bytes into text.
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                std::str::from_utf8(bytes)
                    .map(|s| s.to_string())
                    .map_err(|e| CleaningError::InvalidEncoding {
                        encoding: self.as_str().to_string(),
                        reason: format!("invalid byte sequence at offset {}", e.valid_up_to()),
                    })
            }
            Self::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextEncoding {
    type Err = CleaningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Self::Latin1),
            _ => Err(CleaningError::UnsupportedEncoding(s.to_string())),
        }
    }
}

/// Load a CSV file.
pub fn load_csv(path: impl AsRef<Path>, encoding: TextEncoding) -> Result<DataFrame> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        CleaningError::Io(e).with_context(format!("Failed to read {}", path.display()))
    })?;
    let df = parse_csv(&bytes, encoding)?;
    info!(
        "Loaded {} ({} rows x {} columns, {})",
        path.display(),
        df.height(),
        df.width(),
        encoding
    );
    Ok(df)
}

/// Parse CSV bytes with a header row.
///
/// The schema is inferred from the whole input and empty fields read as
/// nulls. An input with no data rows is rejected.
pub fn parse_csv(bytes: &[u8], encoding: TextEncoding) -> Result<DataFrame> {
    let text = encoding.decode(bytes)?;
    if text.trim().is_empty() {
        return Err(CleaningError::EmptyDataset(
            "input has no header row".to_string(),
        ));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()
        .map_err(|e| CleaningError::MalformedInput(e.to_string()))?;

    if df.height() == 0 {
        return Err(CleaningError::EmptyDataset(format!(
            "input has a header with {} columns but no rows",
            df.width()
        )));
    }

    debug!("Parsed CSV: {:?}", df.shape());
    Ok(df)
}

/// Write `df` as CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;
    info!("Dataset saved: {}", path.display());
    Ok(())
}

/// Render `df` as CSV text with a header row.
pub fn to_csv_string(df: &mut DataFrame) -> Result<String> {
    let mut buffer: Vec<u8> = Vec::new();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;
    String::from_utf8(buffer).map_err(|e| CleaningError::Internal(e.to_string()))
}
