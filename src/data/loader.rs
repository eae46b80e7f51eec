//! Data Loader Module
//! Handles CSV/text/Excel ingestion into a SalesFrame using Polars and calamine.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

use super::frame::{FrameError, SalesFrame, ORDER_DATE, REQUIRED_COLUMNS};

/// Fallback dataset loaded when no upload is provided.
pub const DEFAULT_DATASET: &str = "super.xls";

/// Date layouts accepted in the Order Date column, tried in order.
/// Month-first is preferred to match pandas' default inference.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Workbook has no sheets")]
    EmptyWorkbook,
    #[error("Unsupported file extension: '{0}'")]
    UnknownFormat(String),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Row {row}: invalid date '{value}' in column '{column}'")]
    InvalidDate {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Default dataset not found at {0}")]
    MissingResource(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Declared or extension-inferred input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma-separated text.
    Csv,
    /// Plain text; separator sniffed from the header line (tab or comma).
    Text,
    /// Excel binary (.xls, .xlsx).
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::Text),
            "xls" | "xlsx" | "xlsm" | "xlsb" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

/// Handles dataset ingestion. All failures here are fatal to the session:
/// a dataset either loads completely with every date parsed, or not at all.
pub struct DataLoader;

impl DataLoader {
    /// Parse uploaded bytes under the given format.
    pub fn load_bytes(bytes: &[u8], format: SourceFormat) -> Result<SalesFrame, LoaderError> {
        let df = match format {
            SourceFormat::Csv => Self::read_delimited(bytes, b',')?,
            SourceFormat::Text => {
                let sep = Self::sniff_separator(bytes);
                Self::read_delimited(bytes, sep)?
            }
            SourceFormat::Spreadsheet => Self::read_workbook(bytes)?,
        };
        Self::finish(df)
    }

    /// Load a dataset from disk, inferring the format from the extension.
    pub fn load_path(path: &Path) -> Result<SalesFrame, LoaderError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let format = SourceFormat::from_extension(ext)
            .ok_or_else(|| LoaderError::UnknownFormat(ext.to_string()))?;
        let bytes = std::fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let frame = Self::load_bytes(&bytes, format)?;
        tracing::info!(path = %path.display(), rows = frame.height(), "loaded dataset");
        Ok(frame)
    }

    /// Load the fallback dataset shipped alongside the binary.
    pub fn load_default() -> Result<SalesFrame, LoaderError> {
        let path = Path::new(DEFAULT_DATASET);
        if !path.exists() {
            return Err(LoaderError::MissingResource(path.to_path_buf()));
        }
        Self::load_path(path)
    }

    /// Load the given path, or the fallback dataset when none is provided.
    pub fn load_or_default(path: Option<&Path>) -> Result<SalesFrame, LoaderError> {
        match path {
            Some(p) => Self::load_path(p),
            None => Self::load_default(),
        }
    }

    fn sniff_separator(bytes: &[u8]) -> u8 {
        let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
        if header.contains(&b'\t') {
            b'\t'
        } else {
            b','
        }
    }

    fn read_delimited(bytes: &[u8], separator: u8) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .with_parse_options(CsvParseOptions::default().with_separator(separator))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Ok(df)
    }

    fn read_workbook(bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(LoaderError::EmptyWorkbook)??;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or(LoaderError::EmptyWorkbook)?
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let body: Vec<&[Data]> = rows.collect();
        let mut columns = Vec::with_capacity(headers.len());
        for (idx, name) in headers.iter().enumerate() {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                .collect();
            columns.push(Self::column_from_cells(name, &cells));
        }

        let df = DataFrame::new(columns)?;
        Ok(df)
    }

    /// Build a typed column: numeric if every non-empty cell is numeric,
    /// otherwise strings (workbook dates are rendered as ISO dates).
    fn column_from_cells(name: &str, cells: &[&Data]) -> Column {
        let mut any_value = false;
        let mut all_numeric = true;
        for cell in cells {
            match cell {
                Data::Empty => {}
                Data::Int(_) | Data::Float(_) => any_value = true,
                _ => {
                    any_value = true;
                    all_numeric = false;
                }
            }
        }

        if any_value && all_numeric {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            return Column::new(name.into(), values);
        }

        let values: Vec<Option<String>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Empty => None,
                Data::String(s) => Some(s.clone()),
                Data::DateTime(dt) => Some(
                    dt.as_datetime()
                        .map(|ts| ts.date().format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| cell.to_string()),
                ),
                other => Some(other.to_string()),
            })
            .collect();
        Column::new(name.into(), values)
    }

    /// Validate the schema, parse the date column, and normalize it to ISO.
    fn finish(mut df: DataFrame) -> Result<SalesFrame, LoaderError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        for required in REQUIRED_COLUMNS {
            if !names.iter().any(|n| n == required) {
                return Err(LoaderError::MissingColumn(required.to_string()));
            }
        }

        let series = df.column(ORDER_DATE).map_err(FrameError::from)?;
        let mut dates = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let val = series.get(i).map_err(FrameError::from)?;
            if val.is_null() {
                return Err(LoaderError::InvalidDate {
                    row: i,
                    column: ORDER_DATE.to_string(),
                    value: String::new(),
                });
            }
            let raw = val.to_string().trim_matches('"').to_string();
            let date = parse_order_date(&raw).ok_or_else(|| LoaderError::InvalidDate {
                row: i,
                column: ORDER_DATE.to_string(),
                value: raw.clone(),
            })?;
            dates.push(date);
        }

        let iso: Vec<String> = dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect();
        df.replace(ORDER_DATE, Series::new(ORDER_DATE.into(), iso))?;

        Ok(SalesFrame::new(df, dates)?)
    }
}

/// Parse one Order Date cell; timestamps keep only their date part.
fn parse_order_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().split_whitespace().next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
}
