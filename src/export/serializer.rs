//! Export Serializer Module
//! Deterministic CSV rendering of derived tables and the fixed download set.

use polars::prelude::*;
use thiserror::Error;

use crate::session::Dashboard;

/// MIME type attached to every downloadable artifact.
pub const CSV_MIME: &str = "text/csv";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to serialize CSV: {0}")]
    Csv(#[from] PolarsError),
}

/// One downloadable file: fixed name, MIME type, and the rendered bytes.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    fn csv(file_name: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            mime: CSV_MIME,
            bytes,
        }
    }
}

/// Renders any table to CSV bytes: header row in column order, one line per
/// row, no index column. Same table in, same bytes out.
pub struct ExportSerializer;

impl ExportSerializer {
    pub fn to_csv(df: &DataFrame) -> Result<Vec<u8>, ExportError> {
        let mut buf = Vec::new();
        let mut df = df.clone();
        CsvWriter::new(&mut buf)
            .include_header(true)
            .finish(&mut df)?;
        Ok(buf)
    }

    pub fn category(dashboard: &Dashboard) -> Result<Artifact, ExportError> {
        Ok(Artifact::csv(
            "Category.csv",
            Self::to_csv(&dashboard.category_sales)?,
        ))
    }

    pub fn region(dashboard: &Dashboard) -> Result<Artifact, ExportError> {
        Ok(Artifact::csv(
            "Region.csv",
            Self::to_csv(&dashboard.region_sales)?,
        ))
    }

    pub fn time_series(dashboard: &Dashboard) -> Result<Artifact, ExportError> {
        Ok(Artifact::csv(
            "TimeSeries.csv",
            Self::to_csv(&dashboard.monthly_sales)?,
        ))
    }

    /// The date-filtered dataset, before the cascading filter. This mirrors
    /// the dashboard's "download original dataset" action.
    pub fn dataset(dashboard: &Dashboard) -> Result<Artifact, ExportError> {
        Ok(Artifact::csv(
            "Data.csv",
            Self::to_csv(dashboard.date_filtered.data())?,
        ))
    }

    /// All four downloadable artifacts of one render cycle.
    pub fn all(dashboard: &Dashboard) -> Result<Vec<Artifact>, ExportError> {
        Ok(vec![
            Self::category(dashboard)?,
            Self::region(dashboard)?,
            Self::time_series(dashboard)?,
            Self::dataset(dashboard)?,
        ])
    }
}
