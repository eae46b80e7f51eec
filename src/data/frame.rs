//! Sales Frame Module
//! Immutable table wrapper: a Polars DataFrame plus the parsed Order Date column.

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

/// Date column driving the time filters and temporal aggregates.
pub const ORDER_DATE: &str = "Order Date";
pub const REGION: &str = "Region";
pub const STATE: &str = "State";
pub const CITY: &str = "City";
pub const CATEGORY: &str = "Category";
pub const SUB_CATEGORY: &str = "Sub-Category";
pub const SALES: &str = "Sales";
pub const PROFIT: &str = "Profit";
pub const QUANTITY: &str = "Quantity";
pub const SEGMENT: &str = "Segment";

/// Columns every dataset must carry; loading fails if any is absent.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    ORDER_DATE,
    REGION,
    STATE,
    CITY,
    CATEGORY,
    SUB_CATEGORY,
    SALES,
    PROFIT,
    QUANTITY,
    SEGMENT,
];

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Length {len} does not match row count {rows}")]
    LengthMismatch { rows: usize, len: usize },
}

/// A loaded sales table. Filters never mutate in place; they return a new
/// frame with the date vector narrowed in lockstep with the rows.
#[derive(Debug, Clone)]
pub struct SalesFrame {
    df: DataFrame,
    dates: Vec<NaiveDate>,
}

impl SalesFrame {
    pub fn new(df: DataFrame, dates: Vec<NaiveDate>) -> Result<Self, FrameError> {
        if df.height() != dates.len() {
            return Err(FrameError::LengthMismatch {
                rows: df.height(),
                len: dates.len(),
            });
        }
        Ok(Self { df, dates })
    }

    pub fn data(&self) -> &DataFrame {
        &self.df
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Keep only rows where `keep` is true. The mask must cover every row.
    pub fn retain(&self, keep: &[bool]) -> Result<Self, FrameError> {
        if keep.len() != self.df.height() {
            return Err(FrameError::LengthMismatch {
                rows: self.df.height(),
                len: keep.len(),
            });
        }
        let mask = BooleanChunked::from_slice("mask".into(), keep);
        let df = self.df.filter(&mask)?;
        let dates = self
            .dates
            .iter()
            .zip(keep)
            .filter(|(_, k)| **k)
            .map(|(d, _)| *d)
            .collect();
        Self::new(df, dates)
    }

    /// Materialize a column as row-order strings (nulls become empty strings).
    pub fn str_values(&self, column: &str) -> Result<Vec<String>, FrameError> {
        let series = self.df.column(column)?;
        let mut out = Vec::with_capacity(self.df.height());
        for i in 0..self.df.height() {
            let val = series.get(i)?;
            if val.is_null() {
                out.push(String::new());
            } else {
                out.push(val.to_string().trim_matches('"').to_string());
            }
        }
        Ok(out)
    }

    /// Materialize a column as f64 (nulls become NaN and are skipped by sums).
    pub fn numeric_values(&self, column: &str) -> Result<Vec<f64>, FrameError> {
        let series = self.df.column(column)?;
        let as_f64 = series.cast(&DataType::Float64)?;
        let ca = as_f64.f64()?;
        Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }

    /// Distinct values in first-seen row order.
    pub fn distinct_in_order(&self, column: &str) -> Result<Vec<String>, FrameError> {
        let values = self.str_values(column)?;
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for v in values {
            if seen.insert(v.clone()) {
                out.push(v);
            }
        }
        Ok(out)
    }
}
