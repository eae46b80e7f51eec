//! Aggregation module - derived tables for the chart views

mod engine;
mod pivot;

pub use engine::{AggError, Aggregator, MONTH_YEAR};
pub use pivot::{PivotTable, MONTH_NAMES};
