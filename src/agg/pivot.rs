//! Pivot Table Module
//! Sparse Sub-Category x month cross-tabulation of summed Sales.

use std::collections::BTreeMap;

use polars::prelude::*;

use crate::data::SUB_CATEGORY;

/// Month display names in calendar order.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Two-dimensional summary with possibly-missing cells. A cell is absent
/// when no order exists for that (Sub-Category, month) pair; absent is not
/// the same as a zero-sales month.
#[derive(Debug, Clone, Default)]
pub struct PivotTable {
    rows: Vec<String>,
    columns: Vec<String>,
    cells: BTreeMap<(String, String), f64>,
}

impl PivotTable {
    pub fn new(
        rows: Vec<String>,
        columns: Vec<String>,
        cells: BTreeMap<(String, String), f64>,
    ) -> Self {
        Self {
            rows,
            columns,
            cells,
        }
    }

    /// Row keys (sub-categories), sorted.
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Column keys (month names), in calendar order, months present only.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn value(&self, row: &str, column: &str) -> Option<f64> {
        self.cells
            .get(&(row.to_string(), column.to_string()))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a DataFrame for display or export; missing cells become
    /// nulls, which serialize as empty CSV fields.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(Column::new(SUB_CATEGORY.into(), self.rows.clone()));
        for month in &self.columns {
            let values: Vec<Option<f64>> = self
                .rows
                .iter()
                .map(|row| self.value(row, month))
                .collect();
            columns.push(Column::new(month.as_str().into(), values));
        }
        DataFrame::new(columns)
    }
}
