//! Aggregation Engine Module
//! Pure groupby-sum transformations feeding the chart views.

use std::collections::BTreeMap;

use chrono::Datelike;
use polars::prelude::*;
use thiserror::Error;

use super::pivot::{PivotTable, MONTH_NAMES};
use crate::data::{
    FrameError, SalesFrame, CATEGORY, CITY, PROFIT, QUANTITY, REGION, SALES, SEGMENT, STATE,
    SUB_CATEGORY,
};

/// Label column of the monthly time series.
pub const MONTH_YEAR: &str = "month_year";

const MONTH_ABBREV: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Error, Debug)]
pub enum AggError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// A family of pure functions from the filtered frame to one derived table
/// each. An empty input yields an empty output, never an error.
pub struct Aggregator;

impl Aggregator {
    /// Group by one categorical key and sum Sales; keys sorted.
    pub fn sum_by(frame: &SalesFrame, key: &str) -> Result<DataFrame, AggError> {
        let keys = frame.str_values(key)?;
        let sales = frame.numeric_values(SALES)?;

        let mut sums: BTreeMap<String, f64> = BTreeMap::new();
        for (k, v) in keys.into_iter().zip(sales) {
            // Null sales contribute nothing but still register the group,
            // so an all-null group sums to 0.0 rather than disappearing.
            let entry = sums.entry(k).or_insert(0.0);
            if !v.is_nan() {
                *entry += v;
            }
        }

        let (out_keys, out_sums): (Vec<String>, Vec<f64>) = sums.into_iter().unzip();
        let df = DataFrame::new(vec![
            Column::new(key.into(), out_keys),
            Column::new(SALES.into(), out_sums),
        ])?;
        Ok(df)
    }

    pub fn category_sales(frame: &SalesFrame) -> Result<DataFrame, AggError> {
        Self::sum_by(frame, CATEGORY)
    }

    pub fn region_sales(frame: &SalesFrame) -> Result<DataFrame, AggError> {
        Self::sum_by(frame, REGION)
    }

    pub fn segment_sales(frame: &SalesFrame) -> Result<DataFrame, AggError> {
        Self::sum_by(frame, SEGMENT)
    }

    /// Monthly Sales totals in chronological order. Buckets are keyed by
    /// (year, month) so "2023-Dec" precedes "2024-Jan" even though the
    /// labels would not sort that way as strings.
    pub fn monthly_sales(frame: &SalesFrame) -> Result<DataFrame, AggError> {
        let sales = frame.numeric_values(SALES)?;

        let mut sums: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for (date, v) in frame.dates().iter().zip(sales) {
            let entry = sums.entry((date.year(), date.month())).or_insert(0.0);
            if !v.is_nan() {
                *entry += v;
            }
        }

        let mut labels = Vec::with_capacity(sums.len());
        let mut totals = Vec::with_capacity(sums.len());
        for ((year, month), total) in sums {
            labels.push(format!("{}-{}", year, MONTH_ABBREV[(month - 1) as usize]));
            totals.push(total);
        }

        let df = DataFrame::new(vec![
            Column::new(MONTH_YEAR.into(), labels),
            Column::new(SALES.into(), totals),
        ])?;
        Ok(df)
    }

    /// Sales summed over the (Region, Category, Sub-Category) hierarchy,
    /// path columns retained for treemap rendering.
    pub fn treemap_hierarchy(frame: &SalesFrame) -> Result<DataFrame, AggError> {
        let regions = frame.str_values(REGION)?;
        let categories = frame.str_values(CATEGORY)?;
        let sub_categories = frame.str_values(SUB_CATEGORY)?;
        let sales = frame.numeric_values(SALES)?;

        let mut sums: BTreeMap<(String, String, String), f64> = BTreeMap::new();
        for (((r, c), s), v) in regions
            .into_iter()
            .zip(categories)
            .zip(sub_categories)
            .zip(sales)
        {
            let entry = sums.entry((r, c, s)).or_insert(0.0);
            if !v.is_nan() {
                *entry += v;
            }
        }

        let mut regions = Vec::with_capacity(sums.len());
        let mut categories = Vec::with_capacity(sums.len());
        let mut sub_categories = Vec::with_capacity(sums.len());
        let mut totals = Vec::with_capacity(sums.len());
        for ((r, c, s), total) in sums {
            regions.push(r);
            categories.push(c);
            sub_categories.push(s);
            totals.push(total);
        }

        let df = DataFrame::new(vec![
            Column::new(REGION.into(), regions),
            Column::new(CATEGORY.into(), categories),
            Column::new(SUB_CATEGORY.into(), sub_categories),
            Column::new(SALES.into(), totals),
        ])?;
        Ok(df)
    }

    /// Sparse Sub-Category x month-name pivot of summed Sales. Columns are
    /// the months actually observed, in calendar order.
    pub fn monthly_subcategory_pivot(frame: &SalesFrame) -> Result<PivotTable, AggError> {
        let sub_categories = frame.str_values(SUB_CATEGORY)?;
        let sales = frame.numeric_values(SALES)?;

        let mut cells: BTreeMap<(String, String), f64> = BTreeMap::new();
        let mut months_seen = [false; 12];
        let mut row_keys: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();

        for ((sub, date), v) in sub_categories.into_iter().zip(frame.dates()).zip(sales) {
            if v.is_nan() {
                continue;
            }
            let month_idx = (date.month() - 1) as usize;
            months_seen[month_idx] = true;
            row_keys.insert(sub.clone());
            *cells
                .entry((sub, MONTH_NAMES[month_idx].to_string()))
                .or_insert(0.0) += v;
        }

        let rows: Vec<String> = row_keys.into_iter().collect();
        let columns: Vec<String> = MONTH_NAMES
            .iter()
            .enumerate()
            .filter(|(i, _)| months_seen[*i])
            .map(|(_, name)| name.to_string())
            .collect();

        Ok(PivotTable::new(rows, columns, cells))
    }

    /// Row-level (Sales, Profit, Quantity) projection for the scatter plot.
    pub fn scatter_projection(frame: &SalesFrame) -> Result<DataFrame, AggError> {
        let df = frame
            .data()
            .clone()
            .lazy()
            .select([col(SALES), col(PROFIT), col(QUANTITY)])
            .collect()?;
        Ok(df)
    }

    /// First five rows of the display columns, taken from the unfiltered
    /// base table. Every other view reads the filtered frame; this one
    /// deliberately does not.
    pub fn sample_preview(base: &SalesFrame) -> Result<DataFrame, AggError> {
        let df = base
            .data()
            .select([REGION, STATE, CITY, CATEGORY, SALES, PROFIT, QUANTITY])?
            .head(Some(5));
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataLoader, FilterSelection, SourceFormat};

    fn load(csv: &str) -> SalesFrame {
        DataLoader::load_bytes(csv.as_bytes(), SourceFormat::Csv).unwrap()
    }

    fn sample() -> SalesFrame {
        load(
            "\
Order Date,Region,State,City,Category,Sub-Category,Sales,Profit,Quantity,Segment
2023-01-05,East,New York,Buffalo,Furniture,Chairs,100.0,20.0,2,Consumer
2023-12-10,West,California,Fresno,Technology,Phones,50.0,5.0,1,Corporate
2024-01-15,East,Ohio,Columbus,Furniture,Tables,25.0,2.0,1,Consumer
",
        )
    }

    fn column_f64(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    fn column_str(df: &DataFrame, name: &str) -> Vec<String> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap().to_string())
            .collect()
    }

    #[test]
    fn region_sums_match_scenario() {
        let frame = load(
            "\
Order Date,Region,State,City,Category,Sub-Category,Sales,Profit,Quantity,Segment
2023-01-05,East,A,B,C,D,100.0,0.0,1,S
2023-01-06,West,A,B,C,D,50.0,0.0,1,S
2023-01-07,East,A,B,C,D,25.0,0.0,1,S
",
        );
        let df = Aggregator::region_sales(&frame).unwrap();
        assert_eq!(column_str(&df, REGION), vec!["East", "West"]);
        assert_eq!(column_f64(&df, SALES), vec![125.0, 50.0]);
    }

    #[test]
    fn all_null_sales_group_sums_to_zero() {
        let frame = load(
            "\
Order Date,Region,State,City,Category,Sub-Category,Sales,Profit,Quantity,Segment
2023-01-05,East,A,B,C,D,100.0,0.0,1,S
2023-01-06,South,A,B,C,D,,0.0,1,S
",
        );
        let df = Aggregator::region_sales(&frame).unwrap();
        assert_eq!(column_str(&df, REGION), vec!["East", "South"]);
        assert_eq!(column_f64(&df, SALES), vec![100.0, 0.0]);
    }

    #[test]
    fn group_sums_partition_total_sales() {
        let frame = sample();
        let total: f64 = frame
            .numeric_values(SALES)
            .unwrap()
            .iter()
            .filter(|v| !v.is_nan())
            .sum();
        let df = Aggregator::category_sales(&frame).unwrap();
        let grouped: f64 = column_f64(&df, SALES).iter().sum();
        assert!((grouped - total).abs() < 1e-9);
    }

    #[test]
    fn monthly_totals_are_chronological_across_years() {
        let frame = sample();
        let df = Aggregator::monthly_sales(&frame).unwrap();
        // Lexical order would put 2023-Dec after 2023-Jan and 2024-Jan first.
        assert_eq!(
            column_str(&df, MONTH_YEAR),
            vec!["2023-Jan", "2023-Dec", "2024-Jan"]
        );
        assert_eq!(column_f64(&df, SALES), vec![100.0, 50.0, 25.0]);
    }

    #[test]
    fn treemap_keeps_hierarchy_path() {
        let frame = sample();
        let df = Aggregator::treemap_hierarchy(&frame).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(
            df.get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>(),
            vec![REGION, CATEGORY, SUB_CATEGORY, SALES]
        );
    }

    #[test]
    fn pivot_columns_are_calendar_ordered_and_sparse() {
        let frame = sample();
        let pivot = Aggregator::monthly_subcategory_pivot(&frame).unwrap();
        assert_eq!(pivot.columns(), &["January", "December"]);
        assert_eq!(pivot.value("Chairs", "January"), Some(100.0));
        assert_eq!(pivot.value("Chairs", "December"), None);
        assert_eq!(pivot.value("Phones", "December"), Some(50.0));
    }

    #[test]
    fn scatter_is_row_level() {
        let frame = sample();
        let df = Aggregator::scatter_projection(&frame).unwrap();
        assert_eq!(df.height(), frame.height());
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn sample_preview_caps_at_five_rows() {
        let frame = sample();
        let df = Aggregator::sample_preview(&frame).unwrap();
        assert_eq!(df.height(), 3.min(5));
        assert_eq!(df.width(), 7);
    }

    #[test]
    fn empty_frame_yields_empty_views() {
        let frame = sample();
        let mut selection = FilterSelection::default();
        selection.region.insert("South".to_string());
        let empty = crate::data::CascadingFilter::apply(&frame, &selection)
            .unwrap()
            .frame;
        assert!(empty.is_empty());

        assert_eq!(Aggregator::category_sales(&empty).unwrap().height(), 0);
        assert_eq!(Aggregator::monthly_sales(&empty).unwrap().height(), 0);
        assert_eq!(Aggregator::treemap_hierarchy(&empty).unwrap().height(), 0);
        assert!(Aggregator::monthly_subcategory_pivot(&empty)
            .unwrap()
            .is_empty());
        assert_eq!(Aggregator::scatter_projection(&empty).unwrap().height(), 0);
    }
}
