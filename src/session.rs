//! Dashboard Session Module
//! One immutable base table per session; every interaction re-runs the full
//! pipeline from that table down to all derived views.

use std::path::Path;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agg::{AggError, Aggregator, PivotTable};
use crate::data::{
    CascadingFilter, DataLoader, DateRange, FilterError, FilterSelection, LoaderError, SalesFrame,
};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Failed to load dataset: {0}")]
    Load(#[from] LoaderError),
    #[error("Failed to apply filters: {0}")]
    Filter(#[from] FilterError),
    #[error("Failed to aggregate: {0}")]
    Aggregate(#[from] AggError),
}

/// Filter inputs for one render cycle. A missing date range means "use the
/// observed min/max of the base table".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderRequest {
    pub date_range: Option<DateRange>,
    pub selection: FilterSelection,
}

/// Everything one render cycle hands to the presentation layer: the
/// narrowed frames, the candidate filter options, and the derived tables.
#[derive(Debug, Clone)]
pub struct Dashboard {
    /// Base table narrowed by the date range only; source of Data.csv.
    pub date_filtered: SalesFrame,
    /// Fully filtered table feeding every aggregate below.
    pub filtered: SalesFrame,
    pub region_options: Vec<String>,
    pub state_options: Vec<String>,
    pub city_options: Vec<String>,
    pub category_sales: DataFrame,
    pub region_sales: DataFrame,
    pub segment_sales: DataFrame,
    pub monthly_sales: DataFrame,
    pub treemap: DataFrame,
    pub pivot: PivotTable,
    pub scatter: DataFrame,
    pub sample_preview: DataFrame,
}

/// Session-scoped state: the dataset loaded once per upload and treated as
/// read-only afterwards. Rendering never mutates it.
pub struct DashboardSession {
    base: SalesFrame,
}

impl DashboardSession {
    pub fn new(base: SalesFrame) -> Self {
        Self { base }
    }

    /// Load a dataset (or the fallback resource) and start a session.
    pub fn open(path: Option<&Path>) -> Result<Self, DashboardError> {
        Ok(Self::new(DataLoader::load_or_default(path)?))
    }

    pub fn base(&self) -> &SalesFrame {
        &self.base
    }

    /// Default date bounds offered to the user.
    pub fn default_date_range(&self) -> Option<DateRange> {
        DateRange::observed(&self.base)
    }

    /// One full synchronous recomputation pass: date filter, cascading
    /// categorical filter, then every derived view.
    pub fn render(&self, request: &RenderRequest) -> Result<Dashboard, DashboardError> {
        let range = request.date_range.or_else(|| self.default_date_range());
        let date_filtered = match range {
            Some(range) => range.apply(&self.base)?,
            None => self.base.clone(),
        };

        let cascade = CascadingFilter::apply(&date_filtered, &request.selection)?;
        let filtered = cascade.frame;

        let dashboard = Dashboard {
            category_sales: Aggregator::category_sales(&filtered)?,
            region_sales: Aggregator::region_sales(&filtered)?,
            segment_sales: Aggregator::segment_sales(&filtered)?,
            monthly_sales: Aggregator::monthly_sales(&filtered)?,
            treemap: Aggregator::treemap_hierarchy(&filtered)?,
            pivot: Aggregator::monthly_subcategory_pivot(&filtered)?,
            scatter: Aggregator::scatter_projection(&filtered)?,
            sample_preview: Aggregator::sample_preview(&self.base)?,
            region_options: cascade.region_options,
            state_options: cascade.state_options,
            city_options: cascade.city_options,
            date_filtered,
            filtered,
        };

        tracing::info!(
            base_rows = self.base.height(),
            filtered_rows = dashboard.filtered.height(),
            "render cycle complete"
        );
        Ok(dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataLoader, SourceFormat};
    use chrono::NaiveDate;

    fn session() -> DashboardSession {
        let csv = "\
Order Date,Region,State,City,Category,Sub-Category,Sales,Profit,Quantity,Segment
2023-01-05,East,New York,Buffalo,Furniture,Chairs,100.0,20.0,2,Consumer
2023-06-10,West,California,Fresno,Technology,Phones,50.0,5.0,1,Corporate
2023-12-15,East,Ohio,Columbus,Furniture,Tables,25.0,2.0,1,Consumer
";
        let base = DataLoader::load_bytes(csv.as_bytes(), SourceFormat::Csv).unwrap();
        DashboardSession::new(base)
    }

    #[test]
    fn default_render_covers_the_whole_table() {
        let session = session();
        let dashboard = session.render(&RenderRequest::default()).unwrap();
        assert_eq!(dashboard.filtered.height(), 3);
        assert_eq!(dashboard.date_filtered.height(), 3);
        assert_eq!(dashboard.region_options, vec!["East", "West"]);
    }

    #[test]
    fn date_range_narrows_before_the_cascade() {
        let session = session();
        let request = RenderRequest {
            date_range: Some(
                DateRange::new(
                    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
                )
                .unwrap(),
            ),
            selection: FilterSelection::default(),
        };
        let dashboard = session.render(&request).unwrap();
        assert_eq!(dashboard.date_filtered.height(), 2);
        // Columbus falls outside the range, so it is not offered.
        assert_eq!(dashboard.city_options, vec!["Buffalo", "Fresno"]);
    }

    #[test]
    fn sample_preview_ignores_filters() {
        let session = session();
        let mut request = RenderRequest::default();
        request.selection.region.insert("Nowhere".to_string());
        let dashboard = session.render(&request).unwrap();
        assert!(dashboard.filtered.is_empty());
        assert_eq!(dashboard.sample_preview.height(), 3);
    }

    #[test]
    fn rendering_does_not_mutate_the_base() {
        let session = session();
        let mut request = RenderRequest::default();
        request.selection.region.insert("East".to_string());
        session.render(&request).unwrap();
        assert_eq!(session.base().height(), 3);
    }
}
