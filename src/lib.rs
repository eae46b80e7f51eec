//! Storeboard - SuperStore Sales Dashboard Pipeline
//!
//! The recomputation pipeline behind an interactive sales dashboard:
//! ingestion, date-range and cascading categorical filters, groupby-sum
//! aggregation into chart-ready tables, and CSV export. The widget and
//! chart layers are external consumers of the `Dashboard` this crate
//! produces on every render cycle.

pub mod agg;
pub mod data;
pub mod export;
pub mod session;

pub use agg::{AggError, Aggregator, PivotTable};
pub use data::{
    CascadingFilter, DataLoader, DateRange, FilterError, FilterSelection, LoaderError, SalesFrame,
    SourceFormat,
};
pub use export::{Artifact, ExportSerializer, CSV_MIME};
pub use session::{Dashboard, DashboardError, DashboardSession, RenderRequest};
