//! Data module - ingestion, the sales frame, and filtering

mod filter;
mod frame;
mod loader;

pub use filter::{CascadeOutput, CascadingFilter, DateRange, FilterError, FilterSelection};
pub use frame::{
    FrameError, SalesFrame, CATEGORY, CITY, ORDER_DATE, PROFIT, QUANTITY, REGION,
    REQUIRED_COLUMNS, SALES, SEGMENT, STATE, SUB_CATEGORY,
};
pub use loader::{DataLoader, LoaderError, SourceFormat, DEFAULT_DATASET};
