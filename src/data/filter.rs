//! Filter Module
//! Date-range restriction and the Region -> State -> City cascading filter.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::frame::{FrameError, SalesFrame, CITY, REGION, STATE};

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Inclusive closed date interval. Construction rejects inverted ranges
/// rather than silently swapping the bounds; deserialization goes through
/// the same check, so an inverted range cannot arrive via JSON either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// Wire form of a date range, validated on conversion.
#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = FilterError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FilterError> {
        if start > end {
            return Err(FilterError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// The observed min/max of the frame's date column; the default bounds
    /// offered to the user. None for an empty frame.
    pub fn observed(frame: &SalesFrame) -> Option<Self> {
        let start = *frame.dates().iter().min()?;
        let end = *frame.dates().iter().max()?;
        Some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Keep rows whose order date falls within the interval, both ends
    /// inclusive.
    pub fn apply(&self, frame: &SalesFrame) -> Result<SalesFrame, FilterError> {
        let keep: Vec<bool> = frame.dates().iter().map(|d| self.contains(*d)).collect();
        let out = frame.retain(&keep)?;
        tracing::debug!(rows_in = frame.height(), rows_out = out.height(), "date filter");
        Ok(out)
    }
}

/// Per-dimension selections. An empty set means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub region: BTreeSet<String>,
    pub state: BTreeSet<String>,
    pub city: BTreeSet<String>,
}

impl FilterSelection {
    pub fn is_empty(&self) -> bool {
        self.region.is_empty() && self.state.is_empty() && self.city.is_empty()
    }
}

/// Result of one cascade pass: the narrowed frame plus the candidate value
/// lists to offer for each dimension on the next interaction.
#[derive(Debug, Clone)]
pub struct CascadeOutput {
    pub frame: SalesFrame,
    pub region_options: Vec<String>,
    pub state_options: Vec<String>,
    pub city_options: Vec<String>,
}

/// Applies the three dependent categorical stages in fixed order. Each
/// stage's candidate values come from the previous stage's output, so a
/// Region pick narrows the States offered, which narrows the Cities.
pub struct CascadingFilter;

impl CascadingFilter {
    pub fn apply(
        frame: &SalesFrame,
        selection: &FilterSelection,
    ) -> Result<CascadeOutput, FilterError> {
        let region_options = frame.distinct_in_order(REGION)?;
        let after_region = Self::stage(frame, REGION, &selection.region)?;

        let state_options = after_region.distinct_in_order(STATE)?;
        let after_state = Self::stage(&after_region, STATE, &selection.state)?;

        let city_options = after_state.distinct_in_order(CITY)?;
        let narrowed = Self::stage(&after_state, CITY, &selection.city)?;

        tracing::debug!(
            rows_in = frame.height(),
            rows_out = narrowed.height(),
            "cascading filter"
        );

        Ok(CascadeOutput {
            frame: narrowed,
            region_options,
            state_options,
            city_options,
        })
    }

    fn stage(
        frame: &SalesFrame,
        column: &str,
        picked: &BTreeSet<String>,
    ) -> Result<SalesFrame, FilterError> {
        if picked.is_empty() {
            return Ok(frame.clone());
        }
        let keep: Vec<bool> = frame
            .str_values(column)?
            .iter()
            .map(|v| picked.contains(v))
            .collect();
        Ok(frame.retain(&keep)?)
    }
}
