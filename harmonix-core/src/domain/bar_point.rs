//! BarPoint — a price pinned to a specific bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Timeframe;
use crate::bars::BarSeries;

/// Immutable snapshot of a resolved pivot or signal level.
///
/// A pivot that "moves" is represented by building a new `BarPoint`; existing
/// points are never edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarPoint {
    pub price: f64,
    pub bar_index: usize,
    pub open_time: DateTime<Utc>,
    pub timeframe: Timeframe,
}

impl BarPoint {
    pub fn new(price: f64, bar_index: usize, open_time: DateTime<Utc>, timeframe: Timeframe) -> Self {
        Self {
            price,
            bar_index,
            open_time,
            timeframe,
        }
    }

    /// Point at `price` on bar `index` of `series`, `None` if the index is out of range.
    pub fn from_series(series: &BarSeries, index: usize, price: f64) -> Option<Self> {
        series
            .get(index)
            .map(|bar| Self::new(price, index, bar.open_time, series.timeframe()))
    }

    /// Same bar, different price.
    pub fn with_price(&self, price: f64) -> Self {
        Self { price, ..*self }
    }

    /// Same price moved to bar `index` of `series`.
    pub fn with_index(&self, series: &BarSeries, index: usize) -> Option<Self> {
        Self::from_series(series, index, self.price)
    }
}
