//! Bar series — the read-only data source the detector is driven from.

use chrono::{DateTime, Utc};

use crate::domain::{Bar, Timeframe};
use crate::error::BarError;

/// Time-ordered bars of a single instrument and timeframe.
///
/// Random access by index and by open time. Bars are only ever appended; the
/// detector never mutates history.
#[derive(Debug, Clone)]
pub struct BarSeries {
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            bars: Vec::new(),
        }
    }

    /// Build a series from already-loaded bars, validating order and OHLC sanity.
    pub fn from_bars(timeframe: Timeframe, bars: Vec<Bar>) -> Result<Self, BarError> {
        let mut series = Self::new(timeframe);
        series.bars.reserve(bars.len());
        for bar in bars {
            series.push(bar)?;
        }
        Ok(series)
    }

    /// Append a newly closed bar.
    pub fn push(&mut self, bar: Bar) -> Result<(), BarError> {
        let index = self.bars.len();
        if !bar.is_sane() {
            return Err(BarError::InsaneBar { index });
        }
        if let Some(last) = self.bars.last() {
            if bar.open_time <= last.open_time {
                return Err(BarError::NonMonotonicTime {
                    index,
                    previous: last.open_time,
                    current: bar.open_time,
                });
            }
        }
        self.bars.push(bar);
        Ok(())
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn close(&self, index: usize) -> Option<f64> {
        self.bars.get(index).map(|b| b.close)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn last_index(&self) -> Option<usize> {
        self.bars.len().checked_sub(1)
    }

    /// Index of the bar opening exactly at `time`.
    pub fn index_by_time(&self, time: DateTime<Utc>) -> Option<usize> {
        self.bars.binary_search_by(|b| b.open_time.cmp(&time)).ok()
    }

    /// Index of the last bar opening at or before `time`.
    pub fn index_at_or_before(&self, time: DateTime<Utc>) -> Option<usize> {
        match self.bars.binary_search_by(|b| b.open_time.cmp(&time)) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }

    /// A prefix view of the first `len` bars, used for replay and look-ahead tests.
    pub fn truncated(&self, len: usize) -> Self {
        Self {
            timeframe: self.timeframe,
            bars: self.bars[..len.min(self.bars.len())].to_vec(),
        }
    }
}
