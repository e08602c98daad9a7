//! Bar — one closed OHLC candle of the instrument being scanned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument on a single timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
    }

    /// Body closes above the open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Body closes below the open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// (high + low) / 2, the input of the awesome oscillator.
    pub fn median(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}
