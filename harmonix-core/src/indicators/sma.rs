//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window of closes or median prices.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;
use crate::domain::Bar;

/// Which bar price an average is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Close,
    /// (high + low) / 2.
    Median,
}

impl PriceSource {
    pub fn of(&self, bar: &Bar) -> f64 {
        match self {
            PriceSource::Close => bar.close,
            PriceSource::Median => bar.median(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    source: PriceSource,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self::of(period, PriceSource::Close)
    }

    pub fn of(period: usize, source: PriceSource) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        let name = match source {
            PriceSource::Close => format!("sma_{period}"),
            PriceSource::Median => format!("sma_median_{period}"),
        };
        Self {
            period,
            source,
            name,
        }
    }
}

/// Rolling mean of `values`; a NaN anywhere in a window yields NaN for it.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            nan_count += 1;
        } else {
            sum += v;
        }
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }
        if i + 1 >= period && nan_count == 0 {
            result[i] = sum / period as f64;
        }
    }
    result
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let prices: Vec<f64> = bars.iter().map(|b| self.source.of(b)).collect();
        rolling_mean(&prices, self.period)
    }
}
