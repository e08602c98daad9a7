//! Indicator trait, precomputed values container, and the concrete indicators
//! the optional pattern filters read.
//!
//! Indicators are pure functions: bar history in, numeric series out. They are
//! precomputed once over the loaded series and queried per bar by the filters.

use std::collections::HashMap;

use crate::domain::Bar;

pub mod atr;
pub mod awesome;
pub mod sma;
pub mod supertrend;

pub use atr::Atr;
pub use awesome::AwesomeOscillator;
pub use sma::{PriceSource, Sma};
pub use supertrend::Supertrend;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values should be `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "ao_5_34").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Container for precomputed indicator values, queried by bar index.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Value at `bar_index`; `None` for unknown names or out-of-range indices.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Compute every indicator over `bars`. Duplicate names are computed once.
pub fn precompute_indicators(bars: &[Bar], indicators: &[Box<dyn Indicator>]) -> IndicatorValues {
    let mut iv = IndicatorValues::new();
    for indicator in indicators {
        if iv.contains(indicator.name()) {
            continue;
        }
        let series = indicator.compute(bars);
        debug_assert_eq!(
            series.len(),
            bars.len(),
            "indicator '{}' produced {} values for {} bars",
            indicator.name(),
            series.len(),
            bars.len(),
        );
        iv.insert(indicator.name(), series);
    }
    iv
}

/// Maximum lookback across a set of indicators.
pub fn compute_warmup(indicators: &[Box<dyn Indicator>]) -> usize {
    indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, hourly open times.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                open_time: base + Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// OHLC tuples to bars, hourly open times.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            open_time: base + Duration::hours(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_values_insert_and_get() {
        let mut iv = IndicatorValues::new();
        iv.insert("ao_5_34", vec![f64::NAN, -0.5, 0.25]);
        assert!(iv.get("ao_5_34", 0).unwrap().is_nan());
        assert_eq!(iv.get("ao_5_34", 2), Some(0.25));
        assert_eq!(iv.get("ao_5_34", 3), None);
        assert_eq!(iv.get("missing", 0), None);
    }

    #[test]
    fn precompute_deduplicates_names() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new(3)),
            Box::new(Sma::new(3)),
            Box::new(Atr::new(2)),
        ];
        let iv = precompute_indicators(&bars, &indicators);
        assert_eq!(iv.len(), 2);
        assert!((iv.get("sma_3", 2).unwrap() - 11.0).abs() < DEFAULT_EPSILON);
        assert_eq!(compute_warmup(&indicators), 2);
    }
}
