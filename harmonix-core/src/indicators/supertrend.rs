//! Supertrend — ATR-based directional indicator.
//!
//! Output: the active band value, the lower band (support) while trending up
//! and the upper band (resistance) while trending down. A close above the
//! output therefore means an up-trend.
//!
//! Lookback: period (same as ATR).

use super::atr::{true_range, wilder_smooth};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Supertrend {
    period: usize,
    multiplier: f64,
    name: String,
}

impl Supertrend {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Supertrend period must be >= 1");
        assert!(multiplier > 0.0, "Supertrend multiplier must be > 0");
        Self {
            period,
            multiplier,
            name: format!("supertrend_{period}_{multiplier}"),
        }
    }

    pub fn default_params() -> Self {
        Self::new(10, 3.0)
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        let atr = wilder_smooth(&true_range(bars), self.period);

        let Some(start) = atr.iter().position(|v| !v.is_nan()) else {
            return result;
        };

        let hl2 = bars[start].median();
        let mut upper = hl2 + self.multiplier * atr[start];
        let mut lower = hl2 - self.multiplier * atr[start];
        let mut trending_up = bars[start].close >= hl2;
        result[start] = if trending_up { lower } else { upper };

        for i in (start + 1)..n {
            if atr[i].is_nan() || bars[i].is_void() {
                continue;
            }

            let hl2 = bars[i].median();
            let basic_upper = hl2 + self.multiplier * atr[i];
            let basic_lower = hl2 - self.multiplier * atr[i];
            let prev_close = bars[i - 1].close;

            // Bands only tighten while price respects them.
            upper = if prev_close <= upper {
                basic_upper.min(upper)
            } else {
                basic_upper
            };
            lower = if prev_close >= lower {
                basic_lower.max(lower)
            } else {
                basic_lower
            };

            if trending_up && bars[i].close < lower {
                trending_up = false;
            } else if !trending_up && bars[i].close > upper {
                trending_up = true;
            }

            result[i] = if trending_up { lower } else { upper };
        }

        result
    }
}
