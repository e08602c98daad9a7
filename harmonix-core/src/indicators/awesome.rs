//! Awesome Oscillator (AO).
//!
//! SMA(fast) - SMA(slow) of the median price (high + low) / 2.
//! Lookback: slow - 1.

use super::sma::{PriceSource, Sma};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct AwesomeOscillator {
    fast: Sma,
    slow: Sma,
    slow_period: usize,
    name: String,
}

impl AwesomeOscillator {
    pub fn new(fast: usize, slow: usize) -> Self {
        assert!(fast >= 1 && slow > fast, "AO requires 1 <= fast < slow");
        Self {
            fast: Sma::of(fast, PriceSource::Median),
            slow: Sma::of(slow, PriceSource::Median),
            slow_period: slow,
            name: format!("ao_{fast}_{slow}"),
        }
    }

    pub fn default_params() -> Self {
        Self::new(5, 34)
    }
}

impl Indicator for AwesomeOscillator {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow_period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let fast = self.fast.compute(bars);
        let slow = self.slow.compute(bars);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }
}
