//! Awesome-oscillator divergence between the X..D swing and D.
//!
//! For a bull pattern the AO at D must be non-positive. Walking back from D
//! towards X inside the same negative lobe, the first local AO trough that is
//! at least as deep as D's value, printed at a price no lower than D, is the
//! divergence point. Bear patterns mirror every comparison.

use super::DivergenceFinder;
use crate::bars::BarSeries;
use crate::domain::{BarPoint, SwingDirection};
use crate::indicators::{AwesomeOscillator, Indicator, IndicatorValues};
use crate::patterns::FinalizedPattern;

#[derive(Debug, Clone)]
pub struct AwesomeDivergence {
    pub fast: usize,
    pub slow: usize,
    indicator_key: String,
}

impl AwesomeDivergence {
    pub fn new(fast: usize, slow: usize) -> Self {
        let indicator_key = AwesomeOscillator::new(fast, slow).name().to_string();
        Self {
            fast,
            slow,
            indicator_key,
        }
    }

    pub fn default_params() -> Self {
        Self::new(5, 34)
    }
}

impl DivergenceFinder for AwesomeDivergence {
    fn name(&self) -> &str {
        "awesome_divergence"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(AwesomeOscillator::new(self.fast, self.slow))]
    }

    fn find(
        &self,
        bars: &BarSeries,
        pattern: &FinalizedPattern,
        indicators: &IndicatorValues,
    ) -> Option<BarPoint> {
        let hist = indicators.get_series(&self.indicator_key)?;
        let direction = pattern.direction;
        let start = pattern.x.bar_index;
        let end = pattern.d.bar_index;
        if start >= end {
            return None;
        }

        let end_hist = *hist.get(end)?;
        // The pattern completes against the swing, so its own side of the
        // histogram is the counter side: negative for bull.
        if end_hist.is_nan() || wrong_lobe(direction, end_hist) {
            return None;
        }

        let end_price = direction.counter_sample(bars.get(end)?);
        for i in (start..end).rev() {
            let bar = bars.get(i)?;
            let local = hist[i];
            if local.is_nan() || wrong_lobe(direction, local) {
                break;
            }

            let price = direction.counter_sample(bar);
            if direction.counter_beyond(price, pattern.d.price, 0.0)
                || direction.counter_beyond(price, end_price, 0.0)
            {
                break;
            }

            // Needs an oscillator extreme at least as deep as D's.
            if direction.beyond(local, end_hist, 0.0) {
                continue;
            }
            if i <= start + 1 {
                break;
            }

            let previous = hist[i - 1];
            if previous.is_nan() || !direction.beyond(previous, local, 0.0) {
                continue;
            }
            return BarPoint::from_series(bars, i, price);
        }

        None
    }
}

/// Histogram value on the swing side of zero (positive for bull).
fn wrong_lobe(direction: SwingDirection, value: f64) -> bool {
    direction.beyond(value, 0.0, 0.0)
}
