//! Supertrend regime filter.
//!
//! Bullish while the close is above the supertrend line, bearish while below.
//! Warmup bars report `NoTrend`.

use super::{RegimeFilter, TrendType};
use crate::bars::BarSeries;
use crate::indicators::{Indicator, IndicatorValues, Supertrend};

#[derive(Debug, Clone)]
pub struct SupertrendRegime {
    pub period: usize,
    pub multiplier: f64,
    indicator_key: String,
}

impl SupertrendRegime {
    pub fn new(period: usize, multiplier: f64) -> Self {
        let indicator_key = Supertrend::new(period, multiplier).name().to_string();
        Self {
            period,
            multiplier,
            indicator_key,
        }
    }

    pub fn default_params() -> Self {
        Self::new(10, 3.0)
    }
}

impl RegimeFilter for SupertrendRegime {
    fn name(&self) -> &str {
        "supertrend_regime"
    }

    fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(Supertrend::new(self.period, self.multiplier))]
    }

    fn trend(&self, bars: &BarSeries, bar_index: usize, indicators: &IndicatorValues) -> TrendType {
        let close = bars.get(bar_index).map(|b| b.close);
        let line = indicators.get(&self.indicator_key, bar_index);
        match (close, line) {
            (Some(c), Some(l)) if !l.is_nan() && c > l => TrendType::Bullish,
            (Some(c), Some(l)) if !l.is_nan() && c < l => TrendType::Bearish,
            _ => TrendType::NoTrend,
        }
    }
}
