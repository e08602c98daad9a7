//! Optional acceptance filters consulted by the orchestrator.
//!
//! Filters read precomputed indicator series and never see open-signal state.
//! An orchestrator built without a filter simply skips that check.

use crate::bars::BarSeries;
use crate::domain::{BarPoint, SwingDirection};
use crate::indicators::{Indicator, IndicatorValues};
use crate::patterns::FinalizedPattern;

pub mod divergence;
pub mod supertrend_regime;

pub use divergence::AwesomeDivergence;
pub use supertrend_regime::SupertrendRegime;

/// Market regime reported by a trend indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendType {
    Bullish,
    Bearish,
    NoTrend,
}

impl TrendType {
    /// A bull pattern in a bearish regime, or a bear pattern in a bullish one.
    pub fn conflicts_with(&self, direction: SwingDirection) -> bool {
        matches!(
            (self, direction),
            (TrendType::Bearish, SwingDirection::Bull) | (TrendType::Bullish, SwingDirection::Bear)
        )
    }
}

/// Trend regime source.
pub trait RegimeFilter: Send + Sync {
    fn name(&self) -> &str;

    /// Indicator series this filter reads, to be precomputed by the caller.
    fn indicators(&self) -> Vec<Box<dyn Indicator>>;

    fn trend(&self, bars: &BarSeries, bar_index: usize, indicators: &IndicatorValues) -> TrendType;
}

/// Oscillator divergence source.
pub trait DivergenceFinder: Send + Sync {
    fn name(&self) -> &str;

    fn indicators(&self) -> Vec<Box<dyn Indicator>>;

    /// The earlier swing point that diverges from D, searched between X and D.
    fn find(
        &self,
        bars: &BarSeries,
        pattern: &FinalizedPattern,
        indicators: &IndicatorValues,
    ) -> Option<BarPoint>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_only_on_opposite_regime() {
        assert!(TrendType::Bearish.conflicts_with(SwingDirection::Bull));
        assert!(TrendType::Bullish.conflicts_with(SwingDirection::Bear));
        assert!(!TrendType::Bullish.conflicts_with(SwingDirection::Bull));
        assert!(!TrendType::NoTrend.conflicts_with(SwingDirection::Bull));
        assert!(!TrendType::NoTrend.conflicts_with(SwingDirection::Bear));
    }
}
