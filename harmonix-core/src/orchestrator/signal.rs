//! Open positions tracked by the orchestrator.

use serde::{Deserialize, Serialize};

use crate::domain::{BarPoint, SwingDirection};
use crate::patterns::{FinalizedPattern, PatternKey};

/// An accepted pattern waiting for its target or stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenSignal {
    pub pattern: FinalizedPattern,
    /// Close of the bar (or the tick) the signal was accepted on.
    pub entry: BarPoint,
    /// Only ever moved by breakeven.
    pub stop_loss: BarPoint,
    pub take_profit: BarPoint,
    pub has_breakeven: bool,
    /// Divergence reported by the finder, attached whether or not it gated entry.
    pub divergence: Option<BarPoint>,
}

impl OpenSignal {
    pub(crate) fn open(pattern: FinalizedPattern, entry: BarPoint, divergence: Option<BarPoint>) -> Self {
        Self {
            stop_loss: entry.with_price(pattern.stop_loss),
            take_profit: entry.with_price(pattern.take_profit1),
            pattern,
            entry,
            has_breakeven: false,
            divergence,
        }
    }

    pub fn key(&self) -> PatternKey {
        self.pattern.key()
    }

    pub fn direction(&self) -> SwingDirection {
        self.pattern.direction
    }

    /// Price at which the stop moves to entry, `ratio` of the way to the target.
    pub fn breakeven_price(&self, ratio: f64) -> f64 {
        let entry = self.entry.price;
        entry + (self.take_profit.price - entry).abs() * ratio * self.direction().sign()
    }

    /// `high`/`low` span touches the take profit.
    pub(crate) fn target_touched(&self, high: f64, low: f64) -> bool {
        match self.direction() {
            SwingDirection::Bull => high >= self.take_profit.price,
            SwingDirection::Bear => low <= self.take_profit.price,
        }
    }

    pub(crate) fn stop_touched(&self, high: f64, low: f64) -> bool {
        match self.direction() {
            SwingDirection::Bull => low <= self.stop_loss.price,
            SwingDirection::Bear => high >= self.stop_loss.price,
        }
    }

    pub(crate) fn breakeven_touched(&self, ratio: f64, high: f64, low: f64) -> bool {
        let price = self.breakeven_price(ratio);
        match self.direction() {
            SwingDirection::Bull => high >= price,
            SwingDirection::Bear => low <= price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::finalized::tests::sample_pattern;

    fn signal() -> OpenSignal {
        let pattern = sample_pattern();
        let entry = pattern.d.with_price(102.8);
        OpenSignal::open(pattern, entry, None)
    }

    #[test]
    fn levels_come_from_pattern() {
        let s = signal();
        assert_eq!(s.stop_loss.price, s.pattern.stop_loss);
        assert_eq!(s.take_profit.price, s.pattern.take_profit1);
        assert_eq!(s.stop_loss.bar_index, 30);
        assert!(!s.has_breakeven);
    }

    #[test]
    fn breakeven_price_is_fraction_towards_target() {
        let s = signal();
        let expected = 102.8 + (s.take_profit.price - 102.8) * 0.5;
        assert!((s.breakeven_price(0.5) - expected).abs() < 1e-9);
        assert!(s.breakeven_touched(0.5, expected, 102.0));
        assert!(!s.breakeven_touched(0.5, expected - 0.01, 102.0));
    }

    #[test]
    fn touches_use_the_right_extreme() {
        let s = signal();
        assert!(s.target_touched(s.take_profit.price, 90.0));
        assert!(!s.target_touched(s.take_profit.price - 0.01, 90.0));
        assert!(s.stop_touched(200.0, s.stop_loss.price));
        assert!(!s.stop_touched(200.0, s.stop_loss.price + 0.01));
    }
}
