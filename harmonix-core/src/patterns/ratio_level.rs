//! Ratio levels — Fibonacci ratios projected into tolerance-banded prices.

use serde::{Deserialize, Serialize};

use crate::domain::SwingDirection;

/// One ratio projected from an anchor price, widened by the wick allowance.
///
/// `range_start` is the projection of `ratio * (1 - w)`, `range_end` of
/// `ratio * (1 + w)`; depending on the projection sign either may be the lower
/// price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioLevel {
    pub ratio: f64,
    pub range_start: f64,
    pub range_end: f64,
}

impl RatioLevel {
    /// A level spanning two arbitrary prices, used where a template has no ratio constraint.
    ///
    /// Nothing is projected, so [`ideal`](Self::ideal) of a span is only its midpoint.
    pub fn span(ratio: f64, start: f64, end: f64) -> Self {
        Self {
            ratio,
            range_start: start,
            range_end: end,
        }
    }

    pub fn min(&self) -> f64 {
        self.range_start.min(self.range_end)
    }

    pub fn max(&self) -> f64 {
        self.range_start.max(self.range_end)
    }

    /// The unwidened projection of `ratio` for levels from [`build_ratio_levels`];
    /// the band midpoint for a [`span`](Self::span).
    pub fn ideal(&self) -> f64 {
        (self.range_start + self.range_end) / 2.0
    }

    pub fn contains(&self, price: f64, eps: f64) -> bool {
        price >= self.min() - eps && price <= self.max() + eps
    }
}

/// Project every ratio from `anchor` along (or against) the swing.
///
/// Output order follows `ratios`. With `wick = 0` each level collapses to its
/// ideal price.
pub fn build_ratio_levels(
    ratios: &[f64],
    wick: f64,
    length: f64,
    anchor: f64,
    direction: SwingDirection,
    counter_swing: bool,
) -> Vec<RatioLevel> {
    let sign = if counter_swing {
        -direction.sign()
    } else {
        direction.sign()
    };

    ratios
        .iter()
        .map(|&ratio| {
            let ratio_start = ratio * (1.0 - wick);
            let ratio_end = ratio * (1.0 + wick);
            RatioLevel {
                ratio,
                range_start: anchor + sign * length * ratio_start,
                range_end: anchor + sign * length * ratio_end,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn xb_band_of_worked_gartley() {
        // X = 100, A = 110, B retraces 0.618 of XA from A.
        let levels = build_ratio_levels(&[0.618], 0.05, 10.0, 110.0, SwingDirection::Bull, true);
        assert_eq!(levels.len(), 1);
        let b = levels[0];
        assert!((b.min() - 103.511).abs() < 1e-9);
        assert!((b.max() - 104.129).abs() < 1e-9);
        assert!((b.ideal() - 103.82).abs() < 1e-9);
        assert!(b.contains(103.8, EPS));
        assert!(!b.contains(103.5, EPS));
    }

    #[test]
    fn zero_wick_collapses_to_ideal() {
        let levels = build_ratio_levels(&[0.5, 1.618], 0.0, 4.0, 50.0, SwingDirection::Bear, false);
        assert_eq!(levels[0].range_start, levels[0].range_end);
        assert!((levels[0].ideal() - 48.0).abs() < EPS);
        assert!((levels[1].ideal() - (50.0 - 4.0 * 1.618)).abs() < EPS);
    }

    #[test]
    fn order_follows_input() {
        let ratios = [0.382, 0.5, 0.618];
        let levels = build_ratio_levels(&ratios, 0.1, 1.0, 0.0, SwingDirection::Bull, false);
        let got: Vec<f64> = levels.iter().map(|l| l.ratio).collect();
        assert_eq!(got, ratios);
    }

    #[test]
    fn span_keeps_given_bounds() {
        let level = RatioLevel::span(0.0, 110.0, 100.0);
        assert_eq!((level.min(), level.max()), (100.0, 110.0));
        assert_eq!(level.ideal(), 105.0);
        assert!(level.contains(100.0, 0.0) && level.contains(110.0, 0.0));
        assert!(!level.contains(110.5, EPS));
    }

    #[test]
    fn counter_swing_mirrors_sign() {
        let up = build_ratio_levels(&[1.0], 0.0, 2.0, 10.0, SwingDirection::Bull, false);
        let down = build_ratio_levels(&[1.0], 0.0, 2.0, 10.0, SwingDirection::Bull, true);
        assert_eq!(up[0].ideal(), 12.0);
        assert_eq!(down[0].ideal(), 8.0);
    }
}
