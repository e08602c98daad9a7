//! Swing direction and the mirrored comparisons built on it.
//!
//! Every geometric test in the detector is written once in terms of
//! "further along the swing" / "further against the swing" so that bullish
//! and bearish patterns share one code path.

use serde::{Deserialize, Serialize};

use super::Bar;

/// Direction of the X→A leg, fixed for the lifetime of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SwingDirection {
    /// X below A; the pattern completes at a low and signals a long.
    Bull,
    /// X above A; the pattern completes at a high and signals a short.
    Bear,
}

impl SwingDirection {
    pub fn from_prices(x: f64, a: f64) -> Self {
        if x < a {
            SwingDirection::Bull
        } else {
            SwingDirection::Bear
        }
    }

    pub fn is_bull(&self) -> bool {
        matches!(self, SwingDirection::Bull)
    }

    pub fn opposite(&self) -> Self {
        match self {
            SwingDirection::Bull => SwingDirection::Bear,
            SwingDirection::Bear => SwingDirection::Bull,
        }
    }

    /// +1 for bull, -1 for bear.
    pub fn sign(&self) -> f64 {
        match self {
            SwingDirection::Bull => 1.0,
            SwingDirection::Bear => -1.0,
        }
    }

    /// `price` lies strictly past `reference` in the swing direction.
    pub fn beyond(&self, price: f64, reference: f64, eps: f64) -> bool {
        match self {
            SwingDirection::Bull => price > reference + eps,
            SwingDirection::Bear => price < reference - eps,
        }
    }

    /// `price` lies strictly past `reference` against the swing direction.
    pub fn counter_beyond(&self, price: f64, reference: f64, eps: f64) -> bool {
        self.opposite().beyond(price, reference, eps)
    }

    /// The bar extreme that extends the swing (high for bull).
    pub fn straight_sample(&self, bar: &Bar) -> f64 {
        match self {
            SwingDirection::Bull => bar.high,
            SwingDirection::Bear => bar.low,
        }
    }

    /// The bar extreme that retraces the swing (low for bull).
    pub fn counter_sample(&self, bar: &Bar) -> f64 {
        self.opposite().straight_sample(bar)
    }

    /// The more extreme of two prices in the swing direction.
    pub fn most_extreme(&self, a: f64, b: f64) -> f64 {
        match self {
            SwingDirection::Bull => a.max(b),
            SwingDirection::Bear => a.min(b),
        }
    }

    /// Body of `bar` agrees with this direction.
    pub fn agrees_with(&self, bar: &Bar) -> bool {
        match self {
            SwingDirection::Bull => bar.is_bullish(),
            SwingDirection::Bear => bar.is_bearish(),
        }
    }
}
