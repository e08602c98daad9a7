//! Finalized pattern records and their open-map identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::projection::SegmentRatio;
use super::template::{PatternType, SetupType};
use crate::domain::{BarPoint, SwingDirection};
use crate::error::PatternError;

/// A completed XABCD pattern with its trade levels.
///
/// Value type: produced once by a locator, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedPattern {
    pub pattern_type: PatternType,
    pub setup: SetupType,
    pub direction: SwingDirection,
    pub x: BarPoint,
    pub a: BarPoint,
    pub b: BarPoint,
    pub c: BarPoint,
    pub d: BarPoint,
    pub stop_loss: f64,
    pub take_profit1: f64,
    pub take_profit2: f64,
    pub xb: Option<SegmentRatio>,
    pub ac: SegmentRatio,
    pub xd: SegmentRatio,
    pub bd: SegmentRatio,
    /// Mean closeness of realized to ideal ratios, in `[0, 1]`.
    pub accuracy: f64,
}

impl FinalizedPattern {
    pub fn is_bull(&self) -> bool {
        self.direction.is_bull()
    }

    pub fn key(&self) -> PatternKey {
        PatternKey::new(self.pattern_type, &self.d)
    }

    /// |stop loss - take profit 1|.
    pub fn range(&self) -> f64 {
        (self.stop_loss - self.take_profit1).abs()
    }

    /// Distance still to travel to TP1, as a fraction of the SL..TP1 range.
    pub fn profit_ratio(&self, price: f64) -> f64 {
        (self.take_profit1 - price).abs() / self.range()
    }

    pub fn accuracy_percent(&self) -> u32 {
        (self.accuracy * 100.0).round().clamp(0.0, 100.0) as u32
    }

    /// Reject records whose levels would make the signal untradeable.
    pub fn validate(&self) -> Result<(), PatternError> {
        let finite = [
            ("x", self.x.price),
            ("a", self.a.price),
            ("b", self.b.price),
            ("c", self.c.price),
            ("d", self.d.price),
            ("stop_loss", self.stop_loss),
            ("take_profit1", self.take_profit1),
            ("take_profit2", self.take_profit2),
        ];
        if let Some(&(name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PatternError::NonFinite(name));
        }

        let range = self.range();
        if range <= f64::EPSILON * self.d.price.abs().max(1.0) {
            return Err(PatternError::ZeroRange(range));
        }

        let d = self.d.price;
        if !self.direction.counter_beyond(self.stop_loss, d, 0.0) {
            return Err(PatternError::StopOnWrongSide {
                stop_loss: self.stop_loss,
                d,
            });
        }
        if !self.direction.beyond(self.take_profit1, d, 0.0) {
            return Err(PatternError::TargetOnWrongSide {
                take_profit: self.take_profit1,
                d,
            });
        }
        Ok(())
    }
}

/// Identity of an open position: pattern type plus the D point.
///
/// Two structurally different patterns that share type and D (same bar, same
/// price) are the same open position. X, A, B and C do not take part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternKey {
    pub pattern_type: PatternType,
    pub d_bar_index: usize,
    d_price_bits: u64,
}

impl PatternKey {
    pub fn new(pattern_type: PatternType, d: &BarPoint) -> Self {
        Self {
            pattern_type,
            d_bar_index: d.bar_index,
            d_price_bits: d.price.to_bits(),
        }
    }

    pub fn d_price(&self) -> f64 {
        f64::from_bits(self.d_price_bits)
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.pattern_type, self.d_bar_index, self.d_price())
    }
}
