//! Turning a formed projection into a tradeable pattern.
//!
//! The projection only guarantees the ratio geometry. Finalization adds the
//! structural checks (pivots, no extremes between points), the accuracy score
//! and the trade levels.

use thiserror::Error;

use super::pivots::{is_pivot, PivotKind};
use crate::bars::BarSeries;
use crate::config::LocatorConfig;
use crate::domain::{Bar, BarPoint, SwingDirection};
use crate::patterns::{DPointGate, FinalizedPattern, PatternProjection, SetupType};

/// Why a formed projection did not become a pattern.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Rejection {
    #[error("projection has not formed a complete XABCD")]
    Incomplete,

    #[error("point {0} is not a positive price")]
    NonPositivePoint(&'static str),

    #[error("leg {0} has no length")]
    ZeroLeg(&'static str),

    #[error("bar {index} trades outside leg {leg}")]
    ExtremumBetween { leg: &'static str, index: usize },

    #[error("point {0} is not a swing pivot")]
    NotPivot(&'static str),

    #[error("accuracy {accuracy:.3} below threshold {threshold:.3}")]
    LowAccuracy { accuracy: f64, threshold: f64 },

    #[error("D bar already closed at take profit")]
    TargetReached,
}

/// Stop and targets derived from the pattern's setup leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeLevels {
    pub stop_loss: f64,
    pub take_profit1: f64,
    pub take_profit2: f64,
}

impl TradeLevels {
    /// Levels sized on |A - D| for AD setups, |C - D| for CD setups.
    pub fn compute(
        setup: SetupType,
        direction: SwingDirection,
        a: f64,
        c: f64,
        d: f64,
        config: &LocatorConfig,
    ) -> Self {
        let size = match setup {
            SetupType::AdConfirmed => (a - d).abs(),
            SetupType::CdConfirmed => (c - d).abs(),
        };
        // Trades go in the swing direction from D.
        let sign = direction.sign();
        Self {
            stop_loss: d - sign * config.sl_ratio * size,
            take_profit1: d + sign * config.tp1_ratio * size,
            take_profit2: d + sign * config.tp2_ratio * size,
        }
    }

    /// |close - SL| / |close - TP1|, infinite when close sits on TP1.
    pub fn risk_ratio(&self, close: f64) -> f64 {
        let reward = (close - self.take_profit1).abs();
        if reward <= 0.0 {
            return f64::INFINITY;
        }
        (close - self.stop_loss).abs() / reward
    }
}

/// D gate that vetoes candidates whose close leaves no sane trade.
#[derive(Debug, Clone, Copy)]
pub struct TradeFitGate<'a> {
    config: &'a LocatorConfig,
}

impl<'a> TradeFitGate<'a> {
    pub fn new(config: &'a LocatorConfig) -> Self {
        Self { config }
    }
}

impl DPointGate for TradeFitGate<'_> {
    fn accept(&self, projection: &PatternProjection, d: &BarPoint, bar: &Bar) -> bool {
        let Some(c) = projection.c() else {
            return false;
        };
        let direction = projection.direction();
        let levels = TradeLevels::compute(
            projection.template().setup,
            direction,
            projection.a().price,
            c.price,
            d.price,
            self.config,
        );
        direction.beyond(levels.take_profit1, bar.close, 0.0)
            && levels.risk_ratio(bar.close) <= self.config.max_sl_tp_ratio
    }
}

/// Validate a `PatternFormed` projection against the bars it was built from.
pub fn finalize_pattern(
    projection: &PatternProjection,
    bars: &BarSeries,
    config: &LocatorConfig,
) -> Result<FinalizedPattern, Rejection> {
    let (Some(b), Some(c), Some(d)) = (projection.b(), projection.c(), projection.d()) else {
        return Err(Rejection::Incomplete);
    };
    let ratios = projection.ratios();
    let (Some(ac), Some(xd), Some(bd)) = (ratios.ac, ratios.xd, ratios.bd) else {
        return Err(Rejection::Incomplete);
    };
    let x = projection.x();
    let a = projection.a();
    let direction = projection.direction();
    let template = projection.template();
    let eps = config.epsilon();

    for (name, point) in [("X", x), ("A", a), ("B", b), ("C", c), ("D", d)] {
        if !(point.price.is_finite() && point.price > 0.0) {
            return Err(Rejection::NonPositivePoint(name));
        }
    }

    let legs = [("XA", x, a), ("AB", a, b), ("BC", b, c), ("CD", c, d)];
    for (leg, from, to) in legs {
        if (from.price - to.price).abs() <= eps {
            return Err(Rejection::ZeroLeg(leg));
        }
        check_leg(bars, leg, &from, &to, eps)?;
    }

    let period = config.pivot_period;
    let (b_kind, c_kind) = match direction {
        SwingDirection::Bull => (PivotKind::Low, PivotKind::High),
        SwingDirection::Bear => (PivotKind::High, PivotKind::Low),
    };
    if !is_pivot(bars, b.bar_index, period, b_kind, d.bar_index) {
        return Err(Rejection::NotPivot("B"));
    }
    if !is_pivot(bars, c.bar_index, period, c_kind, d.bar_index) {
        return Err(Rejection::NotPivot("C"));
    }

    let xb = template.has_xb().then_some(ratios.xb).flatten();
    let mut scores = vec![ac.closeness(), xd.closeness(), bd.closeness()];
    if template.has_xb() {
        scores.push(xb.map_or(0.0, |r| r.closeness()));
    }
    let accuracy = scores.iter().sum::<f64>() / scores.len() as f64;
    if accuracy < config.accuracy {
        return Err(Rejection::LowAccuracy {
            accuracy,
            threshold: config.accuracy,
        });
    }

    let levels = TradeLevels::compute(template.setup, direction, a.price, c.price, d.price, config);
    let close = bars.get(d.bar_index).map(|bar| bar.close).ok_or(Rejection::Incomplete)?;
    if !direction.beyond(levels.take_profit1, close, 0.0) {
        return Err(Rejection::TargetReached);
    }

    Ok(FinalizedPattern {
        pattern_type: template.pattern_type,
        setup: template.setup,
        direction,
        x,
        a,
        b,
        c,
        d,
        stop_loss: levels.stop_loss,
        take_profit1: levels.take_profit1,
        take_profit2: levels.take_profit2,
        xb,
        ac,
        xd,
        bd,
        accuracy,
    })
}

/// No bar strictly between `from` and `to` may trade outside their price span.
fn check_leg(
    bars: &BarSeries,
    leg: &'static str,
    from: &BarPoint,
    to: &BarPoint,
    eps: f64,
) -> Result<(), Rejection> {
    let hi = from.price.max(to.price);
    let lo = from.price.min(to.price);
    for index in from.bar_index + 1..to.bar_index {
        let Some(bar) = bars.get(index) else {
            return Err(Rejection::Incomplete);
        };
        if bar.high > hi + eps || bar.low < lo - eps {
            return Err(Rejection::ExtremumBetween { leg, index });
        }
    }
    Ok(())
}
