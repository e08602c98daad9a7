//! Projection combinator — joint XD/BD bands for the D pivot.
//!
//! XD levels depend only on X and A and are fixed for the lifetime of a
//! projection. BD levels depend on B and C and are rebuilt every time C is
//! resolved. A combo is alive while both of its parent levels are alive;
//! pruning removes levels, never adds them back for the same BD set.

use serde::Serialize;

use super::ratio_level::RatioLevel;
use crate::domain::SwingDirection;

/// Overlap of one XD level with one BD level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelCombo {
    pub xd: RatioLevel,
    pub bd: RatioLevel,
    pub combined_min: f64,
    pub combined_max: f64,
    xd_index: usize,
    bd_index: usize,
}

impl LevelCombo {
    /// Intersection of `xd` and `bd`, `None` when they do not overlap.
    pub fn intersect(xd: RatioLevel, bd: RatioLevel) -> Option<Self> {
        Self::intersect_at(xd, 0, bd, 0)
    }

    fn intersect_at(xd: RatioLevel, xd_index: usize, bd: RatioLevel, bd_index: usize) -> Option<Self> {
        let combined_min = xd.min().max(bd.min());
        let combined_max = xd.max().min(bd.max());
        (combined_max >= combined_min).then_some(Self {
            xd,
            bd,
            combined_min,
            combined_max,
            xd_index,
            bd_index,
        })
    }

    pub fn contains(&self, price: f64, eps: f64) -> bool {
        price >= self.combined_min - eps && price <= self.combined_max + eps
    }

    /// The boundary D must not cross (min for a bull swing).
    pub fn far_boundary(&self, direction: SwingDirection) -> f64 {
        match direction {
            SwingDirection::Bull => self.combined_min,
            SwingDirection::Bear => self.combined_max,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectionCombinator {
    direction: SwingDirection,
    xd_levels: Vec<RatioLevel>,
    xd_alive: Vec<bool>,
    bd_levels: Vec<RatioLevel>,
    bd_alive: Vec<bool>,
    combos: Vec<LevelCombo>,
}

impl ProjectionCombinator {
    pub fn new(xd_levels: Vec<RatioLevel>, direction: SwingDirection) -> Self {
        let xd_alive = vec![true; xd_levels.len()];
        Self {
            direction,
            xd_levels,
            xd_alive,
            bd_levels: Vec::new(),
            bd_alive: Vec::new(),
            combos: Vec::new(),
        }
    }

    /// Replace the BD set and rebuild all overlapping combos.
    ///
    /// Combos are ordered by XD ratio, then BD ratio, both ascending. Returns
    /// the cancel price of the new set, `None` if nothing overlaps.
    pub fn rebuild(&mut self, bd_levels: Vec<RatioLevel>) -> Option<f64> {
        self.bd_alive = vec![true; bd_levels.len()];
        self.bd_levels = bd_levels;
        self.combos.clear();

        for (xi, xd) in self.xd_levels.iter().enumerate() {
            if !self.xd_alive[xi] {
                continue;
            }
            for (bi, bd) in self.bd_levels.iter().enumerate() {
                if let Some(combo) = LevelCombo::intersect_at(*xd, xi, *bd, bi) {
                    self.combos.push(combo);
                }
            }
        }

        self.cancel_price()
    }

    /// Drop the BD set and every combo built on it.
    pub fn clear(&mut self) {
        self.bd_levels.clear();
        self.bd_alive.clear();
        self.combos.clear();
    }

    /// Most extreme far boundary among live combos.
    pub fn cancel_price(&self) -> Option<f64> {
        let direction = self.direction;
        self.live_combos()
            .map(|c| c.far_boundary(direction))
            .reduce(|acc, p| direction.opposite().most_extreme(acc, p))
    }

    pub fn live_combos(&self) -> impl Iterator<Item = &LevelCombo> {
        self.combos
            .iter()
            .filter(|c| self.xd_alive[c.xd_index] && self.bd_alive[c.bd_index])
    }

    pub fn live_count(&self) -> usize {
        self.live_combos().count()
    }

    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }

    /// Remove the levels a counter-swing sample has run through.
    ///
    /// For every live combo the sample has passed beyond, the XD and/or BD
    /// level whose own far edge was crossed is killed. Returns the number of
    /// combos still alive.
    pub fn prune(&mut self, price: f64, eps: f64) -> usize {
        let direction = self.direction;
        let mut dead_xd = Vec::new();
        let mut dead_bd = Vec::new();

        for combo in self.live_combos() {
            if !direction.counter_beyond(price, combo.far_boundary(direction), eps) {
                continue;
            }
            if direction.counter_beyond(price, far_edge(&combo.xd, direction), eps) {
                dead_xd.push(combo.xd_index);
            }
            if direction.counter_beyond(price, far_edge(&combo.bd, direction), eps) {
                dead_bd.push(combo.bd_index);
            }
        }

        for i in dead_xd {
            self.xd_alive[i] = false;
        }
        for i in dead_bd {
            self.bd_alive[i] = false;
        }

        self.live_count()
    }

    /// First live combo containing `price`, in XD-then-BD order.
    pub fn find_entry(&self, price: f64, eps: f64) -> Option<LevelCombo> {
        self.live_combos().find(|c| c.contains(price, eps)).copied()
    }
}

fn far_edge(level: &RatioLevel, direction: SwingDirection) -> f64 {
    match direction {
        SwingDirection::Bull => level.min(),
        SwingDirection::Bear => level.max(),
    }
}
