//! Candidate locators: where X/A swings come from.
//!
//! A locator owns the live projections, feeds them bars and hands finalized
//! patterns to the orchestrator. `SwingLocator` seeds X from confirmed pivots
//! and A from each later opposite pivot that extends the swing.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::bars::BarSeries;
use crate::config::LocatorConfig;
use crate::domain::{BarPoint, SwingDirection};
use crate::patterns::{
    FinalizedPattern, PatternProjection, PatternTemplate, ProjectionSettings, ProjectionState,
    TemplateTable,
};

pub mod finalize;
pub mod pivots;

pub use finalize::{finalize_pattern, Rejection, TradeFitGate, TradeLevels};
pub use pivots::{is_pivot, Pivot, PivotFinder, PivotKind};

/// Source of finalized patterns, polled once per closed bar.
pub trait CandidateLocator {
    /// Patterns completed by bar `index`, de-duplicated by [`PatternKey`].
    ///
    /// Only bars at or before `index` may be read.
    ///
    /// [`PatternKey`]: crate::patterns::PatternKey
    fn find_patterns(&mut self, bars: &BarSeries, index: usize) -> Vec<FinalizedPattern>;
}

/// One X pivot and every projection grown from it.
#[derive(Debug)]
struct SwingRoot {
    direction: SwingDirection,
    x: BarPoint,
    /// Most extreme A seen so far; later A pivots must exceed it.
    best_a: Option<f64>,
    /// Price traded through X after it was confirmed.
    wasted: bool,
    projections: Vec<PatternProjection>,
}

impl SwingRoot {
    fn new(direction: SwingDirection, x: BarPoint) -> Self {
        Self {
            direction,
            x,
            best_a: None,
            wasted: false,
            projections: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct SwingLocator {
    config: LocatorConfig,
    templates: Vec<Arc<PatternTemplate>>,
    pivots: PivotFinder,
    roots: Vec<SwingRoot>,
    last_index: Option<usize>,
}

impl SwingLocator {
    pub fn new(config: LocatorConfig, table: &TemplateTable) -> Self {
        let templates = table.select(&config.patterns);
        let pivots = PivotFinder::new(config.pivot_period.max(1));
        Self {
            config,
            templates,
            pivots,
            roots: Vec::new(),
            last_index: None,
        }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// X candidates currently tracked.
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Non-terminal projections across all roots.
    pub fn projection_count(&self) -> usize {
        self.roots.iter().map(|r| r.projections.len()).sum()
    }

    /// Grow projections for every root that `a` extends.
    fn spawn_projections(&mut self, bars: &BarSeries, index: usize, a: BarPoint, direction: SwingDirection) {
        let eps = self.config.epsilon();
        let gate = TradeFitGate::new(&self.config);
        let mut spawned = 0usize;

        for root in self.roots.iter_mut() {
            if root.direction != direction || root.wasted || root.x.bar_index >= a.bar_index {
                continue;
            }
            if !direction.beyond(a.price, root.x.price, eps) {
                continue;
            }
            if root.best_a.is_some_and(|best| !direction.beyond(a.price, best, eps)) {
                continue;
            }
            root.best_a = Some(a.price);

            for template in &self.templates {
                for &wick_allowance in &self.config.wick_allowances {
                    let settings = ProjectionSettings {
                        wick_allowance,
                        epsilon: eps,
                    };
                    let mut projection = PatternProjection::new(template.clone(), root.x, a, settings);

                    // Catch up on bars printed while A was being confirmed.
                    for k in a.bar_index + 1..index {
                        let Some(bar) = bars.get(k) else {
                            break;
                        };
                        if projection.update_with_gate(k, bar, &gate).is_terminal() {
                            break;
                        }
                    }

                    match projection.state() {
                        ProjectionState::PatternFormed => trace!(
                            pattern = %template.pattern_type,
                            "pattern formed during catch-up, dropped as stale"
                        ),
                        ProjectionState::Invalid => {}
                        _ => {
                            root.projections.push(projection);
                            spawned += 1;
                        }
                    }
                }
            }
        }

        if spawned > 0 {
            debug!(
                a = a.price,
                a_index = a.bar_index,
                bull = direction.is_bull(),
                spawned,
                "projections spawned"
            );
        }
    }
}

impl CandidateLocator for SwingLocator {
    fn find_patterns(&mut self, bars: &BarSeries, index: usize) -> Vec<FinalizedPattern> {
        if self.last_index.is_some_and(|last| index <= last) {
            return Vec::new();
        }
        let Some(bar) = bars.get(index) else {
            return Vec::new();
        };
        self.last_index = Some(index);
        let eps = self.config.epsilon();

        let depth = self.config.bars_depth;
        self.roots.retain(|root| root.x.bar_index + depth >= index);
        for root in self.roots.iter_mut() {
            let through_x = root.direction.counter_sample(bar);
            if root.direction.counter_beyond(through_x, root.x.price, eps) {
                root.wasted = true;
            }
        }

        for pivot in self.pivots.update(bars, index) {
            // A high pivot ends bull swings and starts bear ones.
            let (ends, starts) = match pivot.kind {
                PivotKind::High => (SwingDirection::Bull, SwingDirection::Bear),
                PivotKind::Low => (SwingDirection::Bear, SwingDirection::Bull),
            };
            debug_assert_eq!(PivotKind::ending(ends), pivot.kind);
            self.spawn_projections(bars, index, pivot.point, ends);
            self.roots.push(SwingRoot::new(starts, pivot.point));
        }

        let gate = TradeFitGate::new(&self.config);
        let mut found = Vec::new();
        for root in self.roots.iter_mut() {
            for projection in root.projections.iter_mut() {
                if projection.update_with_gate(index, bar, &gate) != ProjectionState::PatternFormed {
                    continue;
                }
                match finalize_pattern(projection, bars, &self.config) {
                    Ok(pattern) => found.push(pattern),
                    Err(reason) => debug!(
                        pattern = %projection.pattern_type(),
                        index,
                        %reason,
                        "formed pattern rejected"
                    ),
                }
            }
            root.projections.retain(|p| !p.state().is_terminal());
        }
        self.roots
            .retain(|root| !(root.wasted && root.projections.is_empty()));

        // Several wick allowances may land on the same D: keep the most accurate.
        found.sort_by(|a, b| a.key().cmp(&b.key()).then(b.accuracy.total_cmp(&a.accuracy)));
        found.dedup_by_key(|p| p.key());
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Timeframe};
    use crate::patterns::PatternType;
    use chrono::{Duration, TimeZone, Utc};

    fn series(hl: &[(f64, f64)]) -> BarSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = hl
            .iter()
            .enumerate()
            .map(|(i, &(high, low))| Bar {
                open_time: base + Duration::hours(i as i64),
                open: (high + low) / 2.0,
                high,
                low,
                close: (high + low) / 2.0,
                volume: 0.0,
            })
            .collect();
        BarSeries::from_bars(Timeframe::H1, bars).unwrap()
    }

    fn gartley_locator() -> SwingLocator {
        let config = LocatorConfig {
            patterns: vec![PatternType::Gartley],
            ..LocatorConfig::default()
        };
        SwingLocator::new(config, &TemplateTable::standard())
    }

    #[test]
    fn pivots_seed_roots_and_projections() {
        let s = series(&[
            (101.0, 100.5),
            (100.8, 100.0),
            (104.0, 100.6),
            (110.0, 104.0),
            (109.0, 107.0),
            (108.0, 106.0),
        ]);
        let mut locator = gartley_locator();
        for i in 0..s.len() {
            assert!(locator.find_patterns(&s, i).is_empty());
        }
        // Low pivot at bar 1 (bull X), high pivot at bar 3 (bull A, bear X).
        assert!(locator.root_count() >= 2);
        assert_eq!(locator.projection_count(), 1);
    }

    #[test]
    fn repeated_index_is_a_no_op() {
        let s = series(&[(101.0, 100.5), (100.8, 100.0), (104.0, 100.6)]);
        let mut locator = gartley_locator();
        locator.find_patterns(&s, 2);
        let roots = locator.root_count();
        assert!(locator.find_patterns(&s, 2).is_empty());
        assert!(locator.find_patterns(&s, 1).is_empty());
        assert_eq!(locator.root_count(), roots);
    }

    #[test]
    fn roots_older_than_depth_are_evicted() {
        let mut hl = vec![(101.0, 100.5), (100.8, 100.0), (104.0, 100.6)];
        hl.extend((0..10).map(|_| (103.0, 102.0)));
        let s = series(&hl);
        let config = LocatorConfig {
            bars_depth: 5,
            patterns: vec![PatternType::Gartley],
            ..LocatorConfig::default()
        };
        let mut locator = SwingLocator::new(config, &TemplateTable::standard());
        for i in 0..s.len() {
            locator.find_patterns(&s, i);
        }
        assert!(locator
            .roots
            .iter()
            .all(|root| root.x.bar_index + 5 >= s.len() - 1));
    }
}
