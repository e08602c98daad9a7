//! Pattern projection — the per-(X, A) state machine that resolves B, C and D.
//!
//! A projection is fed one bar at a time. Within a bar the swing-direction
//! extreme (high for bull) is processed before the counter extreme, so a bull
//! run and its price-mirrored bear run walk through identical states.
//!
//! ```text
//!            resolve_c            D enters a live combo
//! Tracking ─────────────▶ ProjectionReady ─────────────────▶ PatternFormed
//!    ▲  │                  │    │
//!    │  │ invalidate_c     │    │ cancel price crossed / combos exhausted
//!    │  └──────────────────┘    ▼
//!    └──── breach ──────────▶ Invalid
//! ```
//!
//! `PatternFormed` and `Invalid` are terminal: every later update is a no-op.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::combinator::{LevelCombo, ProjectionCombinator};
use super::ratio_level::{build_ratio_levels, RatioLevel};
use super::template::{PatternTemplate, PatternType};
use crate::domain::{Bar, BarPoint, SwingDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectionState {
    Tracking,
    ProjectionReady,
    PatternFormed,
    Invalid,
}

impl ProjectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectionState::PatternFormed | ProjectionState::Invalid)
    }
}

/// Tolerances of a projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionSettings {
    /// Fraction each ideal ratio is widened by, in `[0, 1]`.
    pub wick_allowance: f64,
    /// Comparison tolerance, on the order of the instrument's tick size.
    pub epsilon: f64,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            wick_allowance: 0.175,
            epsilon: 1e-9,
        }
    }
}

/// Matched ideal ratio and the ratio price actually printed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentRatio {
    pub ideal: f64,
    pub actual: f64,
}

impl SegmentRatio {
    /// min/max of ideal and actual, 1.0 for a perfect match.
    pub fn closeness(&self) -> f64 {
        let hi = self.ideal.max(self.actual);
        if hi <= 0.0 {
            return 0.0;
        }
        self.ideal.min(self.actual) / hi
    }
}

/// Realized segment ratios, filled in as pivots resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RealizedRatios {
    pub xb: Option<SegmentRatio>,
    pub ac: Option<SegmentRatio>,
    pub xd: Option<SegmentRatio>,
    pub bd: Option<SegmentRatio>,
}

/// Veto point for a D candidate that geometrically fits.
///
/// A rejected candidate stays on record; later samples must be more extreme
/// than it to be considered.
pub trait DPointGate {
    fn accept(&self, projection: &PatternProjection, d: &BarPoint, bar: &Bar) -> bool;
}

/// Gate that accepts every geometric fit.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl DPointGate for AcceptAll {
    fn accept(&self, _projection: &PatternProjection, _d: &BarPoint, _bar: &Bar) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct PatternProjection {
    template: Arc<PatternTemplate>,
    settings: ProjectionSettings,
    direction: SwingDirection,
    x: BarPoint,
    a: BarPoint,
    length: f64,
    xb_levels: Vec<RatioLevel>,
    ac_levels: Vec<RatioLevel>,
    combinator: ProjectionCombinator,
    b: Option<BarPoint>,
    b_alternate: Option<BarPoint>,
    c: Option<BarPoint>,
    d: Option<BarPoint>,
    d_candidate: Option<BarPoint>,
    cancel_price_a: f64,
    cancel_price_d: Option<f64>,
    ratios: RealizedRatios,
    state: ProjectionState,
    last_index: Option<usize>,
}

impl PatternProjection {
    /// Start tracking `template` on the swing X → A.
    ///
    /// A zero-length swing produces a projection that is `Invalid` from the start.
    pub fn new(
        template: Arc<PatternTemplate>,
        x: BarPoint,
        a: BarPoint,
        settings: ProjectionSettings,
    ) -> Self {
        let direction = SwingDirection::from_prices(x.price, a.price);
        let length = (a.price - x.price).abs();
        let wick = settings.wick_allowance;

        let xb_levels = if template.has_xb() {
            build_ratio_levels(&template.xb, wick, length, a.price, direction, true)
        } else {
            vec![RatioLevel::span(0.0, a.price, x.price)]
        };
        let ac_levels = build_ratio_levels(&template.ac, wick, length, x.price, direction, false);
        let xd_levels = build_ratio_levels(&template.xd, wick, length, a.price, direction, true);

        let cancel_price_a = ac_levels
            .iter()
            .flat_map(|l| [l.range_start, l.range_end])
            .reduce(|acc, p| direction.most_extreme(acc, p))
            .unwrap_or(a.price);

        let degenerate = length <= settings.epsilon || a.bar_index <= x.bar_index;

        Self {
            combinator: ProjectionCombinator::new(xd_levels, direction),
            template,
            settings,
            direction,
            x,
            a,
            length,
            xb_levels,
            ac_levels,
            b: None,
            b_alternate: None,
            c: None,
            d: None,
            d_candidate: None,
            cancel_price_a,
            cancel_price_d: None,
            ratios: RealizedRatios::default(),
            state: if degenerate {
                ProjectionState::Invalid
            } else {
                ProjectionState::Tracking
            },
            last_index: None,
        }
    }

    /// Feed bar `index` with no D veto.
    pub fn update(&mut self, index: usize, bar: &Bar) -> ProjectionState {
        self.update_with_gate(index, bar, &AcceptAll)
    }

    /// Feed bar `index`; `gate` may veto D candidates.
    ///
    /// Bars at or before A, and bars not newer than the last one fed, are ignored.
    pub fn update_with_gate(
        &mut self,
        index: usize,
        bar: &Bar,
        gate: &dyn DPointGate,
    ) -> ProjectionState {
        if self.state.is_terminal() || index <= self.a.bar_index {
            return self.state;
        }
        if self.last_index.is_some_and(|last| index <= last) {
            return self.state;
        }
        self.last_index = Some(index);

        let straight = self.direction.straight_sample(bar);
        self.on_straight_sample(index, bar, straight);
        if self.state.is_terminal() {
            return self.state;
        }

        let counter = self.direction.counter_sample(bar);
        self.on_counter_sample(index, bar, counter, gate);
        self.state
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn state(&self) -> ProjectionState {
        self.state
    }

    pub fn template(&self) -> &Arc<PatternTemplate> {
        &self.template
    }

    pub fn pattern_type(&self) -> PatternType {
        self.template.pattern_type
    }

    pub fn settings(&self) -> ProjectionSettings {
        self.settings
    }

    pub fn direction(&self) -> SwingDirection {
        self.direction
    }

    pub fn is_bull(&self) -> bool {
        self.direction.is_bull()
    }

    pub fn x(&self) -> BarPoint {
        self.x
    }

    pub fn a(&self) -> BarPoint {
        self.a
    }

    pub fn b(&self) -> Option<BarPoint> {
        self.b
    }

    pub fn b_alternate(&self) -> Option<BarPoint> {
        self.b_alternate
    }

    pub fn c(&self) -> Option<BarPoint> {
        self.c
    }

    pub fn d(&self) -> Option<BarPoint> {
        self.d
    }

    /// The best D candidate a gate has vetoed so far.
    pub fn d_candidate(&self) -> Option<BarPoint> {
        self.d_candidate
    }

    /// |A - X|.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn cancel_price_a(&self) -> f64 {
        self.cancel_price_a
    }

    pub fn cancel_price_d(&self) -> Option<f64> {
        self.cancel_price_d
    }

    pub fn ratios(&self) -> RealizedRatios {
        self.ratios
    }

    pub fn xb_levels(&self) -> &[RatioLevel] {
        &self.xb_levels
    }

    pub fn ac_levels(&self) -> &[RatioLevel] {
        &self.ac_levels
    }

    pub fn live_combos(&self) -> Vec<LevelCombo> {
        self.combinator.live_combos().copied().collect()
    }

    // ── Sample handling ──────────────────────────────────────────────

    fn on_straight_sample(&mut self, index: usize, bar: &Bar, price: f64) {
        let eps = self.settings.epsilon;
        if self.direction.beyond(price, self.cancel_price_a, eps) {
            self.invalidate("swing ran past the last AC band", index);
            return;
        }

        match (self.b, self.c) {
            (None, _) => {
                if self.direction.beyond(price, self.a.price, eps) {
                    self.invalidate("price left [X, A] before B", index);
                }
            }
            (Some(_), None) => self.try_resolve_c(index, bar, price),
            (Some(b), Some(c)) => {
                if self.direction.beyond(price, c.price, eps) {
                    self.invalidate_c();
                    self.recheck_b(b);
                    self.try_resolve_c(index, bar, price);
                }
            }
        }
    }

    fn on_counter_sample(&mut self, index: usize, bar: &Bar, price: f64, gate: &dyn DPointGate) {
        match self.c {
            None => self.on_counter_before_c(index, bar, price),
            Some(c) => {
                self.track_counter_extreme(index, bar, price);
                if index > c.bar_index {
                    self.on_counter_after_c(index, bar, price, gate);
                }
            }
        }
    }

    fn on_counter_before_c(&mut self, index: usize, bar: &Bar, price: f64) {
        let eps = self.settings.epsilon;
        if self.direction.counter_beyond(price, self.x.price, eps) {
            self.invalidate("price crossed X before C", index);
            return;
        }

        self.track_counter_extreme(index, bar, price);
        self.resolve_b();
    }

    /// Keep `b_alternate` at the counter extremum since A.
    fn track_counter_extreme(&mut self, index: usize, bar: &Bar, price: f64) {
        let eps = self.settings.epsilon;
        let more_extreme = self
            .b_alternate
            .map_or(true, |alt| self.direction.counter_beyond(price, alt.price, eps));
        if more_extreme {
            self.b_alternate = Some(self.point(price, index, bar));
        }
    }

    /// Called when C is superseded: if price retraced past `b` while the old
    /// C stood, B is re-resolved from that retrace or dropped.
    fn recheck_b(&mut self, b: BarPoint) {
        let eps = self.settings.epsilon;
        let retraced = self.b_alternate.is_some_and(|alt| {
            alt.bar_index > b.bar_index && self.direction.counter_beyond(alt.price, b.price, eps)
        });
        if !retraced {
            return;
        }
        self.resolve_b();
        debug!(
            pattern = %self.template.pattern_type,
            old_b = b.price,
            new_b = ?self.b.map(|p| p.price),
            "price retraced past B before C was superseded"
        );
    }

    /// Re-derive B from the running counter extremum.
    fn resolve_b(&mut self) {
        let Some(alt) = self.b_alternate else {
            return;
        };
        let eps = self.settings.epsilon;

        if let Some(b) = self.b {
            if !self.direction.counter_beyond(alt.price, b.price, eps) {
                return;
            }
        }

        let matched = self.xb_levels.iter().find(|l| l.contains(alt.price, eps)).copied();
        match matched {
            Some(level) => {
                self.b = Some(alt);
                self.ratios.xb = Some(SegmentRatio {
                    ideal: level.ratio,
                    actual: (self.a.price - alt.price).abs() / self.length,
                });
            }
            None => {
                if self.b.take().is_some() {
                    debug!(
                        pattern = %self.template.pattern_type,
                        price = alt.price,
                        "B breached outside XB bands, discarded"
                    );
                }
                self.ratios.xb = None;
            }
        }
    }

    fn try_resolve_c(&mut self, index: usize, bar: &Bar, price: f64) {
        let Some(b) = self.b else {
            return;
        };
        let eps = self.settings.epsilon;
        if index <= b.bar_index || !self.direction.beyond(price, b.price, eps) {
            return;
        }
        let matched = self.ac_levels.iter().find(|l| l.contains(price, eps)).copied();
        if let Some(level) = matched {
            let point = self.point(price, index, bar);
            self.resolve_c(point, level);
        }
    }

    /// Set C and rebuild the BD levels and combos from it.
    fn resolve_c(&mut self, c: BarPoint, ac_level: RatioLevel) -> ProjectionState {
        let Some(b) = self.b else {
            return self.invalidate("C resolved without B", c.bar_index);
        };

        self.c = Some(c);
        self.d_candidate = None;
        self.ratios.ac = Some(SegmentRatio {
            ideal: ac_level.ratio,
            actual: (c.price - self.x.price).abs() / self.length,
        });

        let bc = (b.price - c.price).abs();
        let bd_levels = build_ratio_levels(
            &self.template.bd,
            self.settings.wick_allowance,
            bc,
            c.price,
            self.direction,
            true,
        );
        self.cancel_price_d = self.combinator.rebuild(bd_levels);

        if self.cancel_price_d.is_none() {
            return self.invalidate("no XD/BD overlap for this B/C", c.bar_index);
        }

        debug!(
            pattern = %self.template.pattern_type,
            c = c.price,
            cancel_d = ?self.cancel_price_d,
            combos = self.combinator.live_count(),
            "C resolved"
        );
        self.state = ProjectionState::ProjectionReady;
        self.state
    }

    /// Drop C and everything derived from it.
    fn invalidate_c(&mut self) -> ProjectionState {
        self.c = None;
        self.d_candidate = None;
        self.cancel_price_d = None;
        self.ratios.ac = None;
        self.combinator.clear();
        self.state = ProjectionState::Tracking;
        self.state
    }

    fn on_counter_after_c(&mut self, index: usize, bar: &Bar, price: f64, gate: &dyn DPointGate) {
        let eps = self.settings.epsilon;

        if let Some(cancel) = self.cancel_price_d {
            if self.direction.counter_beyond(price, cancel, eps) {
                self.invalidate("price crossed the D cancel price", index);
                return;
            }
        }

        if self.combinator.prune(price, eps) == 0 {
            self.invalidate("all XD/BD combos pruned", index);
            return;
        }

        if let Some(candidate) = self.d_candidate {
            if !self.direction.counter_beyond(price, candidate.price, eps) {
                return;
            }
        }

        let Some(combo) = self.combinator.find_entry(price, eps) else {
            return;
        };

        let point = self.point(price, index, bar);
        if gate.accept(self, &point, bar) {
            self.form(point, combo);
        } else {
            self.d_candidate = Some(point);
        }
    }

    fn form(&mut self, d: BarPoint, combo: LevelCombo) {
        let (Some(b), Some(c)) = (self.b, self.c) else {
            self.invalidate("D resolved without B and C", d.bar_index);
            return;
        };

        self.ratios.xd = Some(SegmentRatio {
            ideal: combo.xd.ratio,
            actual: (self.a.price - d.price).abs() / self.length,
        });
        self.ratios.bd = Some(SegmentRatio {
            ideal: combo.bd.ratio,
            actual: (c.price - d.price).abs() / (b.price - c.price).abs(),
        });
        self.d = Some(d);
        self.state = ProjectionState::PatternFormed;

        debug!(
            pattern = %self.template.pattern_type,
            bull = self.is_bull(),
            d = d.price,
            d_index = d.bar_index,
            "pattern formed"
        );
    }

    fn invalidate(&mut self, reason: &str, index: usize) -> ProjectionState {
        debug!(
            pattern = %self.template.pattern_type,
            x_index = self.x.bar_index,
            a_index = self.a.bar_index,
            index,
            reason,
            "projection invalid"
        );
        self.state = ProjectionState::Invalid;
        self.state
    }

    fn point(&self, price: f64, index: usize, bar: &Bar) -> BarPoint {
        BarPoint::new(price, index, bar.open_time, self.x.timeframe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timeframe;
    use crate::patterns::template::{PatternType, TemplateTable};
    use chrono::{Duration, TimeZone, Utc};

    fn time(i: usize) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(i as i64)
    }

    fn point(price: f64, i: usize) -> BarPoint {
        BarPoint::new(price, i, time(i), Timeframe::H1)
    }

    fn bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            open_time: time(i),
            open,
            high,
            low,
            close,
            volume: 0.0,
        }
    }

    fn gartley() -> PatternProjection {
        let template = TemplateTable::standard().get(PatternType::Gartley).unwrap();
        let settings = ProjectionSettings {
            wick_allowance: 0.05,
            epsilon: 1e-9,
        };
        PatternProjection::new(template, point(100.0, 0), point(110.0, 10), settings)
    }

    #[test]
    fn construction_fixes_direction_and_cancel_a() {
        let p = gartley();
        assert!(p.is_bull());
        assert_eq!(p.state(), ProjectionState::Tracking);
        assert_eq!(p.length(), 10.0);
        // Most extreme AC boundary: X + L * 0.886 * 1.05.
        assert!((p.cancel_price_a() - 109.303).abs() < 1e-9);
    }

    #[test]
    fn zero_length_swing_is_invalid() {
        let template = TemplateTable::standard().get(PatternType::Gartley).unwrap();
        let p = PatternProjection::new(
            template,
            point(100.0, 0),
            point(100.0, 5),
            ProjectionSettings::default(),
        );
        assert_eq!(p.state(), ProjectionState::Invalid);
    }

    #[test]
    fn bars_before_a_are_ignored() {
        let mut p = gartley();
        assert_eq!(p.update(5, &bar(5, 90.0, 120.0, 80.0, 95.0)), ProjectionState::Tracking);
        assert!(p.b_alternate().is_none());
    }

    #[test]
    fn b_resolves_inside_xb_band() {
        let mut p = gartley();
        p.update(11, &bar(11, 109.0, 109.2, 106.0, 106.5));
        assert!(p.b().is_none());
        assert_eq!(p.b_alternate().unwrap().price, 106.0);

        p.update(12, &bar(12, 106.5, 106.8, 103.8, 104.0));
        let b = p.b().unwrap();
        assert_eq!((b.price, b.bar_index), (103.8, 12));
        let xb = p.ratios().xb.unwrap();
        assert_eq!(xb.ideal, 0.618);
        assert!((xb.actual - 0.62).abs() < 1e-9);
    }

    #[test]
    fn b_breach_discards_b() {
        let mut p = gartley();
        p.update(11, &bar(11, 109.0, 109.0, 103.8, 104.0));
        assert!(p.b().is_some());
        p.update(12, &bar(12, 104.0, 104.5, 103.0, 103.2));
        assert!(p.b().is_none());
        assert_eq!(p.b_alternate().unwrap().price, 103.0);
        assert_eq!(p.state(), ProjectionState::Tracking);
    }

    #[test]
    fn crossing_x_before_c_invalidates() {
        let mut p = gartley();
        p.update(11, &bar(11, 109.0, 109.0, 103.8, 104.0));
        assert_eq!(p.update(12, &bar(12, 104.0, 104.2, 99.5, 99.8)), ProjectionState::Invalid);
    }

    #[test]
    fn running_past_a_before_b_invalidates() {
        let mut p = gartley();
        assert_eq!(p.update(11, &bar(11, 109.0, 110.5, 108.0, 110.0)), ProjectionState::Invalid);
    }

    #[test]
    fn c_requires_bar_after_b_and_rebuilds_combos() {
        let mut p = gartley();
        // B and a high inside the 0.618 AC band on the same bar: C must wait.
        p.update(11, &bar(11, 106.3, 106.3, 103.8, 104.0));
        assert!(p.c().is_none());

        assert_eq!(
            p.update(12, &bar(12, 104.0, 106.2, 104.0, 106.0)),
            ProjectionState::ProjectionReady
        );
        assert_eq!(p.c().unwrap().price, 106.2);
        assert_eq!(p.ratios().ac.unwrap().ideal, 0.618);
        assert!((p.cancel_price_d().unwrap() - 102.12264).abs() < 1e-9);
        assert_eq!(p.live_combos().len(), 1);
    }

    #[test]
    fn higher_c_supersedes_and_gap_reverts_to_tracking() {
        let mut p = gartley();
        p.update(11, &bar(11, 108.0, 108.0, 103.55, 104.0));
        p.update(12, &bar(12, 104.0, 105.2, 104.0, 105.0));
        // 105.2 sits in the 0.5 band [104.75, 105.25].
        assert_eq!(p.state(), ProjectionState::ProjectionReady);
        assert_eq!(p.ratios().ac.unwrap().ideal, 0.5);

        // 105.5 is past C but between the 0.5 and 0.618 bands.
        p.update(13, &bar(13, 105.0, 105.5, 104.6, 105.0));
        assert_eq!(p.state(), ProjectionState::Tracking);
        assert!(p.c().is_none());
        assert!(p.live_combos().is_empty());
        assert_eq!(p.b().unwrap().price, 103.55);

        p.update(14, &bar(14, 105.0, 106.2, 104.8, 106.0));
        assert_eq!(p.state(), ProjectionState::ProjectionReady);
        assert_eq!(p.c().unwrap().price, 106.2);
        assert_eq!(p.ratios().ac.unwrap().ideal, 0.618);
    }

    #[test]
    fn retrace_past_b_outside_band_drops_b_when_c_is_superseded() {
        let mut p = gartley();
        p.update(11, &bar(11, 108.0, 108.0, 103.8, 104.0));
        p.update(12, &bar(12, 104.0, 106.2, 104.0, 106.0));
        assert_eq!(p.state(), ProjectionState::ProjectionReady);

        // Below B and the XB band, still above the D cancel price.
        p.update(13, &bar(13, 106.0, 106.1, 103.0, 103.2));
        assert_eq!(p.state(), ProjectionState::ProjectionReady);
        assert_eq!(p.b_alternate().unwrap().price, 103.0);

        p.update(14, &bar(14, 103.2, 106.4, 103.1, 106.3));
        assert_eq!(p.state(), ProjectionState::Tracking);
        assert!(p.b().is_none());
        assert!(p.c().is_none());
        assert!(p.ratios().xb.is_none());

        // Inside the old combo, but there is no B any more.
        assert_eq!(p.update(15, &bar(15, 106.3, 106.3, 102.3, 102.5)), ProjectionState::Tracking);
        assert!(p.d().is_none());
    }

    #[test]
    fn retrace_past_b_inside_band_becomes_new_b() {
        let mut p = gartley();
        p.update(11, &bar(11, 108.0, 108.0, 104.1, 104.3));
        p.update(12, &bar(12, 104.3, 106.4, 104.3, 106.2));
        assert_eq!(p.c().unwrap().price, 106.4);

        p.update(13, &bar(13, 106.2, 106.3, 103.6, 103.8));
        assert_eq!(p.b().unwrap().price, 104.1);

        p.update(14, &bar(14, 103.8, 106.48, 103.7, 106.3));
        assert_eq!(p.state(), ProjectionState::ProjectionReady);
        let b = p.b().unwrap();
        assert_eq!((b.price, b.bar_index), (103.6, 13));
        assert!((p.ratios().xb.unwrap().actual - 0.64).abs() < 1e-9);
        assert_eq!(p.c().unwrap().price, 106.48);
        // BC = 2.88: the 1.41 and 1.618 BD bands both overlap XD 0.786.
        assert_eq!(p.live_combos().len(), 2);
        assert!((p.cancel_price_d().unwrap() - 101.747).abs() < 1e-9);

        assert_eq!(
            p.update(15, &bar(15, 106.3, 106.35, 102.3, 102.4)),
            ProjectionState::PatternFormed
        );
        assert_eq!(p.ratios().bd.unwrap().ideal, 1.41);
        assert!((p.ratios().bd.unwrap().actual - 4.18 / 2.88).abs() < 1e-9);
    }

    #[test]
    fn crossing_cancel_price_a_invalidates() {
        let mut p = gartley();
        p.update(11, &bar(11, 108.0, 108.0, 103.8, 104.0));
        p.update(12, &bar(12, 104.0, 106.2, 104.0, 106.0));
        assert_eq!(p.update(13, &bar(13, 106.0, 109.4, 105.0, 109.0)), ProjectionState::Invalid);
    }

    #[test]
    fn d_forms_inside_combo_then_is_frozen() {
        let mut p = gartley();
        p.update(11, &bar(11, 108.0, 108.0, 103.8, 104.0));
        p.update(12, &bar(12, 104.0, 106.2, 104.0, 106.0));
        p.update(13, &bar(13, 106.0, 106.1, 103.0, 103.2));
        assert_eq!(p.state(), ProjectionState::ProjectionReady);

        let state = p.update(14, &bar(14, 103.2, 103.4, 102.3, 102.8));
        assert_eq!(state, ProjectionState::PatternFormed);
        let d = p.d().unwrap();
        assert_eq!((d.price, d.bar_index), (102.3, 14));
        let xd = p.ratios().xd.unwrap();
        assert_eq!(xd.ideal, 0.786);
        assert!((xd.actual - 0.77).abs() < 1e-9);
        let bd = p.ratios().bd.unwrap();
        assert_eq!(bd.ideal, 1.618);
        assert!((bd.actual - 3.9 / 2.4).abs() < 1e-9);

        let frozen = p.clone();
        assert_eq!(
            p.update(15, &bar(15, 102.8, 120.0, 90.0, 95.0)),
            ProjectionState::PatternFormed
        );
        assert_eq!(p.d(), frozen.d());
        assert_eq!(p.c(), frozen.c());
    }

    #[test]
    fn gap_through_combo_invalidates() {
        let mut p = gartley();
        p.update(11, &bar(11, 108.0, 108.0, 103.8, 104.0));
        p.update(12, &bar(12, 104.0, 106.2, 104.0, 106.0));
        assert_eq!(p.update(13, &bar(13, 106.0, 106.0, 101.9, 102.0)), ProjectionState::Invalid);
    }

    struct RejectAbove(f64);

    impl DPointGate for RejectAbove {
        fn accept(&self, _p: &PatternProjection, d: &BarPoint, _bar: &Bar) -> bool {
            d.price <= self.0
        }
    }

    #[test]
    fn vetoed_candidate_requires_improvement() {
        let mut p = gartley();
        let gate = RejectAbove(102.2);
        p.update_with_gate(11, &bar(11, 108.0, 108.0, 103.8, 104.0), &gate);
        p.update_with_gate(12, &bar(12, 104.0, 106.2, 104.0, 106.0), &gate);

        p.update_with_gate(13, &bar(13, 106.0, 106.0, 102.4, 102.6), &gate);
        assert_eq!(p.state(), ProjectionState::ProjectionReady);
        assert_eq!(p.d_candidate().unwrap().price, 102.4);

        // Shallower than the vetoed candidate: ignored.
        p.update_with_gate(14, &bar(14, 102.6, 103.0, 102.45, 102.9), &gate);
        assert_eq!(p.d_candidate().unwrap().price, 102.4);

        p.update_with_gate(15, &bar(15, 102.9, 103.0, 102.15, 102.5), &gate);
        assert_eq!(p.state(), ProjectionState::PatternFormed);
        assert_eq!(p.d().unwrap().price, 102.15);
    }

    #[test]
    fn repeated_index_is_ignored() {
        let mut p = gartley();
        p.update(11, &bar(11, 108.0, 108.0, 103.8, 104.0));
        let before = p.clone();
        p.update(11, &bar(11, 100.0, 100.0, 50.0, 60.0));
        assert_eq!(p.state(), before.state());
        assert_eq!(p.b(), before.b());
    }

    #[test]
    fn resolve_and_invalidate_c_transitions() {
        let mut p = gartley();
        p.update(11, &bar(11, 108.0, 108.0, 103.8, 104.0));
        let level = p.ac_levels()[2];
        assert_eq!(p.resolve_c(point(106.2, 12), level), ProjectionState::ProjectionReady);
        assert!(p.cancel_price_d().is_some());
        assert_eq!(p.invalidate_c(), ProjectionState::Tracking);
        assert!(p.cancel_price_d().is_none());
        assert!(p.live_combos().is_empty());
    }

    #[test]
    fn shark_tracks_b_as_running_extremum() {
        let template = TemplateTable::standard().get(PatternType::Shark).unwrap();
        let mut p = PatternProjection::new(
            template,
            point(100.0, 0),
            point(110.0, 10),
            ProjectionSettings {
                wick_allowance: 0.05,
                epsilon: 1e-9,
            },
        );
        p.update(11, &bar(11, 109.0, 109.0, 107.0, 107.5));
        assert_eq!(p.b().unwrap().price, 107.0);
        p.update(12, &bar(12, 107.5, 108.0, 104.0, 104.5));
        assert_eq!(p.b().unwrap().price, 104.0);
        assert_eq!(p.xb_levels()[0].ratio, 0.0);
    }
}
