//! Incremental swing pivot detection.
//!
//! Bar `j` is a high pivot when no bar within `period` bars on either side has
//! a strictly higher high (low pivots mirror). The right side must be complete,
//! so a pivot at `j` is reported once bar `j + period` has been seen.

use crate::bars::BarSeries;
use crate::domain::{BarPoint, SwingDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotKind {
    High,
    Low,
}

impl PivotKind {
    /// The pivot that ends a swing in `direction` (a high ends a bull swing).
    pub fn ending(direction: SwingDirection) -> Self {
        match direction {
            SwingDirection::Bull => PivotKind::High,
            SwingDirection::Bear => PivotKind::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub kind: PivotKind,
    pub point: BarPoint,
}

/// Whether bar `j` is a pivot using only bars up to `upto`.
pub fn is_pivot(bars: &BarSeries, j: usize, period: usize, kind: PivotKind, upto: usize) -> bool {
    if j + period > upto || upto >= bars.len() {
        return false;
    }
    let Some(center) = bars.get(j) else {
        return false;
    };
    let lo = j.saturating_sub(period);
    (lo..=j + period).filter(|&k| k != j).all(|k| match bars.get(k) {
        Some(bar) => match kind {
            PivotKind::High => bar.high <= center.high,
            PivotKind::Low => bar.low >= center.low,
        },
        None => false,
    })
}

#[derive(Debug, Clone)]
pub struct PivotFinder {
    period: usize,
    next_candidate: usize,
}

impl PivotFinder {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "pivot period must be >= 1");
        Self {
            period,
            next_candidate: 0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Pivots newly confirmed once bar `index` is known, oldest first.
    pub fn update(&mut self, bars: &BarSeries, index: usize) -> Vec<Pivot> {
        let mut found = Vec::new();
        let Some(last) = index.checked_sub(self.period) else {
            return found;
        };

        for j in self.next_candidate..=last {
            let Some(bar) = bars.get(j) else {
                break;
            };
            if is_pivot(bars, j, self.period, PivotKind::High, index) {
                found.extend(BarPoint::from_series(bars, j, bar.high).map(|point| Pivot {
                    kind: PivotKind::High,
                    point,
                }));
            }
            if is_pivot(bars, j, self.period, PivotKind::Low, index) {
                found.extend(BarPoint::from_series(bars, j, bar.low).map(|point| Pivot {
                    kind: PivotKind::Low,
                    point,
                }));
            }
        }
        self.next_candidate = self.next_candidate.max(last + 1);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Timeframe};
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

    #[test]
    fn high_and_low_pivots_confirm_after_period() {
        let s = series(&[(10.0, 9.0), (12.0, 11.0), (11.0, 8.0), (13.0, 10.0), (12.0, 11.0)]);
        let mut finder = PivotFinder::new(1);

        assert!(finder.update(&s, 0).is_empty());
        // Bar 0 (low 9) is a low pivot: bar 1 does not undercut it.
        let p = finder.update(&s, 1);
        assert_eq!(p.len(), 1);
        assert_eq!((p[0].kind, p[0].point.bar_index), (PivotKind::Low, 0));

        let p = finder.update(&s, 2);
        assert_eq!(p.len(), 1);
        assert_eq!((p[0].kind, p[0].point.price), (PivotKind::High, 12.0));

        let p = finder.update(&s, 3);
        assert_eq!((p[0].kind, p[0].point.price), (PivotKind::Low, 8.0));

        let p = finder.update(&s, 4);
        assert_eq!((p[0].kind, p[0].point.price), (PivotKind::High, 13.0));
    }

    #[test]
    fn skipped_indices_are_caught_up() {
        let s = series(&[(10.0, 9.0), (12.0, 11.0), (11.0, 8.0), (13.0, 10.0), (12.0, 11.0)]);
        let mut finder = PivotFinder::new(1);
        let p = finder.update(&s, 4);
        assert_eq!(p.len(), 4);
        assert!(finder.update(&s, 4).is_empty());
    }

    #[test]
    fn pivot_check_needs_complete_right_side() {
        let s = series(&[(10.0, 9.0), (12.0, 11.0), (11.0, 8.0)]);
        assert!(is_pivot(&s, 1, 1, PivotKind::High, 2));
        assert!(!is_pivot(&s, 1, 2, PivotKind::High, 2));
        assert!(!is_pivot(&s, 1, 1, PivotKind::Low, 2));
    }
}
