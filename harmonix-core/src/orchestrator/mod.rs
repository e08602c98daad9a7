//! Signal orchestration: accepting finalized patterns and tracking open positions.
//!
//! Per bar the orchestrator asks its locator for new patterns, filters them,
//! opens a signal at the bar close for each accepted one, then checks every
//! older open signal against the bar's high and low: take profit first, then
//! stop loss, then breakeven.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::bars::BarSeries;
use crate::config::OrchestratorConfig;
use crate::domain::{Bar, BarPoint};
use crate::filters::{AwesomeDivergence, DivergenceFinder, RegimeFilter, SupertrendRegime};
use crate::indicators::{Indicator, IndicatorValues};
use crate::locator::CandidateLocator;
use crate::patterns::FinalizedPattern;

pub mod events;
pub mod signal;

pub use crate::patterns::PatternKey;
pub use events::{LevelEvent, SignalEvent};
pub use signal::OpenSignal;

/// Fraction of the D bar's range its close must keep from the counter extreme.
const STRENGTH_BAR_THRESHOLD: f64 = 0.1;

pub struct PatternOrchestrator<L> {
    locator: L,
    config: OrchestratorConfig,
    regime: Option<Box<dyn RegimeFilter>>,
    divergence: Option<Box<dyn DivergenceFinder>>,
    divergence_required: bool,
    open: BTreeMap<PatternKey, OpenSignal>,
    last_index: Option<usize>,
}

/// Price extremes a pass is evaluated against.
#[derive(Debug, Clone, Copy)]
struct Probe {
    high: f64,
    low: f64,
    index: usize,
    time: DateTime<Utc>,
}

impl<L: CandidateLocator> PatternOrchestrator<L> {
    /// Orchestrator with no regime or divergence filter.
    pub fn new(locator: L, config: OrchestratorConfig) -> Self {
        Self {
            locator,
            config,
            regime: None,
            divergence: None,
            divergence_required: false,
            open: BTreeMap::new(),
            last_index: None,
        }
    }

    /// Filters as enabled in `config`.
    pub fn from_config(locator: L, config: OrchestratorConfig) -> Self {
        let trend = config.trend_filter.clone();
        let div = config.divergence.clone();
        let mut orchestrator = Self::new(locator, config);
        if trend.enabled {
            orchestrator = orchestrator
                .with_regime(Box::new(SupertrendRegime::new(trend.period, trend.multiplier)));
        }
        if div.enabled {
            orchestrator = orchestrator
                .with_divergence(Box::new(AwesomeDivergence::new(div.fast, div.slow)), div.required);
        }
        orchestrator
    }

    pub fn with_regime(mut self, regime: Box<dyn RegimeFilter>) -> Self {
        self.regime = Some(regime);
        self
    }

    /// `required` rejects patterns without a qualifying divergence; otherwise
    /// a found divergence is only attached to the signal.
    pub fn with_divergence(mut self, finder: Box<dyn DivergenceFinder>, required: bool) -> Self {
        self.divergence = Some(finder);
        self.divergence_required = required;
        self
    }

    /// Indicators the configured filters read; precompute these over the bars.
    pub fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        let mut out = Vec::new();
        if let Some(regime) = &self.regime {
            out.extend(regime.indicators());
        }
        if let Some(finder) = &self.divergence {
            out.extend(finder.indicators());
        }
        out
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn open_signals(&self) -> impl Iterator<Item = &OpenSignal> {
        self.open.values()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn is_open(&self, key: &PatternKey) -> bool {
        self.open.contains_key(key)
    }

    /// Process closed bar `index`. Bars must arrive in increasing order;
    /// a repeated or older index is ignored.
    pub fn on_bar(
        &mut self,
        bars: &BarSeries,
        index: usize,
        indicators: &IndicatorValues,
    ) -> Vec<SignalEvent> {
        if self.last_index.is_some_and(|last| index <= last) {
            return Vec::new();
        }
        let Some(bar) = bars.get(index) else {
            return Vec::new();
        };
        self.last_index = Some(index);

        let mut events = Vec::new();
        for pattern in self.locator.find_patterns(bars, index) {
            if let Some(signal) = self.accept(bars, index, bar, pattern, indicators) {
                info!(
                    key = %signal.key(),
                    bull = signal.pattern.is_bull(),
                    entry = signal.entry.price,
                    sl = signal.stop_loss.price,
                    tp = signal.take_profit.price,
                    accuracy = signal.pattern.accuracy_percent(),
                    "enter"
                );
                self.open.insert(signal.key(), signal.clone());
                events.push(SignalEvent::Enter(signal));
            }
        }

        let probe = Probe {
            high: bar.high,
            low: bar.low,
            index,
            time: bar.open_time,
        };
        self.evaluate(probe, &mut events);
        events
    }

    /// Evaluate open signals against a single intrabar price.
    ///
    /// Ticks never open signals. Events are stamped with the bar after the
    /// last processed one, the bar the tick belongs to.
    pub fn on_tick(&mut self, price: f64, time: DateTime<Utc>) -> Vec<SignalEvent> {
        let mut events = Vec::new();
        if !price.is_finite() {
            return events;
        }
        let probe = Probe {
            high: price,
            low: price,
            index: self.last_index.map_or(0, |i| i + 1),
            time,
        };
        self.evaluate(probe, &mut events);
        events
    }

    fn accept(
        &self,
        bars: &BarSeries,
        index: usize,
        bar: &Bar,
        pattern: FinalizedPattern,
        indicators: &IndicatorValues,
    ) -> Option<OpenSignal> {
        let key = pattern.key();
        if self.open.contains_key(&key) {
            debug!(%key, "pattern already open");
            return None;
        }
        if let Err(e) = pattern.validate() {
            warn!(%key, error = %e, "malformed pattern rejected");
            return None;
        }

        let direction = pattern.direction;
        let has_trend_candle = (pattern.c.bar_index + 1..=pattern.d.bar_index)
            .filter_map(|i| bars.get(i))
            .any(|b| direction.agrees_with(b));
        if !has_trend_candle {
            debug!(%key, "no trend candle between C and D");
            return None;
        }

        if self.config.reject_strength_bar {
            if let Some(d_bar) = bars.get(pattern.d.bar_index) {
                if closes_at_counter_extreme(d_bar, pattern.is_bull()) {
                    debug!(%key, "D bar closed at its counter extreme");
                    return None;
                }
            }
        }

        if let Some(regime) = &self.regime {
            let trend = regime.trend(bars, index, indicators);
            if trend.conflicts_with(direction) {
                debug!(%key, filter = regime.name(), ?trend, "regime conflicts");
                return None;
            }
        }

        let mut divergence = None;
        if let Some(finder) = &self.divergence {
            let found = finder
                .find(bars, &pattern, indicators)
                .filter(|div| divergence_is_long_enough(&pattern, div));
            if found.is_none() && self.divergence_required {
                debug!(%key, filter = finder.name(), "no qualifying divergence");
                return None;
            }
            divergence = found;
        }

        if let Some(min) = self.config.min_profit_ratio {
            let left = pattern.profit_ratio(bar.close);
            if left < min {
                debug!(%key, left, min, "too little profit left at entry");
                return None;
            }
        }

        let entry = BarPoint::from_series(bars, index, bar.close)?;
        Some(OpenSignal::open(pattern, entry, divergence))
    }

    fn evaluate(&mut self, probe: Probe, events: &mut Vec<SignalEvent>) {
        let breakeven = self.config.breakeven_ratio;
        let mut closed = Vec::new();

        for (key, signal) in self.open.iter_mut() {
            if signal.entry.bar_index >= probe.index {
                continue;
            }
            let timeframe = signal.entry.timeframe;
            let stamp = move |price: f64| BarPoint::new(price, probe.index, probe.time, timeframe);

            if signal.target_touched(probe.high, probe.low) {
                let level = stamp(signal.take_profit.price);
                info!(%key, price = level.price, breakeven = signal.has_breakeven, "take profit");
                events.push(SignalEvent::TakeProfit(LevelEvent::from_signal(signal, level)));
                closed.push(*key);
            } else if signal.stop_touched(probe.high, probe.low) {
                let level = stamp(signal.stop_loss.price);
                info!(%key, price = level.price, breakeven = signal.has_breakeven, "stop loss");
                events.push(SignalEvent::StopLoss(LevelEvent::from_signal(signal, level)));
                closed.push(*key);
            } else if let Some(ratio) = breakeven {
                if !signal.has_breakeven && signal.breakeven_touched(ratio, probe.high, probe.low) {
                    signal.has_breakeven = true;
                    signal.stop_loss = stamp(signal.entry.price);
                    info!(%key, stop = signal.stop_loss.price, "breakeven");
                    events.push(SignalEvent::Breakeven(LevelEvent::from_signal(
                        signal,
                        signal.stop_loss,
                    )));
                }
            }
        }

        for key in closed {
            self.open.remove(&key);
        }
    }
}

/// The divergence must span at least half of the C → D leg in bars.
fn divergence_is_long_enough(pattern: &FinalizedPattern, divergence: &BarPoint) -> bool {
    let d = pattern.d.bar_index;
    let to_divergence = d.saturating_sub(divergence.bar_index);
    let cd = d.saturating_sub(pattern.c.bar_index);
    to_divergence >= cd / 2
}

/// Close within 10% of the bar range from the extreme against a bull
/// (`is_bull`) or bear trade.
fn closes_at_counter_extreme(bar: &Bar, is_bull: bool) -> bool {
    let range = bar.range();
    if range <= 0.0 {
        return false;
    }
    let extreme = if is_bull { bar.low } else { bar.high };
    (bar.close - extreme).abs() / range < STRENGTH_BAR_THRESHOLD
}
