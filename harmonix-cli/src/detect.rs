//! Running a detector over a loaded series.

use serde::Serialize;
use tracing::info;

use harmonix_core::bars::BarSeries;
use harmonix_core::config::DetectorConfig;
use harmonix_core::indicators::precompute_indicators;
use harmonix_core::locator::SwingLocator;
use harmonix_core::orchestrator::{PatternOrchestrator, SignalEvent};
use harmonix_core::patterns::TemplateTable;

/// Event counts for one series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub bars: usize,
    pub entries: usize,
    pub take_profits: usize,
    pub stop_losses: usize,
    pub breakevens: usize,
    pub open_at_end: usize,
}

impl RunSummary {
    fn record(&mut self, event: &SignalEvent) {
        match event {
            SignalEvent::Enter(_) => self.entries += 1,
            SignalEvent::TakeProfit(_) => self.take_profits += 1,
            SignalEvent::StopLoss(_) => self.stop_losses += 1,
            SignalEvent::Breakeven(_) => self.breakevens += 1,
        }
    }

    /// Take profits over closed signals, `None` before anything closed.
    pub fn hit_rate(&self) -> Option<f64> {
        let closed = self.take_profits + self.stop_losses;
        (closed > 0).then(|| self.take_profits as f64 / closed as f64)
    }
}

/// Stream `series` bar by bar through a fresh detector; `sink` sees every event.
pub fn run_detector(
    series: &BarSeries,
    config: &DetectorConfig,
    mut sink: impl FnMut(&SignalEvent),
) -> RunSummary {
    let locator = SwingLocator::new(config.locator.clone(), &TemplateTable::standard());
    let mut orchestrator = PatternOrchestrator::from_config(locator, config.orchestrator.clone());
    let indicators = precompute_indicators(series.bars(), &orchestrator.required_indicators());

    let mut summary = RunSummary {
        bars: series.len(),
        ..RunSummary::default()
    };
    for index in 0..series.len() {
        for event in orchestrator.on_bar(series, index, &indicators) {
            summary.record(&event);
            sink(&event);
        }
    }
    summary.open_at_end = orchestrator.open_count();

    info!(
        bars = summary.bars,
        entries = summary.entries,
        tp = summary.take_profits,
        sl = summary.stop_losses,
        "run complete"
    );
    summary
}

/// One-line human description of an event.
pub fn describe(event: &SignalEvent) -> String {
    match event {
        SignalEvent::Enter(s) => format!(
            "{} ENTER {} {} @ {:.5} sl {:.5} tp {:.5} acc {}%{}",
            s.entry.open_time.format("%Y-%m-%d %H:%M"),
            if s.pattern.is_bull() { "long" } else { "short" },
            s.pattern.pattern_type,
            s.entry.price,
            s.stop_loss.price,
            s.take_profit.price,
            s.pattern.accuracy_percent(),
            if s.divergence.is_some() { " div" } else { "" },
        ),
        SignalEvent::TakeProfit(e) | SignalEvent::StopLoss(e) | SignalEvent::Breakeven(e) => format!(
            "{} {} {} @ {:.5} (entry {:.5}){}",
            e.level.open_time.format("%Y-%m-%d %H:%M"),
            event.name().to_uppercase(),
            e.pattern_type,
            e.level.price,
            e.entry.price,
            if e.has_breakeven { " be" } else { "" },
        ),
    }
}
