//! Harmonix Core — harmonic XABCD pattern detection over OHLC bar streams.
//!
//! This crate contains:
//! - Domain types (bars, bar points, swing direction, timeframes)
//! - Ratio templates and the tolerance-banded levels built from them
//! - The per-swing projection state machine and its XD/BD combinator
//! - A pivot-driven candidate locator that finalizes formed patterns
//! - The orchestrator that filters patterns and drives the signal lifecycle
//! - Indicators and filters (supertrend regime, awesome-oscillator divergence)

pub mod bars;
pub mod config;
pub mod domain;
pub mod error;
pub mod filters;
pub mod indicators;
pub mod locator;
pub mod orchestrator;
pub mod patterns;

pub use bars::BarSeries;
pub use config::DetectorConfig;
pub use locator::{CandidateLocator, SwingLocator};
pub use orchestrator::{PatternOrchestrator, SignalEvent};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed across threads by the batch runner.
    ///
    /// Each symbol gets its own locator and orchestrator, so these must be Send.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarPoint>();
        require_sync::<domain::BarPoint>();
        require_send::<BarSeries>();
        require_sync::<BarSeries>();
        require_send::<patterns::PatternTemplate>();
        require_sync::<patterns::PatternTemplate>();
        require_send::<patterns::FinalizedPattern>();
        require_sync::<patterns::FinalizedPattern>();
        require_send::<patterns::PatternProjection>();
        require_send::<SwingLocator>();
        require_send::<PatternOrchestrator<SwingLocator>>();
        require_send::<SignalEvent>();
        require_sync::<SignalEvent>();
        require_send::<DetectorConfig>();
        require_sync::<DetectorConfig>();
    }
}
