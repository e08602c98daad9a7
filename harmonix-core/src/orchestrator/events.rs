//! Events emitted to execution and reporting layers.

use serde::{Deserialize, Serialize};

use super::signal::OpenSignal;
use crate::domain::BarPoint;
use crate::patterns::{PatternKey, PatternType};

/// A level reached by an open signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelEvent {
    /// The level price, stamped with the bar (or tick) that reached it.
    pub level: BarPoint,
    pub entry: BarPoint,
    pub key: PatternKey,
    pub pattern_type: PatternType,
    pub has_breakeven: bool,
}

impl LevelEvent {
    pub(crate) fn from_signal(signal: &OpenSignal, level: BarPoint) -> Self {
        Self {
            level,
            entry: signal.entry,
            key: signal.key(),
            pattern_type: signal.pattern.pattern_type,
            has_breakeven: signal.has_breakeven,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SignalEvent {
    Enter(OpenSignal),
    TakeProfit(LevelEvent),
    StopLoss(LevelEvent),
    Breakeven(LevelEvent),
}

impl SignalEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SignalEvent::Enter(_) => "enter",
            SignalEvent::TakeProfit(_) => "take_profit",
            SignalEvent::StopLoss(_) => "stop_loss",
            SignalEvent::Breakeven(_) => "breakeven",
        }
    }

    pub fn key(&self) -> PatternKey {
        match self {
            SignalEvent::Enter(signal) => signal.key(),
            SignalEvent::TakeProfit(e) | SignalEvent::StopLoss(e) | SignalEvent::Breakeven(e) => e.key,
        }
    }

    /// Whether this event closes the position.
    pub fn is_close(&self) -> bool {
        matches!(self, SignalEvent::TakeProfit(_) | SignalEvent::StopLoss(_))
    }
}
