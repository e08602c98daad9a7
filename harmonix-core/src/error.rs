//! Error types for the harmonix core.
//!
//! Steady-state pattern processing does not return errors: a projection that
//! cannot complete becomes `Invalid`, a rejected pattern is logged and dropped.
//! These types cover construction-time failures only.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Bar series construction failures.
#[derive(Debug, Error, PartialEq)]
pub enum BarError {
    #[error("bar {index} opens at {current} which is not after the previous bar at {previous}")]
    NonMonotonicTime {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("bar {index} has inconsistent OHLC values")]
    InsaneBar { index: usize },
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to encode config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A finalized pattern that cannot be traded safely.
#[derive(Debug, Error, PartialEq)]
pub enum PatternError {
    #[error("pattern level '{0}' is not a finite number")]
    NonFinite(&'static str),

    #[error("stop loss and take profit coincide (range {0})")]
    ZeroRange(f64),

    #[error("stop loss {stop_loss} is on the take-profit side of D {d}")]
    StopOnWrongSide { stop_loss: f64, d: f64 },

    #[error("take profit {take_profit} is on the stop side of D {d}")]
    TargetOnWrongSide { take_profit: f64, d: f64 },
}
