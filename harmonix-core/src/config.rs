//! Detector configuration.
//!
//! Loaded from TOML; every field has a default so a partial file (or an empty
//! one) is valid. `fingerprint()` hashes the canonical JSON form with BLAKE3 so
//! two runs can be checked for identical settings.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::patterns::PatternType;

/// Candidate locator settings: swing search, ratio tolerances, trade levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// How many bars back an X candidate may sit.
    pub bars_depth: usize,
    /// Minimum accuracy score in `[0, 1]`.
    pub accuracy: f64,
    /// One projection set is tracked per allowance.
    pub wick_allowances: Vec<f64>,
    pub patterns: Vec<PatternType>,
    /// Bars on each side a pivot must dominate.
    pub pivot_period: usize,
    pub sl_ratio: f64,
    pub tp1_ratio: f64,
    pub tp2_ratio: f64,
    /// Largest |close - SL| / |close - TP1| accepted at D.
    pub max_sl_tp_ratio: f64,
    /// Instrument price increment; comparisons use half of it as tolerance.
    pub tick_size: f64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            bars_depth: 100,
            accuracy: 0.8,
            wick_allowances: vec![0.175],
            patterns: PatternType::ALL.to_vec(),
            pivot_period: 1,
            sl_ratio: 0.272,
            tp1_ratio: 0.382,
            tp2_ratio: 0.618,
            max_sl_tp_ratio: 2.0,
            tick_size: 0.00001,
        }
    }
}

impl LocatorConfig {
    pub fn epsilon(&self) -> f64 {
        self.tick_size / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendFilterConfig {
    pub enabled: bool,
    pub period: usize,
    pub multiplier: f64,
}

impl Default for TrendFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: 10,
            multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DivergenceConfig {
    /// Run the finder and attach what it reports.
    pub enabled: bool,
    /// Reject patterns without a qualifying divergence.
    pub required: bool,
    pub fast: usize,
    pub slow: usize,
}

impl Default for DivergenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            required: false,
            fast: 5,
            slow: 34,
        }
    }
}

/// Acceptance filters and signal lifecycle settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Fraction of the entry→TP distance after which the stop moves to entry.
    pub breakeven_ratio: Option<f64>,
    /// Reject when less than this fraction of the SL..TP1 range is left at entry.
    pub min_profit_ratio: Option<f64>,
    /// Reject when the D bar closes within 10% of its counter extreme.
    pub reject_strength_bar: bool,
    pub trend_filter: TrendFilterConfig,
    pub divergence: DivergenceConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub locator: LocatorConfig,
    pub orchestrator: OrchestratorConfig,
}

impl DetectorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: DetectorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.locator;
        if l.bars_depth == 0 {
            return Err(invalid("locator.bars_depth", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&l.accuracy) {
            return Err(invalid("locator.accuracy", "must be within [0, 1]"));
        }
        if l.wick_allowances.is_empty() {
            return Err(invalid("locator.wick_allowances", "must not be empty"));
        }
        if let Some(w) = l.wick_allowances.iter().find(|w| !(0.0..=1.0).contains(*w)) {
            return Err(invalid("locator.wick_allowances", format!("{w} is outside [0, 1]")));
        }
        if l.patterns.is_empty() {
            return Err(invalid("locator.patterns", "must name at least one pattern"));
        }
        if l.pivot_period == 0 {
            return Err(invalid("locator.pivot_period", "must be > 0"));
        }
        for (field, v) in [
            ("locator.sl_ratio", l.sl_ratio),
            ("locator.tp1_ratio", l.tp1_ratio),
            ("locator.tp2_ratio", l.tp2_ratio),
            ("locator.max_sl_tp_ratio", l.max_sl_tp_ratio),
            ("locator.tick_size", l.tick_size),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(invalid(field, format!("{v} must be a positive number")));
            }
        }

        let o = &self.orchestrator;
        if let Some(r) = o.breakeven_ratio {
            if !(r > 0.0 && r < 1.0) {
                return Err(invalid("orchestrator.breakeven_ratio", "must be within (0, 1)"));
            }
        }
        if let Some(r) = o.min_profit_ratio {
            if !(0.0..=1.0).contains(&r) {
                return Err(invalid("orchestrator.min_profit_ratio", "must be within [0, 1]"));
            }
        }
        if o.trend_filter.period == 0 || o.trend_filter.multiplier <= 0.0 {
            return Err(invalid(
                "orchestrator.trend_filter",
                "period and multiplier must be positive",
            ));
        }
        if o.divergence.fast == 0 || o.divergence.slow <= o.divergence.fast {
            return Err(invalid("orchestrator.divergence", "requires 0 < fast < slow"));
        }
        if o.divergence.required && !o.divergence.enabled {
            return Err(invalid(
                "orchestrator.divergence.required",
                "requires divergence.enabled",
            ));
        }
        Ok(())
    }

    /// BLAKE3 hex digest of the canonical JSON serialization.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = DetectorConfig::from_toml_str("").unwrap();
        assert_eq!(config, DetectorConfig::default());
        assert_eq!(config.locator.patterns.len(), 8);
        assert!(config.orchestrator.breakeven_ratio.is_none());
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let toml = r#"
            [locator]
            accuracy = 0.7
            patterns = ["gartley", "deep_crab"]

            [orchestrator]
            breakeven_ratio = 0.5

            [orchestrator.trend_filter]
            enabled = true
        "#;
        let config = DetectorConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.locator.accuracy, 0.7);
        assert_eq!(
            config.locator.patterns,
            vec![PatternType::Gartley, PatternType::DeepCrab]
        );
        assert_eq!(config.locator.bars_depth, 100);
        assert_eq!(config.orchestrator.breakeven_ratio, Some(0.5));
        assert!(config.orchestrator.trend_filter.enabled);
        assert_eq!(config.orchestrator.trend_filter.period, 10);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = DetectorConfig::from_toml_str("[locator]\nwick_allowances = [1.5]").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "locator.wick_allowances",
                ..
            }
        ));

        let err =
            DetectorConfig::from_toml_str("[orchestrator]\nbreakeven_ratio = 1.0").unwrap_err();
        assert!(err.to_string().contains("breakeven_ratio"));

        let mut config = DetectorConfig::default();
        config.orchestrator.divergence.required = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_pattern_is_a_parse_error() {
        let err = DetectorConfig::from_toml_str("[locator]\npatterns = [\"wolfe\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip_preserves_config() {
        let mut config = DetectorConfig::default();
        config.orchestrator.breakeven_ratio = Some(0.4);
        let text = config.to_toml_string().unwrap();
        assert_eq!(DetectorConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn fingerprint_is_deterministic_and_sensitive() {
        let a = DetectorConfig::default();
        let mut b = DetectorConfig::default();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
        b.locator.accuracy = 0.75;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }
}
