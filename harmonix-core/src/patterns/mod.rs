//! Harmonic pattern geometry.
//!
//! - `template`: the immutable ratio table of the eight supported patterns
//! - `ratio_level`: ratios projected into tolerance-banded prices
//! - `combinator`: XD/BD band intersections that bound D
//! - `projection`: the per-swing state machine resolving B, C and D
//! - `finalized`: completed pattern records consumed by the orchestrator

pub mod combinator;
pub mod finalized;
pub mod projection;
pub mod ratio_level;
pub mod template;

pub use combinator::{LevelCombo, ProjectionCombinator};
pub use finalized::{FinalizedPattern, PatternKey};
pub use projection::{
    AcceptAll, DPointGate, PatternProjection, ProjectionSettings, ProjectionState, RealizedRatios,
    SegmentRatio,
};
pub use ratio_level::{build_ratio_levels, RatioLevel};
pub use template::{fib_range, PatternTemplate, PatternType, SetupType, TemplateTable, FIB_LEVELS};
