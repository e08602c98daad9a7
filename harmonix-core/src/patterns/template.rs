//! Harmonic pattern templates.
//!
//! Each template lists the Fibonacci ratios allowed for the XB, XD, BD and AC
//! segments. Ratio ranges are expressed as slices of `FIB_LEVELS`, so every
//! template draws from the same ladder in ascending order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The Fibonacci ladder all template ranges are cut from.
pub const FIB_LEVELS: [f64; 17] = [
    0.236, 0.382, 0.5, 0.618, 0.707, 0.786, 0.886, 1.0, 1.13, 1.272, 1.41, 1.618, 2.0, 2.24,
    2.618, 3.14, 3.618,
];

/// All ladder values within `[min, max]`, ascending.
pub fn fib_range(min: f64, max: f64) -> Vec<f64> {
    const TOL: f64 = 1e-9;
    FIB_LEVELS
        .iter()
        .copied()
        .filter(|&r| r >= min - TOL && r <= max + TOL)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Gartley,
    Butterfly,
    Shark,
    Crab,
    DeepCrab,
    Bat,
    AltBat,
    Cypher,
}

impl PatternType {
    pub const ALL: [PatternType; 8] = [
        PatternType::Gartley,
        PatternType::Butterfly,
        PatternType::Shark,
        PatternType::Crab,
        PatternType::DeepCrab,
        PatternType::Bat,
        PatternType::AltBat,
        PatternType::Cypher,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PatternType::Gartley => "gartley",
            PatternType::Butterfly => "butterfly",
            PatternType::Shark => "shark",
            PatternType::Crab => "crab",
            PatternType::DeepCrab => "deep_crab",
            PatternType::Bat => "bat",
            PatternType::AltBat => "alt_bat",
            PatternType::Cypher => "cypher",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase().replace('-', "_");
        PatternType::ALL
            .iter()
            .copied()
            .find(|p| p.name() == lower)
            .ok_or_else(|| format!("unknown pattern type '{s}'"))
    }
}

/// Which leg sizes the stop and targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupType {
    /// Levels scale with |A - D|.
    AdConfirmed,
    /// Levels scale with |C - D|.
    CdConfirmed,
}

/// Ratio constraints of one harmonic pattern.
///
/// An empty `xb` means the template places no ratio constraint on B.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternTemplate {
    pub pattern_type: PatternType,
    pub xb: Vec<f64>,
    pub xd: Vec<f64>,
    pub bd: Vec<f64>,
    pub ac: Vec<f64>,
    pub setup: SetupType,
}

impl PatternTemplate {
    pub fn has_xb(&self) -> bool {
        !self.xb.is_empty()
    }

    fn standard(pattern_type: PatternType) -> Self {
        use PatternType::*;
        use SetupType::*;

        let (xb, xd, bd, ac, setup) = match pattern_type {
            Gartley => (
                vec![0.618],
                vec![0.786],
                fib_range(1.13, 1.618),
                fib_range(0.382, 0.886),
                AdConfirmed,
            ),
            Butterfly => (
                vec![0.786],
                fib_range(1.27, 1.41),
                fib_range(1.618, 2.24),
                fib_range(0.382, 0.886),
                AdConfirmed,
            ),
            Shark => (
                Vec::new(),
                fib_range(0.886, 1.13),
                fib_range(1.618, 2.24),
                fib_range(1.13, 1.618),
                AdConfirmed,
            ),
            Crab => (
                fib_range(0.382, 0.618),
                vec![1.618],
                fib_range(2.618, 3.618),
                fib_range(0.382, 0.886),
                AdConfirmed,
            ),
            DeepCrab => (
                vec![0.886],
                vec![1.618],
                fib_range(2.0, 3.618),
                fib_range(0.382, 0.886),
                AdConfirmed,
            ),
            Bat => (
                fib_range(0.382, 0.5),
                vec![0.886],
                fib_range(1.618, 2.618),
                fib_range(0.382, 0.886),
                AdConfirmed,
            ),
            AltBat => (
                vec![0.382],
                vec![1.13],
                fib_range(2.0, 3.618),
                fib_range(0.382, 0.886),
                AdConfirmed,
            ),
            Cypher => (
                fib_range(0.382, 0.618),
                vec![0.786],
                fib_range(1.272, 2.0),
                fib_range(1.13, 1.41),
                CdConfirmed,
            ),
        };

        Self {
            pattern_type,
            xb,
            xd,
            bd,
            ac,
            setup,
        }
    }
}

/// Immutable set of templates, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct TemplateTable {
    templates: Vec<Arc<PatternTemplate>>,
}

impl TemplateTable {
    /// The eight standard harmonic templates.
    pub fn standard() -> Self {
        Self {
            templates: PatternType::ALL
                .iter()
                .map(|&t| Arc::new(PatternTemplate::standard(t)))
                .collect(),
        }
    }

    /// Table with custom templates; later entries replace earlier ones of the same type.
    pub fn from_templates(templates: impl IntoIterator<Item = PatternTemplate>) -> Self {
        let mut table: Vec<Arc<PatternTemplate>> = Vec::new();
        for template in templates {
            table.retain(|t| t.pattern_type != template.pattern_type);
            table.push(Arc::new(template));
        }
        Self { templates: table }
    }

    pub fn get(&self, pattern_type: PatternType) -> Option<Arc<PatternTemplate>> {
        self.templates
            .iter()
            .find(|t| t.pattern_type == pattern_type)
            .cloned()
    }

    /// Templates for the requested types, in table order.
    pub fn select(&self, types: &[PatternType]) -> Vec<Arc<PatternTemplate>> {
        self.templates
            .iter()
            .filter(|t| types.contains(&t.pattern_type))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PatternTemplate>> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fib_range_is_inclusive_and_ascending() {
        assert_eq!(fib_range(1.13, 1.618), vec![1.13, 1.272, 1.41, 1.618]);
        assert_eq!(fib_range(0.382, 0.5), vec![0.382, 0.5]);
        // 1.27 is not on the ladder; 1.272 is the first value above it.
        assert_eq!(fib_range(1.27, 1.41), vec![1.272, 1.41]);
    }

    #[test]
    fn standard_table_has_all_types() {
        let table = TemplateTable::standard();
        assert_eq!(table.len(), 8);
        for t in PatternType::ALL {
            assert_eq!(table.get(t).unwrap().pattern_type, t);
        }
    }

    #[test]
    fn gartley_ratios() {
        let g = TemplateTable::standard().get(PatternType::Gartley).unwrap();
        assert_eq!(g.xb, vec![0.618]);
        assert_eq!(g.xd, vec![0.786]);
        assert_eq!(g.ac, vec![0.382, 0.5, 0.618, 0.707, 0.786, 0.886]);
        assert_eq!(g.setup, SetupType::AdConfirmed);
    }

    #[test]
    fn only_shark_lacks_xb_and_only_cypher_confirms_at_cd() {
        let table = TemplateTable::standard();
        for t in table.iter() {
            assert_eq!(!t.has_xb(), t.pattern_type == PatternType::Shark);
            assert_eq!(
                t.setup == SetupType::CdConfirmed,
                t.pattern_type == PatternType::Cypher
            );
        }
    }

    #[test]
    fn select_keeps_table_order() {
        let table = TemplateTable::standard();
        let picked = table.select(&[PatternType::Cypher, PatternType::Gartley]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].pattern_type, PatternType::Gartley);
        assert_eq!(picked[1].pattern_type, PatternType::Cypher);
    }

    #[test]
    fn custom_templates_replace_same_type() {
        let mut narrow = PatternTemplate::standard(PatternType::Gartley);
        narrow.ac = vec![0.618];
        let table = TemplateTable::from_templates([
            PatternTemplate::standard(PatternType::Gartley),
            PatternTemplate::standard(PatternType::Bat),
            narrow,
        ]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(PatternType::Gartley).unwrap().ac, vec![0.618]);
        assert!(table.get(PatternType::Crab).is_none());
        assert_eq!(table.select(&PatternType::ALL).len(), 2);
    }

    #[test]
    fn pattern_type_parses() {
        assert_eq!("deep-crab".parse::<PatternType>().unwrap(), PatternType::DeepCrab);
        assert_eq!("ALT_BAT".parse::<PatternType>().unwrap(), PatternType::AltBat);
        assert!("wolfe".parse::<PatternType>().is_err());
    }
}
