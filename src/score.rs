//! Score kinds, score values and the per-candidate score set.
//!
//! Scores are produced by upstream tools. This module only defines how they
//! are stored, ordered and compared.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of score kinds a formula candidate can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    /// Structure identification confidence.
    Confidence,
    /// Best structure candidate score of the fingerprint search.
    TopCsi,
    /// Network-based reranking score.
    Zodiac,
    /// Combined tree and isotope score.
    Sirius,
    /// Fragmentation tree score.
    Tree,
    /// Isotope pattern score.
    Isotope,
}

impl ScoreKind {
    /// Global score priority, highest first. Used to order dynamic columns.
    pub const PRIORITY: [ScoreKind; 6] = [
        Self::Confidence,
        Self::TopCsi,
        Self::Zodiac,
        Self::Sirius,
        Self::Tree,
        Self::Isotope,
    ];

    /// Kinds that never become dynamic summary columns.
    pub const CONFIDENCE_STYLE: [ScoreKind; 2] = [Self::Confidence, Self::TopCsi];

    /// Column name used in summary tables.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Confidence => "ConfidenceScore",
            Self::TopCsi => "CSI:FingerIDScore",
            Self::Zodiac => "ZodiacScore",
            Self::Sirius => "SiriusScore",
            Self::Tree => "TreeScore",
            Self::Isotope => "IsotopeScore",
        }
    }

    /// Returns true for confidence-style kinds excluded from dynamic columns.
    #[must_use]
    pub fn is_confidence_style(self) -> bool {
        Self::CONFIDENCE_STYLE.contains(&self)
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A score value, or the explicit not-available sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScoreValue {
    /// A real score; higher is better.
    Score(f64),
    /// The producing tool did not report this kind.
    NotAvailable,
}

impl ScoreValue {
    /// Wraps a raw score. Non-finite values become `NotAvailable`.
    #[must_use]
    pub fn new(score: f64) -> Self {
        if score.is_finite() {
            Self::Score(score)
        } else {
            Self::NotAvailable
        }
    }

    /// Returns true for the not-available sentinel.
    #[must_use]
    pub const fn is_na(&self) -> bool {
        matches!(self, Self::NotAvailable)
    }

    /// The raw score, if available.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Score(v) => Some(*v),
            Self::NotAvailable => None,
        }
    }

    /// Orders two values so that better values come first.
    ///
    /// Higher is better; any real value beats `NotAvailable`.
    #[must_use]
    pub fn cmp_best_first(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Score(a), Self::Score(b)) => b.total_cmp(a),
            (Self::Score(_), Self::NotAvailable) => Ordering::Less,
            (Self::NotAvailable, Self::Score(_)) => Ordering::Greater,
            (Self::NotAvailable, Self::NotAvailable) => Ordering::Equal,
        }
    }
}

impl fmt::Display for ScoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Score(v) => write!(f, "{v}"),
            Self::NotAvailable => f.write_str("N/A"),
        }
    }
}

/// The score set of one formula candidate.
///
/// A kind missing from the map reads as `NotAvailable`.
///
/// # Examples
///
/// ```
/// use formulaspace::{FormulaScoring, ScoreKind, ScoreValue};
///
/// let scoring = FormulaScoring::new().with(ScoreKind::Sirius, 12.5);
/// assert_eq!(scoring.get(ScoreKind::Sirius), ScoreValue::Score(12.5));
/// assert!(scoring.get(ScoreKind::Zodiac).is_na());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulaScoring {
    scores: BTreeMap<ScoreKind, ScoreValue>,
}

impl FormulaScoring {
    /// An empty score set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, kind: ScoreKind, score: f64) -> Self {
        self.set(kind, ScoreValue::new(score));
        self
    }

    /// Sets or replaces the value of `kind`.
    pub fn set(&mut self, kind: ScoreKind, value: ScoreValue) {
        self.scores.insert(kind, value);
    }

    /// The value of `kind`; `NotAvailable` when absent.
    #[must_use]
    pub fn get(&self, kind: ScoreKind) -> ScoreValue {
        self.scores
            .get(&kind)
            .copied()
            .unwrap_or(ScoreValue::NotAvailable)
    }

    /// Kinds holding a real (non-NA) value.
    pub fn available_kinds(&self) -> impl Iterator<Item = ScoreKind> + '_ {
        self.scores
            .iter()
            .filter(|(_, v)| !v.is_na())
            .map(|(k, _)| *k)
    }

    /// Every stored kind with its value, in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (ScoreKind, ScoreValue)> + '_ {
        self.scores.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_scores_are_na() {
        assert!(ScoreValue::new(f64::NAN).is_na());
        assert!(ScoreValue::new(f64::NEG_INFINITY).is_na());
        assert_eq!(ScoreValue::new(-3.5).as_f64(), Some(-3.5));
    }

    #[test]
    fn display_uses_na_sentinel() {
        assert_eq!(ScoreValue::NotAvailable.to_string(), "N/A");
        assert_eq!(ScoreValue::Score(1.25).to_string(), "1.25");
    }

    #[test]
    fn higher_score_sorts_first() {
        let a = ScoreValue::new(10.0);
        let b = ScoreValue::new(8.0);
        assert_eq!(a.cmp_best_first(&b), Ordering::Less);
        assert_eq!(b.cmp_best_first(&a), Ordering::Greater);
    }

    #[test]
    fn na_sorts_after_any_real_value() {
        let low = ScoreValue::new(-100.0);
        assert_eq!(low.cmp_best_first(&ScoreValue::NotAvailable), Ordering::Less);
        assert_eq!(ScoreValue::NotAvailable.cmp_best_first(&low), Ordering::Greater);
        assert_eq!(
            ScoreValue::NotAvailable.cmp_best_first(&ScoreValue::NotAvailable),
            Ordering::Equal
        );
    }

    #[test]
    fn available_kinds_skips_na() {
        let mut s = FormulaScoring::new().with(ScoreKind::Tree, 4.0);
        s.set(ScoreKind::Isotope, ScoreValue::NotAvailable);
        let kinds: Vec<_> = s.available_kinds().collect();
        assert_eq!(kinds, vec![ScoreKind::Tree]);
    }

    #[test]
    fn priority_lists_confidence_first() {
        assert_eq!(ScoreKind::PRIORITY[0], ScoreKind::Confidence);
        assert!(ScoreKind::TopCsi.is_confidence_style());
        assert!(!ScoreKind::Zodiac.is_confidence_style());
    }
}
