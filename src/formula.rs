//! Molecular formula keys and precursor ion types.
//!
//! Formulas are used as identity and grouping keys only. Mass computation
//! and decomposition happen upstream.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

static FORMULA_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn formula_regex() -> Option<&'static Regex> {
    FORMULA_RE
        .get_or_init(|| Regex::new(r"^(?:[A-Z][a-z]?\d*)+$").ok())
        .as_ref()
}

/// A neutral molecular formula in Hill-like notation, e.g. `C6H12O6`.
///
/// # Examples
///
/// ```
/// use formulaspace::MolecularFormula;
///
/// let f = MolecularFormula::parse("C6H12O6").unwrap();
/// assert_eq!(f.as_str(), "C6H12O6");
/// assert!(MolecularFormula::parse("c6").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MolecularFormula(String);

impl MolecularFormula {
    /// Parses and validates a formula string. Surrounding whitespace is ignored.
    pub fn parse(formula: &str) -> Result<Self, ValidationError> {
        let trimmed = formula.trim();
        if !formula_regex().is_some_and(|re| re.is_match(trimmed)) {
            return Err(ValidationError::InvalidFormula {
                formula: formula.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the formula string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MolecularFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MolecularFormula {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MolecularFormula> for String {
    fn from(value: MolecularFormula) -> Self {
        value.0
    }
}

/// Precursor ion type (adduct) tag, e.g. `[M+H]+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IonType(String);

impl IonType {
    /// Creates an ion type tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_element_runs() {
        for ok in ["C6H12O6", "H2O", "C17H19NO3", "Cl2", "C"] {
            assert!(MolecularFormula::parse(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "6C", "c6h12", "C6 H12", "[M+H]+"] {
            assert!(
                matches!(MolecularFormula::parse(bad), Err(ValidationError::InvalidFormula { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn parse_trims_whitespace() {
        let f = MolecularFormula::parse("  C5H10O5 ").unwrap();
        assert_eq!(f.to_string(), "C5H10O5");
    }

    #[test]
    fn serde_rejects_invalid_formula() {
        let ok: MolecularFormula = serde_json::from_str("\"C6H6\"").unwrap();
        assert_eq!(ok.as_str(), "C6H6");
        assert!(serde_json::from_str::<MolecularFormula>("\"benzene\"").is_err());
    }
}
