//! Fragmentation tree metrics and lipid classification payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Summary metrics of a computed fragmentation tree.
///
/// Tree construction happens upstream; only the values the summaries need are
/// kept here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentationTree {
    /// Number of explained peaks.
    pub num_vertices: usize,
    /// Fraction of the total intensity explained by the tree.
    pub explained_intensity: f64,
    /// Median signed mass error of the fragment peaks.
    pub median_mass_deviation_ppm: f64,
    /// Median absolute mass error of the fragment peaks.
    pub median_abs_mass_deviation_ppm: f64,
    /// Theoretical m/z of the root ion.
    pub root_ion_mass: f64,
}

impl FragmentationTree {
    /// Mass error of the measured precursor against the tree root, in ppm.
    #[must_use]
    pub fn precursor_mass_error_ppm(&self, measured_ion_mass: f64) -> Option<f64> {
        if !measured_ion_mass.is_finite() || self.root_ion_mass <= 0.0 {
            return None;
        }
        Some((measured_ion_mass - self.root_ion_mass) / self.root_ion_mass * 1e6)
    }
}

/// Lipid class annotation of a formula candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LipidSpecies(String);

impl LipidSpecies {
    /// Wraps a lipid class name.
    #[must_use]
    pub fn new(class: impl Into<String>) -> Self {
        Self(class.into())
    }
}

impl fmt::Display for LipidSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(root: f64) -> FragmentationTree {
        FragmentationTree {
            num_vertices: 5,
            explained_intensity: 0.8,
            median_mass_deviation_ppm: 1.0,
            median_abs_mass_deviation_ppm: 1.5,
            root_ion_mass: root,
        }
    }

    #[test]
    fn precursor_error_in_ppm() {
        let err = tree(200.0).precursor_mass_error_ppm(200.0002).unwrap();
        assert!((err - 1.0).abs() < 1e-6);
    }

    #[test]
    fn precursor_error_requires_measured_mass() {
        assert!(tree(200.0).precursor_mass_error_ppm(f64::NAN).is_none());
        assert!(tree(0.0).precursor_mass_error_ppm(200.0).is_none());
    }
}
