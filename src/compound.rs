//! Compound identity and the compound-level container.
//!
//! A compound is one analyzed sample feature. Its [`CompoundId`] is assigned
//! once and never changes; identity is the directory name.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationSet;
use crate::candidate::FormulaResultId;
use crate::error::ValidationError;

/// Stable identifier of a compound.
///
/// Equality and hashing use the directory name only; the remaining fields
/// are descriptive metadata carried into summaries.
///
/// # Examples
///
/// ```
/// use formulaspace::CompoundId;
///
/// let id = CompoundId::new("12_sample", 12).unwrap().with_ion_mass(181.07066);
/// assert_eq!(id.directory_name(), "12_sample");
/// assert_eq!(id.ion_mass(), Some(181.07066));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundId {
    directory_name: String,
    compound_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feature_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ion_mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retention_time_seconds: Option<f64>,
}

impl CompoundId {
    /// Creates a compound id. The directory name must not be blank.
    pub fn new(directory_name: impl Into<String>, compound_index: u32) -> Result<Self, ValidationError> {
        let directory_name = directory_name.into();
        if directory_name.trim().is_empty() {
            return Err(ValidationError::EmptyDirectoryName);
        }
        Ok(Self {
            directory_name,
            compound_index,
            feature_id: None,
            ion_mass: None,
            retention_time_seconds: None,
        })
    }

    /// Sets the upstream feature id.
    #[must_use]
    pub fn with_feature_id(mut self, feature_id: impl Into<String>) -> Self {
        self.feature_id = Some(feature_id.into());
        self
    }

    /// Sets the measured precursor ion m/z.
    #[must_use]
    pub fn with_ion_mass(mut self, ion_mass: f64) -> Self {
        self.ion_mass = Some(ion_mass);
        self
    }

    /// Sets the retention time in seconds.
    #[must_use]
    pub fn with_retention_time(mut self, seconds: f64) -> Self {
        self.retention_time_seconds = Some(seconds);
        self
    }

    /// Directory name, unique within a project.
    #[must_use]
    pub fn directory_name(&self) -> &str {
        &self.directory_name
    }

    /// Numeric index within the project.
    #[must_use]
    pub const fn compound_index(&self) -> u32 {
        self.compound_index
    }

    /// Upstream feature id, if any.
    #[must_use]
    pub fn feature_id(&self) -> Option<&str> {
        self.feature_id.as_deref()
    }

    /// Measured precursor ion m/z, if known.
    #[must_use]
    pub const fn ion_mass(&self) -> Option<f64> {
        self.ion_mass
    }

    /// Retention time in seconds, if known.
    #[must_use]
    pub const fn retention_time_seconds(&self) -> Option<f64> {
        self.retention_time_seconds
    }
}

impl PartialEq for CompoundId {
    fn eq(&self, other: &Self) -> bool {
        self.directory_name == other.directory_name
    }
}

impl Eq for CompoundId {}

impl Hash for CompoundId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.directory_name.hash(state);
    }
}

impl fmt::Display for CompoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.directory_name)
    }
}

/// Raw MS/MS input of a compound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ms2Experiment {
    /// Experiment name.
    pub name: String,
    /// Precursor ion m/z.
    pub precursor_mz: f64,
    /// `(mz, intensity)` pairs of the merged MS1 spectrum.
    #[serde(default)]
    pub ms1_peaks: Vec<(f64, f64)>,
    /// `(mz, intensity)` pairs of the merged MS2 spectrum.
    #[serde(default)]
    pub ms2_peaks: Vec<(f64, f64)>,
}

/// Tool configuration recorded for a compound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpaceConfig {
    /// Flat key/value settings.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

/// A compound with its compound-level components and its candidate index.
///
/// The index maps candidate file names to formula result ids and reflects
/// which candidates the store knows for this compound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundContainer {
    id: CompoundId,
    /// Loaded compound-level components.
    pub annotations: AnnotationSet,
    results: BTreeMap<String, FormulaResultId>,
}

impl CompoundContainer {
    /// A container with nothing loaded and an empty index.
    #[must_use]
    pub fn new(id: CompoundId) -> Self {
        Self {
            id,
            annotations: AnnotationSet::new(),
            results: BTreeMap::new(),
        }
    }

    /// The compound id.
    #[must_use]
    pub const fn id(&self) -> &CompoundId {
        &self.id
    }

    /// Candidate ids known for this compound, in file-name order.
    pub fn results(&self) -> impl Iterator<Item = &FormulaResultId> + '_ {
        self.results.values()
    }

    /// Number of indexed candidates.
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    /// True when `id` is indexed.
    #[must_use]
    pub fn contains(&self, id: &FormulaResultId) -> bool {
        self.results.contains_key(&id.file_name())
    }

    /// Indexes `id`.
    pub fn add_result(&mut self, id: FormulaResultId) {
        self.results.insert(id.file_name(), id);
    }

    /// Removes `id` from the index.
    pub fn remove_result(&mut self, id: &FormulaResultId) -> Option<FormulaResultId> {
        self.results.remove(&id.file_name())
    }

    /// Empties the index.
    pub fn clear_results(&mut self) {
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{IonType, MolecularFormula};

    #[test]
    fn blank_directory_name_is_rejected() {
        assert!(matches!(CompoundId::new("  ", 0), Err(ValidationError::EmptyDirectoryName)));
    }

    #[test]
    fn identity_is_directory_name() {
        let a = CompoundId::new("1_a", 1).unwrap().with_ion_mass(100.0);
        let b = CompoundId::new("1_a", 1).unwrap().with_feature_id("f1");
        assert_eq!(a, b);
        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn container_indexes_results_by_file_name() {
        let id = CompoundId::new("1_a", 1).unwrap();
        let mut c = CompoundContainer::new(id.clone());
        let fid = FormulaResultId::new(
            id,
            MolecularFormula::parse("C6H12O6").unwrap(),
            MolecularFormula::parse("C6H12O6").unwrap(),
            Some(IonType::new("[M+H]+")),
        );
        c.add_result(fid.clone());
        c.add_result(fid.clone());
        assert_eq!(c.result_count(), 1);
        assert!(c.contains(&fid));
        assert_eq!(c.remove_result(&fid), Some(fid));
        assert_eq!(c.result_count(), 0);
    }
}
