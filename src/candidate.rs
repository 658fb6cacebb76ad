//! Formula candidates: one scored interpretation of a compound.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationSet;
use crate::compound::CompoundId;
use crate::formula::{IonType, MolecularFormula};
use crate::score::FormulaScoring;
use crate::tree::{FragmentationTree, LipidSpecies};

/// Identifier of one formula candidate.
///
/// The precursor formula is the grouping key for ties: candidates that only
/// differ in how the adduct is explained share it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormulaResultId {
    parent: CompoundId,
    molecular_formula: MolecularFormula,
    precursor_formula: MolecularFormula,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ion_type: Option<IonType>,
}

impl FormulaResultId {
    /// Builds an id; `ion_type` is `None` when the adduct is unknown.
    #[must_use]
    pub fn new(
        parent: CompoundId,
        molecular_formula: MolecularFormula,
        precursor_formula: MolecularFormula,
        ion_type: Option<IonType>,
    ) -> Self {
        Self {
            parent,
            molecular_formula,
            precursor_formula,
            ion_type,
        }
    }

    /// The owning compound.
    #[must_use]
    pub const fn parent(&self) -> &CompoundId {
        &self.parent
    }

    /// The candidate formula.
    #[must_use]
    pub const fn molecular_formula(&self) -> &MolecularFormula {
        &self.molecular_formula
    }

    /// Precursor formula, the tie grouping key.
    #[must_use]
    pub const fn precursor_formula(&self) -> &MolecularFormula {
        &self.precursor_formula
    }

    /// The adduct, if known.
    #[must_use]
    pub const fn ion_type(&self) -> Option<&IonType> {
        self.ion_type.as_ref()
    }

    /// Name of the candidate inside its compound directory.
    #[must_use]
    pub fn file_name(&self) -> String {
        match &self.ion_type {
            Some(ion) => {
                let tag: String = ion.as_str().chars().filter(|c| !c.is_whitespace()).collect();
                format!("{}_{tag}", self.molecular_formula)
            }
            None => self.molecular_formula.to_string(),
        }
    }
}

impl fmt::Display for FormulaResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parent, self.file_name())
    }
}

/// A formula candidate with whatever components are currently loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaResult {
    id: FormulaResultId,
    /// Loaded components.
    pub annotations: AnnotationSet,
}

impl FormulaResult {
    /// A candidate with nothing loaded.
    #[must_use]
    pub fn new(id: FormulaResultId) -> Self {
        Self {
            id,
            annotations: AnnotationSet::new(),
        }
    }

    /// A candidate with the given components.
    #[must_use]
    pub fn with_annotations(id: FormulaResultId, annotations: AnnotationSet) -> Self {
        Self { id, annotations }
    }

    /// The candidate id.
    #[must_use]
    pub const fn id(&self) -> &FormulaResultId {
        &self.id
    }

    /// The score set, if loaded.
    #[must_use]
    pub fn scoring(&self) -> Option<&FormulaScoring> {
        self.annotations.get_as::<FormulaScoring>()
    }

    /// The fragmentation tree, if loaded.
    #[must_use]
    pub fn tree(&self) -> Option<&FragmentationTree> {
        self.annotations.get_as::<FragmentationTree>()
    }

    /// The lipid class, if loaded.
    #[must_use]
    pub fn lipid_species(&self) -> Option<&LipidSpecies> {
        self.annotations.get_as::<LipidSpecies>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::ScoreKind;

    fn fid(ion: Option<&str>) -> FormulaResultId {
        FormulaResultId::new(
            CompoundId::new("3_x", 3).unwrap(),
            MolecularFormula::parse("C6H12O6").unwrap(),
            MolecularFormula::parse("C6H12O6").unwrap(),
            ion.map(IonType::new),
        )
    }

    #[test]
    fn file_name_strips_ion_whitespace() {
        assert_eq!(fid(Some("[M + H]+")).file_name(), "C6H12O6_[M+H]+");
        assert_eq!(fid(None).file_name(), "C6H12O6");
    }

    #[test]
    fn display_includes_compound() {
        assert_eq!(fid(Some("[M+Na]+")).to_string(), "3_x/C6H12O6_[M+Na]+");
    }

    #[test]
    fn typed_accessors_read_annotations() {
        let mut r = FormulaResult::new(fid(None));
        assert!(r.scoring().is_none());
        r.annotations.set(FormulaScoring::new().with(ScoreKind::Tree, 2.0));
        r.annotations.set(LipidSpecies::new("PC"));
        assert!(r.scoring().is_some());
        assert_eq!(r.lipid_species().map(ToString::to_string).as_deref(), Some("PC"));
        assert!(r.tree().is_none());
    }
}
