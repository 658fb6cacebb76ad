#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use formulaspace::{
    CompoundContainer, CompoundId, ComponentKind, FormulaResult, FormulaResultId, FormulaScoring,
    FragmentationTree, InMemoryProjectSpace, IonType, LipidSpecies, MolecularFormula, ProjectSpace,
    ProjectSpaceConfig, ScoreKind, StorageError,
};

pub const ALL: &[ComponentKind] = &ComponentKind::ALL;

/// Project space wrapper that counts store calls and can fail chosen deletes.
#[derive(Default)]
pub struct CountingSpace {
    inner: InMemoryProjectSpace,
    pub compound_fetches: AtomicUsize,
    pub result_fetches: AtomicUsize,
    pub ordered_fetches: AtomicUsize,
    requested_result_kinds: Mutex<Vec<Vec<ComponentKind>>>,
    failing_deletes: Mutex<HashSet<FormulaResultId>>,
}

impl CountingSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes_of(&self, id: &FormulaResultId) {
        self.failing_deletes.lock().unwrap().insert(id.clone());
    }

    pub fn fetches(&self) -> (usize, usize, usize) {
        (
            self.compound_fetches.load(Ordering::SeqCst),
            self.result_fetches.load(Ordering::SeqCst),
            self.ordered_fetches.load(Ordering::SeqCst),
        )
    }

    /// Kind sets of every single-result fetch so far, in call order.
    pub fn requested_result_kinds(&self) -> Vec<Vec<ComponentKind>> {
        self.requested_result_kinds.lock().unwrap().clone()
    }

    fn should_fail(&self, id: &FormulaResultId) -> bool {
        self.failing_deletes.lock().unwrap().contains(id)
    }
}

impl ProjectSpace for CountingSpace {
    fn compound_ids(&self) -> Result<Vec<CompoundId>, StorageError> {
        self.inner.compound_ids()
    }

    fn compound(&self, id: &CompoundId, kinds: &[ComponentKind]) -> Result<CompoundContainer, StorageError> {
        self.compound_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.compound(id, kinds)
    }

    fn update_compound(&self, container: &CompoundContainer, kinds: &[ComponentKind]) -> Result<(), StorageError> {
        self.inner.update_compound(container, kinds)
    }

    fn delete_compound(&self, id: &CompoundId) -> Result<(), StorageError> {
        self.inner.delete_compound(id)
    }

    fn formula_result(&self, id: &FormulaResultId, kinds: &[ComponentKind]) -> Result<FormulaResult, StorageError> {
        self.result_fetches.fetch_add(1, Ordering::SeqCst);
        self.requested_result_kinds.lock().unwrap().push(kinds.to_vec());
        self.inner.formula_result(id, kinds)
    }

    fn formula_results_ordered_by(
        &self,
        id: &CompoundId,
        score_priority: &[ScoreKind],
        kinds: &[ComponentKind],
    ) -> Result<Vec<FormulaResult>, StorageError> {
        self.ordered_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.formula_results_ordered_by(id, score_priority, kinds)
    }

    fn update_formula_result(&self, result: &FormulaResult, kinds: &[ComponentKind]) -> Result<(), StorageError> {
        self.inner.update_formula_result(result, kinds)
    }

    fn delete_from_formula_result(&self, id: &FormulaResultId, kinds: &[ComponentKind]) -> Result<(), StorageError> {
        if self.should_fail(id) {
            return Err(StorageError::BackendError(format!("injected failure for {id}")));
        }
        self.inner.delete_from_formula_result(id, kinds)
    }

    fn delete_formula_result(&self, id: &FormulaResultId) -> Result<(), StorageError> {
        if self.should_fail(id) {
            return Err(StorageError::BackendError(format!("injected failure for {id}")));
        }
        self.inner.delete_formula_result(id)
    }
}

pub fn compound_id(name: &str, index: u32) -> CompoundId {
    CompoundId::new(name, index)
        .unwrap()
        .with_ion_mass(181.070_665)
        .with_retention_time(120.0)
        .with_feature_id(format!("feature-{index}"))
}

pub fn formula_id(parent: &CompoundId, formula: &str, precursor: &str, ion: &str) -> FormulaResultId {
    FormulaResultId::new(
        parent.clone(),
        MolecularFormula::parse(formula).unwrap(),
        MolecularFormula::parse(precursor).unwrap(),
        Some(IonType::new(ion)),
    )
}

/// A fully annotated candidate scored by `sirius`.
pub fn candidate(parent: &CompoundId, formula: &str, precursor: &str, ion: &str, sirius: f64) -> FormulaResult {
    let mut r = FormulaResult::new(formula_id(parent, formula, precursor, ion));
    r.annotations.set(
        FormulaScoring::new()
            .with(ScoreKind::Sirius, sirius)
            .with(ScoreKind::Tree, sirius / 2.0)
            .with(ScoreKind::Isotope, sirius / 2.0),
    );
    r.annotations.set(FragmentationTree {
        num_vertices: 6,
        explained_intensity: 0.9,
        median_mass_deviation_ppm: 0.5,
        median_abs_mass_deviation_ppm: 1.0,
        root_ion_mass: 181.070_665,
    });
    r.annotations.set(LipidSpecies::new("PC"));
    r
}

/// Stores one compound with a config component and the given candidates.
pub fn seed_compound<S: ProjectSpace + ?Sized>(space: &S, id: &CompoundId, candidates: &[FormulaResult]) {
    let mut container = CompoundContainer::new(id.clone());
    container.annotations.set(ProjectSpaceConfig::default());
    space.update_compound(&container, ALL).unwrap();
    for c in candidates {
        space.update_formula_result(c, ALL).unwrap();
    }
}

/// The glucose example: two tied C6H12O6 adducts and one worse C5H10O5.
pub fn glucose_candidates(id: &CompoundId) -> Vec<FormulaResult> {
    vec![
        candidate(id, "C6H12O6", "C6H12O6", "[M+H]+", 10.0),
        candidate(id, "C6H10O5", "C6H12O6", "[M+H-H2O]+", 10.0),
        candidate(id, "C5H10O5", "C5H10O5", "[M+H]+", 8.0),
    ]
}

pub fn counting_space() -> Arc<CountingSpace> {
    Arc::new(CountingSpace::new())
}
