//! In-memory project-space backend.
//!
//! This module provides a thread-safe in-memory implementation of
//! [`ProjectSpace`]. It is intended for embedded usage, tests, and as a
//! reference implementation of the storage contract.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::annotation::{AnnotationSet, ComponentKind};
use crate::candidate::{FormulaResult, FormulaResultId};
use crate::compound::{CompoundContainer, CompoundId};
use crate::ranking::rank_by;
use crate::score::ScoreKind;
use crate::storage::traits::{ProjectSpace, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct SpaceState {
    compounds: HashMap<CompoundId, CompoundContainer>,
    results: HashMap<FormulaResultId, AnnotationSet>,
}

/// Thread-safe in-memory project space.
#[derive(Debug, Default)]
pub struct InMemoryProjectSpace {
    state: RwLock<SpaceState>,
}

impl InMemoryProjectSpace {
    /// Create a new empty project space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored compounds.
    pub fn compound_count(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("space.compound_count"))?;
        Ok(state.compounds.len())
    }
}

impl ProjectSpace for InMemoryProjectSpace {
    fn compound_ids(&self) -> Result<Vec<CompoundId>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("space.compound_ids"))?;
        let mut ids: Vec<CompoundId> = state.compounds.keys().cloned().collect();
        ids.sort_by(|a, b| a.directory_name().cmp(b.directory_name()));
        Ok(ids)
    }

    fn compound(&self, id: &CompoundId, kinds: &[ComponentKind]) -> Result<CompoundContainer, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("space.compound"))?;
        let stored = state
            .compounds
            .get(id)
            .ok_or_else(|| StorageError::CompoundNotFound(id.clone()))?;

        let mut out = CompoundContainer::new(stored.id().clone());
        out.annotations = stored.annotations.restricted_to(kinds);
        for fid in stored.results() {
            out.add_result(fid.clone());
        }
        Ok(out)
    }

    fn update_compound(&self, container: &CompoundContainer, kinds: &[ComponentKind]) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("space.update_compound"))?;
        let stored = state
            .compounds
            .entry(container.id().clone())
            .or_insert_with(|| CompoundContainer::new(container.id().clone()));
        stored.annotations.merge_from(&container.annotations, kinds);
        Ok(())
    }

    fn delete_compound(&self, id: &CompoundId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("space.delete_compound"))?;
        if state.compounds.remove(id).is_none() {
            return Err(StorageError::CompoundNotFound(id.clone()));
        }
        state.results.retain(|fid, _| fid.parent() != id);
        Ok(())
    }

    fn formula_result(&self, id: &FormulaResultId, kinds: &[ComponentKind]) -> Result<FormulaResult, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("space.formula_result"))?;
        let stored = state
            .results
            .get(id)
            .ok_or_else(|| StorageError::FormulaResultNotFound(id.clone()))?;
        Ok(FormulaResult::with_annotations(id.clone(), stored.restricted_to(kinds)))
    }

    fn formula_results_ordered_by(
        &self,
        id: &CompoundId,
        score_priority: &[ScoreKind],
        kinds: &[ComponentKind],
    ) -> Result<Vec<FormulaResult>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("space.formula_results_ordered_by"))?;
        let compound = state
            .compounds
            .get(id)
            .ok_or_else(|| StorageError::CompoundNotFound(id.clone()))?;

        let mut full = Vec::with_capacity(compound.result_count());
        for fid in compound.results() {
            let stored = state.results.get(fid).ok_or_else(|| {
                StorageError::BackendError(format!("candidate index of {id} references missing result {fid}"))
            })?;
            full.push(FormulaResult::with_annotations(fid.clone(), stored.clone()));
        }

        Ok(rank_by(full, score_priority)
            .into_iter()
            .map(|r| {
                let annotations = r.annotations.restricted_to(kinds);
                FormulaResult::with_annotations(r.id().clone(), annotations)
            })
            .collect())
    }

    fn update_formula_result(&self, result: &FormulaResult, kinds: &[ComponentKind]) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("space.update_formula_result"))?;
        let parent = result.id().parent();
        let compound = state
            .compounds
            .get_mut(parent)
            .ok_or_else(|| StorageError::CompoundNotFound(parent.clone()))?;
        compound.add_result(result.id().clone());

        state
            .results
            .entry(result.id().clone())
            .or_default()
            .merge_from(&result.annotations, kinds);
        Ok(())
    }

    fn delete_from_formula_result(&self, id: &FormulaResultId, kinds: &[ComponentKind]) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("space.delete_from_formula_result"))?;
        let stored = state
            .results
            .get_mut(id)
            .ok_or_else(|| StorageError::FormulaResultNotFound(id.clone()))?;
        for kind in kinds {
            stored.remove(*kind);
        }
        Ok(())
    }

    fn delete_formula_result(&self, id: &FormulaResultId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("space.delete_formula_result"))?;
        if state.results.remove(id).is_none() {
            return Err(StorageError::FormulaResultNotFound(id.clone()));
        }
        if let Some(compound) = state.compounds.get_mut(id.parent()) {
            compound.remove_result(id);
        }
        Ok(())
    }
}
