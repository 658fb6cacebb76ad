//! Per-compound lazy cache.
//!
//! An [`Instance`] memoizes the components of one compound and of its formula
//! candidates. Every load diffs the requested kinds against what is cached and
//! fetches only the missing ones from the [`ProjectSpace`]. All state lives
//! behind one mutex per compound, so the load-then-merge sequence is atomic
//! and instances of different compounds never contend.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, warn};

use crate::annotation::{distinct_kinds, AnnotationSet, ComponentKind, ComponentPayload};
use crate::candidate::{FormulaResult, FormulaResultId};
use crate::compound::{CompoundContainer, CompoundId, Ms2Experiment, ProjectSpaceConfig};
use crate::error::CacheError;
use crate::ranking::rank_by;
use crate::score::ScoreKind;
use crate::storage::ProjectSpace;

/// What to drop from an instance cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Every compound-level component.
    Compound,
    /// Every cached formula candidate.
    FormulaResults,
    /// One cached formula candidate.
    FormulaResult(FormulaResultId),
}

#[derive(Debug)]
struct InstanceState {
    compound: CompoundContainer,
    formula_results: HashMap<FormulaResultId, FormulaResult>,
}

/// Cached view of one compound and its formula candidates.
pub struct Instance {
    id: CompoundId,
    space: Arc<dyn ProjectSpace>,
    state: Mutex<InstanceState>,
}

fn view(result: &FormulaResult, kinds: &[ComponentKind]) -> FormulaResult {
    FormulaResult::with_annotations(result.id().clone(), result.annotations.restricted_to(kinds))
}

impl Instance {
    /// Wraps an already loaded compound container.
    #[must_use]
    pub fn new(compound: CompoundContainer, space: Arc<dyn ProjectSpace>) -> Self {
        Self {
            id: compound.id().clone(),
            space,
            state: Mutex::new(InstanceState {
                compound,
                formula_results: HashMap::new(),
            }),
        }
    }

    /// The compound this instance caches.
    #[must_use]
    pub const fn id(&self) -> &CompoundId {
        &self.id
    }

    fn lock(&self, context: &'static str) -> Result<MutexGuard<'_, InstanceState>, CacheError> {
        self.state.lock().map_err(|_| CacheError::Poisoned { context })
    }

    fn check_owned(&self, fid: &FormulaResultId) -> Result<(), CacheError> {
        if fid.parent() == &self.id {
            Ok(())
        } else {
            Err(CacheError::ForeignCandidate {
                compound: self.id.to_string(),
                candidate: fid.to_string(),
            })
        }
    }

    // load

    /// Returns the compound-level components limited to `kinds`.
    ///
    /// Missing kinds are fetched with a single store call; kinds already
    /// cached never touch the store.
    pub fn load_compound(&self, kinds: &[ComponentKind]) -> Result<AnnotationSet, CacheError> {
        let mut state = self.lock("instance.load_compound")?;
        let missing = state.compound.annotations.missing(kinds);
        if !missing.is_empty() {
            debug!(compound = %self.id, ?missing, "fetching compound components");
            let fetched = self.space.compound(&self.id, &missing)?;
            state.compound.annotations.merge_from(&fetched.annotations, &missing);
        }
        Ok(state.compound.annotations.restricted_to(kinds))
    }

    /// Typed single-component variant of [`Instance::load_compound`].
    pub fn load_compound_component<T: ComponentPayload + Clone>(&self) -> Result<Option<T>, CacheError> {
        Ok(self.load_compound(&[T::KIND])?.get_as::<T>().cloned())
    }

    /// The compound's MS2 experiment, if stored.
    pub fn experiment(&self) -> Result<Option<Ms2Experiment>, CacheError> {
        self.load_compound_component::<Ms2Experiment>()
    }

    /// The compound's project-space config, if stored.
    pub fn config(&self) -> Result<Option<ProjectSpaceConfig>, CacheError> {
        self.load_compound_component::<ProjectSpaceConfig>()
    }

    /// Replaces the cached compound with a fresh fetch of `kinds`.
    ///
    /// Fetch and swap both happen under the instance lock; a candidate
    /// registered by a concurrent update is never lost from the index.
    pub fn reload_compound(&self, kinds: &[ComponentKind]) -> Result<(), CacheError> {
        let mut state = self.lock("instance.reload_compound")?;
        state.compound = self.space.compound(&self.id, &distinct_kinds(kinds))?;
        Ok(())
    }

    /// Returns one formula candidate limited to `kinds`.
    ///
    /// An id missing from the compound's candidate index is logged and
    /// fetched anyway.
    pub fn load_formula_result(
        &self,
        fid: &FormulaResultId,
        kinds: &[ComponentKind],
    ) -> Result<FormulaResult, CacheError> {
        self.check_owned(fid)?;
        let mut guard = self.lock("instance.load_formula_result")?;
        let state = &mut *guard;

        match state.formula_results.get_mut(fid) {
            Some(cached) => {
                let missing = cached.annotations.missing(kinds);
                if !missing.is_empty() {
                    debug!(formula_result = %fid, ?missing, "fetching formula result components");
                    let fetched = self.space.formula_result(fid, &missing)?;
                    cached.annotations.merge_from(&fetched.annotations, &missing);
                }
                Ok(view(cached, kinds))
            }
            None => {
                if !state.compound.contains(fid) {
                    warn!(
                        compound = %self.id,
                        formula_result = %fid,
                        "unknown formula result id; wrong id or the project space was modified bypassing the cache"
                    );
                }
                let fetched = self.space.formula_result(fid, &distinct_kinds(kinds))?;
                let out = view(&fetched, kinds);
                state.formula_results.insert(fid.clone(), fetched);
                Ok(out)
            }
        }
    }

    /// All formula candidates, best first by `score_priority`, limited to `kinds`.
    ///
    /// When every indexed candidate is cached, only the missing kinds are
    /// refreshed per candidate and the ranking happens locally. Otherwise one
    /// ordered fetch replaces the whole candidate cache. Scores are always
    /// loaded since ranking needs them.
    pub fn load_formula_results(
        &self,
        score_priority: &[ScoreKind],
        kinds: &[ComponentKind],
    ) -> Result<Vec<FormulaResult>, CacheError> {
        let mut fetch_kinds = distinct_kinds(kinds);
        if !fetch_kinds.contains(&ComponentKind::FormulaScoring) {
            fetch_kinds.push(ComponentKind::FormulaScoring);
        }

        let mut guard = self.lock("instance.load_formula_results")?;
        let state = &mut *guard;

        let all_cached = state
            .compound
            .results()
            .all(|fid| state.formula_results.contains_key(fid));

        if !all_cached {
            debug!(compound = %self.id, "fetching ordered formula results");
            let fetched = self
                .space
                .formula_results_ordered_by(&self.id, score_priority, &fetch_kinds)?;
            let out = fetched.iter().map(|r| view(r, kinds)).collect();
            state.formula_results = fetched.into_iter().map(|r| (r.id().clone(), r)).collect();
            return Ok(out);
        }

        let ids: Vec<FormulaResultId> = state.compound.results().cloned().collect();
        for fid in &ids {
            let Some(cached) = state.formula_results.get_mut(fid) else {
                continue;
            };
            let missing = cached.annotations.missing(&fetch_kinds);
            if !missing.is_empty() {
                debug!(formula_result = %fid, ?missing, "refreshing formula result components");
                let fetched = self.space.formula_result(fid, &missing)?;
                cached.annotations.merge_from(&fetched.annotations, &missing);
            }
        }

        let ranked = rank_by(ids.iter().filter_map(|fid| state.formula_results.get(fid)), score_priority);
        Ok(ranked.into_iter().map(|r| view(r, kinds)).collect())
    }

    /// Best formula candidate by `score_priority`, if any.
    pub fn load_top_formula_result(
        &self,
        score_priority: &[ScoreKind],
        kinds: &[ComponentKind],
    ) -> Result<Option<FormulaResult>, CacheError> {
        Ok(self.load_formula_results(score_priority, kinds)?.into_iter().next())
    }

    /// True when the store knows at least one candidate for this compound.
    pub fn has_formula_results(&self) -> Result<bool, CacheError> {
        Ok(self.lock("instance.has_formula_results")?.compound.result_count() > 0)
    }

    /// True when `fid` currently sits in the candidate cache.
    pub fn is_cached(&self, fid: &FormulaResultId) -> Result<bool, CacheError> {
        Ok(self.lock("instance.is_cached")?.formula_results.contains_key(fid))
    }

    // write

    /// Merges the listed kinds of `container` into the cache, then stores them.
    pub fn update_compound(&self, container: &CompoundContainer, kinds: &[ComponentKind]) -> Result<(), CacheError> {
        if container.id() != &self.id {
            return Err(CacheError::ForeignCandidate {
                compound: self.id.to_string(),
                candidate: container.id().to_string(),
            });
        }
        let mut state = self.lock("instance.update_compound")?;
        state.compound.annotations.merge_from(&container.annotations, kinds);
        self.space.update_compound(&state.compound, kinds)?;
        Ok(())
    }

    /// Registers or refreshes a candidate in the cache, then stores the listed kinds.
    pub fn update_formula_result(&self, result: &FormulaResult, kinds: &[ComponentKind]) -> Result<(), CacheError> {
        self.check_owned(result.id())?;
        let mut guard = self.lock("instance.update_formula_result")?;
        let state = &mut *guard;

        let fid = result.id();
        match state.formula_results.get_mut(fid) {
            Some(cached) => cached.annotations.merge_from(&result.annotations, kinds),
            None => {
                state.formula_results.insert(fid.clone(), result.clone());
                state.compound.add_result(fid.clone());
            }
        }

        if let Some(cached) = state.formula_results.get(fid) {
            self.space.update_formula_result(cached, kinds)?;
        }
        Ok(())
    }

    // delete

    /// Removes `kinds` from every candidate of this compound.
    ///
    /// The cache is updated first, then every indexed candidate is deleted
    /// from the store. A failing candidate is logged and skipped; the ids of
    /// failed candidates are returned. Deleting the fragmentation tree drops
    /// whole candidates.
    pub fn delete_from_formula_results(&self, kinds: &[ComponentKind]) -> Result<Vec<FormulaResultId>, CacheError> {
        if kinds.is_empty() {
            return Ok(Vec::new());
        }
        if kinds.contains(&ComponentKind::FragmentationTree) {
            return self.delete_formula_results();
        }

        let mut state = self.lock("instance.delete_from_formula_results")?;
        let ids: Vec<FormulaResultId> = state.compound.results().cloned().collect();
        for cached in state.formula_results.values_mut() {
            for kind in kinds {
                cached.annotations.remove(*kind);
            }
        }

        let mut failed = Vec::new();
        for fid in ids {
            if let Err(e) = self.space.delete_from_formula_result(&fid, kinds) {
                error!(compound = %self.id, formula_result = %fid, error = %e, "failed to delete components from formula result");
                failed.push(fid);
            }
        }
        Ok(failed)
    }

    /// Removes every candidate of this compound, cache first, then store.
    ///
    /// Best effort like [`Instance::delete_from_formula_results`].
    pub fn delete_formula_results(&self) -> Result<Vec<FormulaResultId>, CacheError> {
        let mut state = self.lock("instance.delete_formula_results")?;
        let ids: Vec<FormulaResultId> = state.compound.results().cloned().collect();
        state.compound.clear_results();
        state.formula_results.clear();

        let mut failed = Vec::new();
        for fid in ids {
            if let Err(e) = self.space.delete_formula_result(&fid) {
                error!(compound = %self.id, formula_result = %fid, error = %e, "failed to delete formula result");
                failed.push(fid);
            }
        }
        Ok(failed)
    }

    // cache management

    /// Drops cached state so the next load re-fetches it.
    pub fn invalidate(&self, target: &Invalidation) -> Result<(), CacheError> {
        let mut state = self.lock("instance.invalidate")?;
        match target {
            Invalidation::Compound => state.compound.annotations.clear(),
            Invalidation::FormulaResults => state.formula_results.clear(),
            Invalidation::FormulaResult(fid) => {
                state.formula_results.remove(fid);
            }
        }
        Ok(())
    }

    /// Drops `kinds` from the cached compound.
    pub fn clear_compound_cache(&self, kinds: &[ComponentKind]) -> Result<(), CacheError> {
        let mut state = self.lock("instance.clear_compound_cache")?;
        for kind in kinds {
            state.compound.annotations.remove(*kind);
        }
        Ok(())
    }

    /// Drops every cached candidate; the next ranked load fetches them all.
    pub fn clear_formula_results_cache(&self) -> Result<(), CacheError> {
        self.invalidate(&Invalidation::FormulaResults)
    }

    /// Drops `kinds` from every cached candidate. Candidates stay cached, so
    /// the next ranked load refreshes just these kinds.
    pub fn clear_formula_results_components(&self, kinds: &[ComponentKind]) -> Result<(), CacheError> {
        let mut state = self.lock("instance.clear_formula_results_components")?;
        for cached in state.formula_results.values_mut() {
            for kind in kinds {
                cached.annotations.remove(*kind);
            }
        }
        Ok(())
    }

    /// Drops `kinds` from one cached candidate.
    pub fn clear_formula_result_cache(
        &self,
        fid: &FormulaResultId,
        kinds: &[ComponentKind],
    ) -> Result<(), CacheError> {
        let mut state = self.lock("instance.clear_formula_result_cache")?;
        if let Some(cached) = state.formula_results.get_mut(fid) {
            for kind in kinds {
                cached.annotations.remove(*kind);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").field("id", &self.id).finish_non_exhaustive()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}
