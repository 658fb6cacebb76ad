//! Project-wide formula summary aggregation.
//!
//! [`FormulaSummaryWriter`] collects the ranked candidates of many compounds,
//! usually from several worker threads, and renders three views from them:
//! the best candidate per compound, the best precursor block per compound and
//! the full ranked listing. All views plus the registry of observed score
//! kinds sit behind one mutex, so a render always sees the same set of
//! contributions in every view.
//!
//! The life cycle is construct, contribute, render. Rendering before every
//! contribution arrived is the caller's problem; [`crate::batch::SummaryBatch`]
//! joins its workers first.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::annotation::ComponentKind;
use crate::candidate::{FormulaResult, FormulaResultId};
use crate::compound::CompoundId;
use crate::config::{RankingConfig, SummaryConfig};
use crate::error::{SummaryError, ValidationError};
use crate::ranking::{assign_ranks, extract_top_ties, rank_by};
use crate::score::ScoreKind;
use crate::summary::alphanum;
use crate::summary::table::{ResultEntry, SummaryTable};
use crate::summary::writer::SummaryWriter;

/// Per-compound candidate listing, written inside the compound directory.
pub const FORMULA_CANDIDATES: &str = "formula_candidates.tsv";

/// The three project-wide views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryView {
    /// Best candidate per compound.
    TopHit,
    /// Every candidate sharing the best precursor formula.
    TopHitWithAdducts,
    /// Every ranked candidate.
    Full,
}

impl SummaryView {
    /// Every view, in file-writing order.
    pub const ALL: [SummaryView; 3] = [Self::TopHit, Self::TopHitWithAdducts, Self::Full];

    /// File name of the view in the project root.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::TopHit => "formula_identifications.tsv",
            Self::TopHitWithAdducts => "formula_identifications_adducts.tsv",
            Self::Full => "formula_identifications_all.tsv",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::TopHit => "top_hit",
            Self::TopHitWithAdducts => "top_hit_with_adducts",
            Self::Full => "full",
        }
    }
}

#[derive(Debug, Default)]
struct SummaryState {
    score_kinds: BTreeSet<ScoreKind>,
    top_hits: Option<HashMap<FormulaResultId, ResultEntry>>,
    top_hits_with_adducts: Option<HashMap<FormulaResultId, ResultEntry>>,
    full: Option<HashMap<FormulaResultId, Vec<ResultEntry>>>,
}

fn by_directory(a: &ResultEntry, b: &ResultEntry) -> std::cmp::Ordering {
    alphanum::compare(a.directory_name(), b.directory_name()).then_with(|| a.position().cmp(&b.position()))
}

/// Score kinds in global priority order, restricted to `present`.
fn score_columns(present: &BTreeSet<ScoreKind>) -> Vec<ScoreKind> {
    ScoreKind::PRIORITY
        .iter()
        .copied()
        .filter(|k| present.contains(k) && !k.is_confidence_style())
        .collect()
}

/// One compound's rows, built outside the lock and committed in one step.
struct Contribution {
    score_kinds: BTreeSet<ScoreKind>,
    best: ResultEntry,
    top_ties: Vec<ResultEntry>,
    entries: Vec<ResultEntry>,
    table: SummaryTable,
}

/// Thread-safe collector of ranked formula candidates.
#[derive(Debug)]
pub struct FormulaSummaryWriter {
    summary: SummaryConfig,
    ranking: RankingConfig,
    state: Mutex<SummaryState>,
}

impl FormulaSummaryWriter {
    /// Creates an empty writer; views disabled in `summary` are never collected.
    pub fn new(summary: SummaryConfig, ranking: RankingConfig) -> Result<Self, ValidationError> {
        Ok(Self::with_validated(summary, ranking.validate()?))
    }

    fn with_validated(summary: SummaryConfig, ranking: RankingConfig) -> Self {
        let state = SummaryState {
            score_kinds: BTreeSet::new(),
            top_hits: summary.write_top_hit.then(HashMap::new),
            top_hits_with_adducts: summary.write_top_hit_with_adducts.then(HashMap::new),
            full: summary.write_full.then(HashMap::new),
        };
        Self {
            summary,
            ranking,
            state: Mutex::new(state),
        }
    }

    /// Components a candidate should carry to fill every column.
    #[must_use]
    pub const fn required_components() -> &'static [ComponentKind] {
        &[
            ComponentKind::FormulaScoring,
            ComponentKind::FragmentationTree,
            ComponentKind::LipidSpecies,
        ]
    }

    /// Which views and files this writer produces.
    #[must_use]
    pub const fn summary_config(&self) -> &SummaryConfig {
        &self.summary
    }

    /// The cascade candidates are ranked by.
    #[must_use]
    pub const fn ranking_config(&self) -> &RankingConfig {
        &self.ranking
    }

    fn lock(&self, context: &'static str) -> Result<MutexGuard<'_, SummaryState>, SummaryError> {
        self.state.lock().map_err(|_| SummaryError::Poisoned { context })
    }

    fn prepare(
        &self,
        compound: &CompoundId,
        candidates: &[FormulaResult],
    ) -> Result<Option<Contribution>, SummaryError> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let sorted = rank_by(candidates.iter(), &self.ranking.ranking_scores);
        let ranks = assign_ranks(&sorted);
        let entries = sorted
            .iter()
            .zip(ranks)
            .enumerate()
            .map(|(position, (candidate, rank))| ResultEntry::new(candidate, compound, rank, position))
            .collect::<Result<Vec<_>, _>>()?;

        let score_kinds: BTreeSet<ScoreKind> = entries
            .iter()
            .flat_map(|e| e.formula_scoring().available_kinds())
            .filter(|k| !k.is_confidence_style())
            .collect();

        let columns = score_columns(&score_kinds);
        let listing = rank_by(entries.iter(), &columns);
        let table = SummaryTable::from_entries(listing, &columns, false);

        Ok(Some(Contribution {
            score_kinds,
            best: entries[0].clone(),
            top_ties: extract_top_ties(&entries).to_vec(),
            entries,
            table,
        }))
    }

    fn commit(&self, compound: &CompoundId, contribution: Contribution) -> Result<SummaryTable, SummaryError> {
        let Contribution {
            score_kinds,
            best,
            top_ties,
            entries,
            table,
        } = contribution;

        let mut state = self.lock("summary.contribute")?;
        state.score_kinds.extend(score_kinds);
        if let Some(top_hits) = state.top_hits.as_mut() {
            top_hits.insert(best.id().clone(), best.clone());
        }
        if let Some(with_adducts) = state.top_hits_with_adducts.as_mut() {
            for entry in top_ties {
                with_adducts.insert(entry.id().clone(), entry);
            }
        }
        if let Some(full) = state.full.as_mut() {
            full.insert(best.id().clone(), entries);
        }
        drop(state);

        debug!(compound = %compound, rows = table.len(), "contributed formula summary");
        Ok(table)
    }

    /// Adds the candidates of one compound to every enabled view.
    ///
    /// Candidates are re-ranked (stable) by the full cascade first. Returns
    /// the per-compound table, or `None` for an empty candidate list. Every
    /// candidate must carry a score set; otherwise nothing is recorded.
    pub fn contribute(
        &self,
        compound: &CompoundId,
        candidates: &[FormulaResult],
    ) -> Result<Option<SummaryTable>, SummaryError> {
        match self.prepare(compound, candidates)? {
            Some(contribution) => self.commit(compound, contribution).map(Some),
            None => Ok(None),
        }
    }

    /// Writes the per-compound table when enabled, then contributes.
    ///
    /// A failed write records nothing for `compound`.
    pub fn add_write_compound_summary(
        &self,
        writer: &dyn SummaryWriter,
        compound: &CompoundId,
        candidates: &[FormulaResult],
    ) -> Result<(), SummaryError> {
        let Some(contribution) = self.prepare(compound, candidates)? else {
            return Ok(());
        };
        if self.summary.write_compound_summaries {
            let path = Path::new(compound.directory_name()).join(FORMULA_CANDIDATES);
            writer.write_table(&path, &contribution.table)?;
        }
        self.commit(compound, contribution)?;
        Ok(())
    }

    fn render_locked(state: &SummaryState, view: SummaryView) -> Result<SummaryTable, SummaryError> {
        let disabled = || SummaryError::ViewDisabled { view: view.label() };
        let columns = score_columns(&state.score_kinds);
        let table = match view {
            SummaryView::TopHit => {
                let mut rows: Vec<&ResultEntry> = state.top_hits.as_ref().ok_or_else(disabled)?.values().collect();
                rows.sort_by(|a, b| by_directory(a, b));
                SummaryTable::from_entries(rows, &columns, true)
            }
            SummaryView::TopHitWithAdducts => {
                let mut rows: Vec<&ResultEntry> = state
                    .top_hits_with_adducts
                    .as_ref()
                    .ok_or_else(disabled)?
                    .values()
                    .collect();
                rows.sort_by(|a, b| by_directory(a, b));
                SummaryTable::from_entries(rows, &columns, true)
            }
            SummaryView::Full => {
                let full = state.full.as_ref().ok_or_else(disabled)?;
                let mut keys: Vec<&ResultEntry> = full.values().filter_map(|listing| listing.first()).collect();
                keys.sort_by(|a, b| by_directory(a, b));
                let rows = keys
                    .into_iter()
                    .filter_map(|best| full.get(best.id()))
                    .flat_map(|listing| listing.iter());
                SummaryTable::from_entries(rows, &columns, true)
            }
        };
        Ok(table)
    }

    /// Renders one view from the contributions recorded so far.
    pub fn render(&self, view: SummaryView) -> Result<SummaryTable, SummaryError> {
        let state = self.lock("summary.render")?;
        Self::render_locked(&state, view)
    }

    /// Renders every enabled view from one snapshot.
    pub fn render_all(&self) -> Result<Vec<(SummaryView, SummaryTable)>, SummaryError> {
        let state = self.lock("summary.render_all")?;
        let enabled = [
            (SummaryView::TopHit, state.top_hits.is_some()),
            (SummaryView::TopHitWithAdducts, state.top_hits_with_adducts.is_some()),
            (SummaryView::Full, state.full.is_some()),
        ];
        enabled
            .into_iter()
            .filter(|(_, on)| *on)
            .map(|(view, _)| Self::render_locked(&state, view).map(|table| (view, table)))
            .collect()
    }

    /// Writes every enabled project-wide view to `writer`.
    pub fn write_project_summary(&self, writer: &dyn SummaryWriter) -> Result<(), SummaryError> {
        for (view, table) in self.render_all()? {
            writer.write_table(Path::new(view.file_name()), &table)?;
            info!(file = view.file_name(), rows = table.len(), "wrote project summary");
        }
        Ok(())
    }

    /// Entries in `view`; for [`SummaryView::Full`] the number of compounds.
    pub fn entry_count(&self, view: SummaryView) -> Result<usize, SummaryError> {
        let state = self.lock("summary.entry_count")?;
        let count = match view {
            SummaryView::TopHit => state.top_hits.as_ref().map(HashMap::len),
            SummaryView::TopHitWithAdducts => state.top_hits_with_adducts.as_ref().map(HashMap::len),
            SummaryView::Full => state.full.as_ref().map(HashMap::len),
        };
        count.ok_or(SummaryError::ViewDisabled { view: view.label() })
    }

    /// Dynamic score columns of the project-wide views, in output order.
    pub fn score_kinds(&self) -> Result<Vec<ScoreKind>, SummaryError> {
        Ok(score_columns(&self.lock("summary.score_kinds")?.score_kinds))
    }
}

impl Default for FormulaSummaryWriter {
    fn default() -> Self {
        Self::with_validated(SummaryConfig::default(), RankingConfig::default())
    }
}
