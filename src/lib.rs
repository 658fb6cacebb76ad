//! # formulaspace - Caching and ranking of molecular formula candidates
//!
//! formulaspace sits between analysis workers and a project space holding
//! compounds and their scored formula candidates. It memoizes partially
//! loaded components per compound, ranks candidates with tie awareness and
//! aggregates the rankings of many compounds into project-wide summaries.
//!
//! ## Core Concepts
//!
//! - **Compound**: one analyzed sample, identified by its directory name
//! - **Formula result**: one scored molecular formula candidate of a compound
//! - **Component**: a typed payload (spectrum, tree, score set, ...) loaded on demand
//! - **Instance**: the per-compound cache, one lock per compound
//! - **Summary**: best hit, best hit with adducts and full listing across compounds
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use formulaspace::{
//!     CompoundContainer, CompoundId, ComponentKind, FormulaResult, FormulaResultId,
//!     FormulaScoring, FormulaSummaryWriter, InMemoryProjectSpace, InstanceManager,
//!     IonType, MolecularFormula, ProjectSpace, ScoreKind, SummaryView,
//! };
//!
//! let space = Arc::new(InMemoryProjectSpace::new());
//! let id = CompoundId::new("1_glucose", 1)?;
//! space.update_compound(&CompoundContainer::new(id.clone()), &[])?;
//!
//! let formula = MolecularFormula::parse("C6H12O6")?;
//! let mut result = FormulaResult::new(FormulaResultId::new(
//!     id.clone(),
//!     formula.clone(),
//!     formula,
//!     Some(IonType::new("[M+H]+")),
//! ));
//! result.annotations.set(FormulaScoring::new().with(ScoreKind::Sirius, 12.0));
//! space.update_formula_result(&result, &[ComponentKind::FormulaScoring])?;
//!
//! let manager = InstanceManager::new(space);
//! let instance = manager.instance(&id)?;
//! let ranked = instance.load_formula_results(&[ScoreKind::Sirius], &[ComponentKind::FormulaScoring])?;
//!
//! let summary = FormulaSummaryWriter::default();
//! summary.contribute(instance.id(), &ranked)?;
//! assert_eq!(summary.render(SummaryView::TopHit)?.len(), 1);
//! # Ok::<(), formulaspace::SpaceError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod annotation;
pub mod candidate;
pub mod compound;
pub mod error;
pub mod formula;
pub mod score;
pub mod tree;

// Storage, caching and ranking
pub mod instance;
pub mod ranking;
pub mod storage;

// Summaries and batch execution
pub mod batch;
pub mod config;
pub mod summary;

// Re-export primary types at crate root for convenience
pub use annotation::{AnnotationSet, Component, ComponentKind, ComponentPayload};
pub use candidate::{FormulaResult, FormulaResultId};
pub use compound::{CompoundContainer, CompoundId, Ms2Experiment, ProjectSpaceConfig};
pub use error::{BatchError, CacheError, SpaceError, SpaceResult, SummaryError, ValidationError};
pub use formula::{IonType, MolecularFormula};
pub use score::{FormulaScoring, ScoreKind, ScoreValue};
pub use tree::{FragmentationTree, LipidSpecies};

pub use instance::{Instance, InstanceManager, Invalidation};
pub use ranking::{assign_ranks, extract_top_ties, rank_by, with_ranks, Ranked, Scored};
pub use storage::{InMemoryProjectSpace, ProjectSpace, StorageError};

pub use batch::{BatchReport, ComputeDecision, DataSetJob, DataSetReport, DataSetTool, SummaryBatch};
pub use config::{BatchConfig, FormulaSpaceConfig, RankingConfig, RecomputeMode, SummaryConfig};
pub use summary::{
    DirectoryWriter, FormulaSummaryWriter, MemorySummaryWriter, SummaryTable, SummaryView, SummaryWriter,
};
