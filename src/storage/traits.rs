//! Abstract project-space storage contract.
//!
//! The cache layer talks to persistence only through [`ProjectSpace`].
//! By using a trait, we enable:
//! - In-memory backends for testing and embedded use
//! - On-disk project directories owned by the embedding application

use thiserror::Error;

use crate::annotation::ComponentKind;
use crate::candidate::{FormulaResult, FormulaResultId};
use crate::compound::{CompoundContainer, CompoundId};
use crate::score::ScoreKind;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Compound not found.
    #[error("Compound not found: {0}")]
    CompoundNotFound(CompoundId),

    /// Formula result not found.
    #[error("Formula result not found: {0}")]
    FormulaResultNotFound(FormulaResultId),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O failure of the backing medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage trait for a project space of compounds and their formula results.
///
/// Every read takes the list of component kinds to populate; the returned
/// owner holds exactly those kinds (when stored). All calls may fail with an
/// I/O error.
///
/// # Safety Considerations
/// - Implementations must handle concurrent access safely
/// - Reads of different compounds should not serialize on each other
pub trait ProjectSpace: Send + Sync {
    /// Ids of all stored compounds.
    fn compound_ids(&self) -> Result<Vec<CompoundId>, StorageError>;

    /// Load a compound with `kinds` populated and its full candidate index.
    fn compound(&self, id: &CompoundId, kinds: &[ComponentKind]) -> Result<CompoundContainer, StorageError>;

    /// Insert or update the listed compound-level components.
    fn update_compound(&self, container: &CompoundContainer, kinds: &[ComponentKind]) -> Result<(), StorageError>;

    /// Delete a compound together with all of its formula results.
    fn delete_compound(&self, id: &CompoundId) -> Result<(), StorageError>;

    /// Load one formula result with `kinds` populated.
    fn formula_result(&self, id: &FormulaResultId, kinds: &[ComponentKind]) -> Result<FormulaResult, StorageError>;

    /// Load every formula result of a compound, sorted best-first by
    /// `score_priority`, with `kinds` populated.
    ///
    /// Sorting uses the stored scores even if `kinds` does not request them.
    fn formula_results_ordered_by(
        &self,
        id: &CompoundId,
        score_priority: &[ScoreKind],
        kinds: &[ComponentKind],
    ) -> Result<Vec<FormulaResult>, StorageError>;

    /// Insert or update the listed components of a formula result and
    /// register it in its compound's candidate index.
    fn update_formula_result(&self, result: &FormulaResult, kinds: &[ComponentKind]) -> Result<(), StorageError>;

    /// Remove the listed components from a stored formula result.
    fn delete_from_formula_result(&self, id: &FormulaResultId, kinds: &[ComponentKind]) -> Result<(), StorageError>;

    /// Remove a formula result entirely.
    fn delete_formula_result(&self, id: &FormulaResultId) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe
    fn _assert_project_space_object_safe(_: &dyn ProjectSpace) {}

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::CompoundNotFound(CompoundId::new("7_missing", 7).unwrap());
        assert!(err.to_string().contains("7_missing"));

        let err = StorageError::BackendError("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_storage_error_from_io() {
        let err: StorageError = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
