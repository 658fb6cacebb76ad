//! Error types for formulaspace.
//!
//! All errors are strongly typed using thiserror, one enum per layer:
//! validation of ids and configuration, the instance cache, summary
//! rendering and the batch runtime. `SpaceError` is the top-level error that
//! wraps them all.

use std::path::PathBuf;

use thiserror::Error;

use crate::annotation::ComponentKind;
use crate::score::ScoreKind;
use crate::storage::StorageError;

/// Validation errors that occur while constructing ids or configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A compound id without a directory name.
    #[error("Compound directory name cannot be empty")]
    EmptyDirectoryName,

    /// A formula that is not a sequence of element counts.
    #[error("Invalid molecular formula '{formula}'")]
    InvalidFormula {
        formula: String,
    },

    /// A score cascade without kinds.
    #[error("Score cascade '{field}' cannot be empty")]
    EmptyCascade {
        field: String,
    },

    /// A score kind listed twice in one cascade.
    #[error("Score kind {kind} appears more than once in '{field}'")]
    DuplicateScoreKind {
        field: String,
        kind: ScoreKind,
    },

    /// A numeric setting below its minimum.
    #[error("Field '{field}' must be at least {min} (got {actual})")]
    OutOfRange {
        field: String,
        min: usize,
        actual: usize,
    },

    /// Every input instance of a data-set job was rejected.
    #[error("No valid input instances for '{tool}'")]
    NoValidInput {
        tool: String,
    },

    /// Unparseable configuration.
    #[error("Invalid configuration: {message}")]
    Config {
        message: String,
    },
}

/// Errors raised by the per-compound instance cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The project space failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A lock was poisoned by a panicking thread.
    #[error("poisoned lock: {context}")]
    Poisoned {
        context: &'static str,
    },

    /// A candidate or container of another compound.
    #[error("Formula result {candidate} does not belong to compound {compound}")]
    ForeignCandidate {
        compound: String,
        candidate: String,
    },
}

/// Errors raised while aggregating or rendering summaries.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// A ranked candidate lacks a component the summary cannot do without.
    #[error("Formula result {candidate} has no {kind} component")]
    MissingComponent {
        candidate: String,
        kind: ComponentKind,
    },

    /// The requested view is switched off in the config.
    #[error("Summary view '{view}' is disabled")]
    ViewDisabled {
        view: &'static str,
    },

    /// A lock was poisoned by a panicking thread.
    #[error("poisoned lock: {context}")]
    Poisoned {
        context: &'static str,
    },

    /// Writing a table failed.
    #[error("Failed to write summary '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding or parsing a table failed.
    #[error("Malformed summary table: {0}")]
    Table(#[from] csv::Error),
}

/// Errors raised by the summary batch runtime.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A worker thread could not be started.
    #[error("Failed to spawn worker '{worker}': {source}")]
    Spawn {
        worker: String,
        #[source]
        source: std::io::Error,
    },

    /// Every worker exited before the queue was drained.
    #[error("Worker queue disconnected")]
    Disconnected,

    /// A worker thread panicked.
    #[error("Worker '{worker}' panicked")]
    WorkerPanicked {
        worker: String,
    },
}

/// Top-level error type for formulaspace.
#[derive(Debug, Error)]
pub enum SpaceError {
    /// Invalid ids or configuration.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Instance cache or project space failure.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Summary aggregation or output failure.
    #[error("Summary error: {0}")]
    Summary(#[from] SummaryError),

    /// Worker pool failure.
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// Unexpected internal state.
    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl From<StorageError> for SpaceError {
    fn from(err: StorageError) -> Self {
        Self::Cache(CacheError::Storage(err))
    }
}

impl SpaceError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a cache error.
    #[must_use]
    pub const fn is_cache(&self) -> bool {
        matches!(self, Self::Cache(_))
    }

    /// Returns true if this is a summary error.
    #[must_use]
    pub const fn is_summary(&self) -> bool {
        matches!(self, Self::Summary(_))
    }

    /// Returns true if this is a batch runtime error.
    #[must_use]
    pub const fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Cache(CacheError::Storage(e)) => {
                matches!(e, StorageError::BackendError(_) | StorageError::Io(_))
            }
            Self::Summary(SummaryError::Io { .. }) => true,
            _ => false,
        }
    }
}

/// Result type alias for formulaspace operations.
pub type SpaceResult<T> = Result<T, SpaceError>;
