//! Configuration for ranking, summaries and the batch runtime.
//!
//! Every section has a `Default` and a consuming `validate` that returns the
//! section unchanged when it is usable.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::score::ScoreKind;

/// Which summary files get written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Best candidate per compound (`formula_identifications.tsv`).
    pub write_top_hit: bool,
    /// Best precursor block per compound (`formula_identifications_adducts.tsv`).
    pub write_top_hit_with_adducts: bool,
    /// Every ranked candidate (`formula_identifications_all.tsv`).
    pub write_full: bool,
    /// Per-compound `formula_candidates.tsv`.
    pub write_compound_summaries: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            write_top_hit: true,
            write_top_hit_with_adducts: true,
            write_full: true,
            write_compound_summaries: true,
        }
    }
}

/// Score cascade used for ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Cascade for ranking all candidates of a compound, primary kind first.
    pub ranking_scores: Vec<ScoreKind>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            ranking_scores: vec![
                ScoreKind::Zodiac,
                ScoreKind::Sirius,
                ScoreKind::Tree,
                ScoreKind::Isotope,
                ScoreKind::TopCsi,
            ],
        }
    }
}

fn check_cascade(field: &str, cascade: &[ScoreKind]) -> Result<(), ValidationError> {
    if cascade.is_empty() {
        return Err(ValidationError::EmptyCascade {
            field: field.to_string(),
        });
    }
    for (i, kind) in cascade.iter().enumerate() {
        if cascade[..i].contains(kind) {
            return Err(ValidationError::DuplicateScoreKind {
                field: field.to_string(),
                kind: *kind,
            });
        }
    }
    Ok(())
}

impl RankingConfig {
    /// Rejects an empty cascade and repeated kinds.
    pub fn validate(self) -> Result<Self, ValidationError> {
        check_cascade("ranking_scores", &self.ranking_scores)?;
        Ok(self)
    }
}

/// How a data-set job treats compounds that already carry results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecomputeMode {
    /// Keep existing results.
    #[default]
    Keep,
    /// Invalidate existing results and compute again.
    Recompute,
}

/// Worker pool settings of the summary batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Maximum queued instances.
    pub queue_capacity: usize,
    /// Recompute mode of data-set jobs built from this config.
    pub recompute: RecomputeMode,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
            recompute: RecomputeMode::Keep,
        }
    }
}

impl BatchConfig {
    /// Rejects an empty pool or queue.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.workers < 1 {
            return Err(ValidationError::OutOfRange {
                field: "workers".to_string(),
                min: 1,
                actual: self.workers,
            });
        }
        if self.queue_capacity < 1 {
            return Err(ValidationError::OutOfRange {
                field: "queue_capacity".to_string(),
                min: 1,
                actual: self.queue_capacity,
            });
        }
        Ok(self)
    }
}

/// All configuration sections.
///
/// # Examples
///
/// ```
/// use formulaspace::FormulaSpaceConfig;
///
/// let config = FormulaSpaceConfig::from_json_str(r#"{ "batch": { "workers": 2 } }"#).unwrap();
/// assert_eq!(config.batch.workers, 2);
/// assert!(config.summary.write_full);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaSpaceConfig {
    /// Summary files to write.
    pub summary: SummaryConfig,
    /// Ranking cascade.
    pub ranking: RankingConfig,
    /// Summary worker pool.
    pub batch: BatchConfig,
}

impl FormulaSpaceConfig {
    /// Validates every section.
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            summary: self.summary,
            ranking: self.ranking.validate()?,
            batch: self.batch.validate()?,
        })
    }

    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ValidationError::Config {
            message: e.to_string(),
        })?;
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(FormulaSpaceConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_cascade_is_rejected() {
        let cfg = RankingConfig {
            ranking_scores: Vec::new(),
        };
        assert!(matches!(cfg.validate(), Err(ValidationError::EmptyCascade { .. })));
    }

    #[test]
    fn duplicate_kind_is_rejected() {
        let cfg = RankingConfig {
            ranking_scores: vec![ScoreKind::Sirius, ScoreKind::Tree, ScoreKind::Sirius],
        };
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::DuplicateScoreKind { kind: ScoreKind::Sirius, .. })
        ));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let cfg = BatchConfig {
            workers: 0,
            ..BatchConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn json_overrides_and_errors() {
        let cfg = FormulaSpaceConfig::from_json_str(
            r#"{ "summary": { "write_full": false }, "batch": { "recompute": "recompute" } }"#,
        )
        .unwrap();
        assert!(!cfg.summary.write_full);
        assert!(cfg.summary.write_top_hit);
        assert_eq!(cfg.batch.recompute, RecomputeMode::Recompute);

        assert!(matches!(
            FormulaSpaceConfig::from_json_str("{ not json"),
            Err(ValidationError::Config { .. })
        ));
        assert!(FormulaSpaceConfig::from_json_str(r#"{ "batch": { "workers": 0 } }"#).is_err());
    }
}
