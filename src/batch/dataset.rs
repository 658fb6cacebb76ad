//! Data-set jobs: tools that run once over a whole set of instances.
//!
//! Before running, a job filters out invalid inputs and decides whether the
//! tool needs to run at all. A set counts as computed as soon as *any* of its
//! instances already carries results; recompute is requested when the mode
//! says so or any instance asks for it.

use std::sync::Arc;

use tracing::{info, warn};

use crate::compound::CompoundId;
use crate::config::{BatchConfig, RecomputeMode};
use crate::error::{SpaceResult, ValidationError};
use crate::instance::Instance;

/// What a data-set job does with its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeDecision {
    /// Results exist and no recompute was requested.
    Skip,
    /// No results exist yet.
    Compute,
    /// Results exist and recompute was requested: invalidate, then compute.
    InvalidateAndCompute,
}

impl ComputeDecision {
    /// Decision for a set that has results (`has_results`) and a recompute request.
    #[must_use]
    pub const fn decide(has_results: bool, recompute: bool) -> Self {
        match (has_results, recompute) {
            (false, _) => Self::Compute,
            (true, true) => Self::InvalidateAndCompute,
            (true, false) => Self::Skip,
        }
    }

    /// True unless the job is skipped.
    #[must_use]
    pub const fn computes(self) -> bool {
        !matches!(self, Self::Skip)
    }
}

/// A tool that computes over a set of instances in one go.
pub trait DataSetTool: Send + Sync {
    /// Result of one computation over the whole set.
    type Output;

    /// Tool name used in logs and errors.
    fn name(&self) -> &str;

    /// Inputs failing this check are skipped with a warning.
    fn is_valid_input(&self, _instance: &Instance) -> SpaceResult<bool> {
        Ok(true)
    }

    /// True when `instance` already carries this tool's results.
    fn is_already_computed(&self, instance: &Instance) -> SpaceResult<bool>;

    /// Per-instance recompute request.
    fn requests_recompute(&self, _instance: &Instance) -> bool {
        false
    }

    /// Drops this tool's results from `instance`.
    fn invalidate_results(&self, instance: &Instance) -> SpaceResult<()>;

    /// Computes over every valid instance at once.
    fn compute(&self, instances: &[Arc<Instance>]) -> SpaceResult<Self::Output>;
}

/// Outcome of one data-set job.
#[derive(Debug)]
pub struct DataSetReport<T> {
    /// What the job decided to do.
    pub decision: ComputeDecision,
    /// `None` when the job was skipped.
    pub output: Option<T>,
    /// Inputs rejected by [`DataSetTool::is_valid_input`].
    pub invalid: Vec<CompoundId>,
}

/// Runs a [`DataSetTool`] with input validation and the recompute policy.
pub struct DataSetJob<'a, T> {
    tool: &'a T,
    recompute: RecomputeMode,
}

impl<'a, T: DataSetTool> DataSetJob<'a, T> {
    /// A job for `tool` with an explicit recompute mode.
    #[must_use]
    pub const fn new(tool: &'a T, recompute: RecomputeMode) -> Self {
        Self { tool, recompute }
    }

    /// A job for `tool` taking the recompute mode from `config`.
    #[must_use]
    pub const fn from_config(tool: &'a T, config: &BatchConfig) -> Self {
        Self::new(tool, config.recompute)
    }

    /// The recompute mode this job runs with.
    #[must_use]
    pub const fn recompute_mode(&self) -> RecomputeMode {
        self.recompute
    }

    /// Validates inputs, applies the recompute policy and runs the tool.
    pub fn run(&self, instances: Vec<Arc<Instance>>) -> SpaceResult<DataSetReport<T::Output>> {
        let tool = self.tool.name();

        let mut inputs = Vec::with_capacity(instances.len());
        let mut invalid = Vec::new();
        for instance in instances {
            match self.tool.is_valid_input(&instance) {
                Ok(true) => inputs.push(instance),
                Ok(false) => invalid.push(instance.id().clone()),
                Err(e) => {
                    warn!(tool, compound = %instance.id(), error = %e, "input validation failed");
                    invalid.push(instance.id().clone());
                }
            }
        }
        if !invalid.is_empty() {
            warn!(tool, skipped = invalid.len(), ?invalid, "skipping invalid input instances");
        }
        if inputs.is_empty() {
            return Err(ValidationError::NoValidInput { tool: tool.to_string() }.into());
        }

        let mut has_results = false;
        for instance in &inputs {
            if self.tool.is_already_computed(instance)? {
                has_results = true;
                break;
            }
        }
        let recompute =
            self.recompute == RecomputeMode::Recompute || inputs.iter().any(|i| self.tool.requests_recompute(i));

        let decision = ComputeDecision::decide(has_results, recompute);
        let output = match decision {
            ComputeDecision::Skip => {
                info!(tool, "results already exist and recompute was not requested; skipping");
                None
            }
            ComputeDecision::Compute | ComputeDecision::InvalidateAndCompute => {
                if decision == ComputeDecision::InvalidateAndCompute {
                    info!(tool, instances = inputs.len(), "invalidating existing results");
                    for instance in &inputs {
                        self.tool.invalidate_results(instance)?;
                    }
                }
                Some(self.tool.compute(&inputs)?)
            }
        };

        Ok(DataSetReport {
            decision,
            output,
            invalid,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::compound::CompoundContainer;
    use crate::storage::InMemoryProjectSpace;

    /// A tool whose results always exist.
    #[derive(Default)]
    struct Precomputed {
        invalidated: AtomicUsize,
        computed: AtomicUsize,
    }

    impl DataSetTool for Precomputed {
        type Output = usize;

        fn name(&self) -> &str {
            "precomputed"
        }

        fn is_already_computed(&self, _instance: &Instance) -> SpaceResult<bool> {
            Ok(true)
        }

        fn invalidate_results(&self, _instance: &Instance) -> SpaceResult<()> {
            self.invalidated.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn compute(&self, instances: &[Arc<Instance>]) -> SpaceResult<usize> {
            self.computed.fetch_add(1, Ordering::SeqCst);
            Ok(instances.len())
        }
    }

    fn instances(n: u32) -> Vec<Arc<Instance>> {
        let space = Arc::new(InMemoryProjectSpace::new());
        (0..n)
            .map(|i| {
                let id = CompoundId::new(format!("{i}_c"), i).unwrap();
                Arc::new(Instance::new(CompoundContainer::new(id), space.clone()))
            })
            .collect()
    }

    #[test]
    fn recompute_mode_comes_from_batch_config() {
        let tool = Precomputed::default();
        let keep = DataSetJob::from_config(&tool, &BatchConfig::default())
            .run(instances(3))
            .unwrap();
        assert_eq!(keep.decision, ComputeDecision::Skip);
        assert!(keep.output.is_none());
        assert_eq!(tool.computed.load(Ordering::SeqCst), 0);

        let config = BatchConfig {
            recompute: RecomputeMode::Recompute,
            ..BatchConfig::default()
        };
        let job = DataSetJob::from_config(&tool, &config);
        assert_eq!(job.recompute_mode(), RecomputeMode::Recompute);
        let report = job.run(instances(3)).unwrap();
        assert_eq!(report.decision, ComputeDecision::InvalidateAndCompute);
        assert_eq!(report.output, Some(3));
        assert_eq!(tool.invalidated.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn decision_uses_any_semantics() {
        assert_eq!(ComputeDecision::decide(false, false), ComputeDecision::Compute);
        assert_eq!(ComputeDecision::decide(false, true), ComputeDecision::Compute);
        assert_eq!(ComputeDecision::decide(true, true), ComputeDecision::InvalidateAndCompute);
        assert_eq!(ComputeDecision::decide(true, false), ComputeDecision::Skip);
        assert!(!ComputeDecision::Skip.computes());
    }
}
