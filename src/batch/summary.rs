//! Bounded worker pool that summarizes many instances into one writer.
//!
//! Each worker loads the ranked candidates of one instance and contributes
//! them to the shared [`FormulaSummaryWriter`]. The project-wide files are
//! rendered only after every worker has been joined, so no contribution can
//! arrive after the render.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{info, warn};

use crate::batch::dataset::{DataSetJob, DataSetTool};
use crate::compound::CompoundId;
use crate::config::BatchConfig;
use crate::error::{BatchError, SpaceResult};
use crate::instance::Instance;
use crate::summary::{FormulaSummaryWriter, SummaryWriter};

/// Result of one summary batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Instances whose candidates were contributed.
    pub contributed: usize,
    /// Instances without any candidate.
    pub empty: usize,
    /// Instances that failed, with the error message.
    pub failed: Vec<(CompoundId, String)>,
}

enum Outcome {
    Contributed,
    Empty,
    Failed(CompoundId, String),
}

fn summarize(
    summary: &FormulaSummaryWriter,
    writer: &dyn SummaryWriter,
    instance: &Instance,
) -> SpaceResult<bool> {
    let results = instance.load_formula_results(
        &summary.ranking_config().ranking_scores,
        FormulaSummaryWriter::required_components(),
    )?;
    if results.is_empty() {
        return Ok(false);
    }
    summary.add_write_compound_summary(writer, instance.id(), &results)?;
    Ok(true)
}

struct Workers {
    tx: Sender<Arc<Instance>>,
    handles: Vec<(String, JoinHandle<()>)>,
}

impl Workers {
    fn start(
        config: BatchConfig,
        summary: &Arc<FormulaSummaryWriter>,
        writer: &Arc<dyn SummaryWriter>,
        outcomes: &Sender<Outcome>,
    ) -> Result<Self, BatchError> {
        let (tx, rx) = bounded::<Arc<Instance>>(config.queue_capacity.max(1));
        let mut pool = Self {
            tx,
            handles: Vec::with_capacity(config.workers),
        };

        for idx in 0..config.workers.max(1) {
            let rx: Receiver<Arc<Instance>> = rx.clone();
            let summary = Arc::clone(summary);
            let writer = Arc::clone(writer);
            let outcomes = outcomes.clone();
            let name = format!("formulaspace-summary-{idx}");
            let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
                for instance in rx {
                    let outcome = match summarize(&summary, writer.as_ref(), &instance) {
                        Ok(true) => Outcome::Contributed,
                        Ok(false) => Outcome::Empty,
                        Err(e) => {
                            warn!(compound = %instance.id(), error = %e, "skipping failed instance");
                            Outcome::Failed(instance.id().clone(), e.to_string())
                        }
                    };
                    let _ = outcomes.send(outcome);
                }
            });
            match spawned {
                Ok(handle) => pool.handles.push((name, handle)),
                Err(source) => {
                    pool.shutdown()?;
                    return Err(BatchError::Spawn { worker: name, source });
                }
            }
        }
        Ok(pool)
    }

    fn submit(&self, instance: Arc<Instance>) -> Result<(), BatchError> {
        self.tx.send(instance).map_err(|_| BatchError::Disconnected)
    }

    /// Closes the queue, lets workers drain it and joins them.
    fn shutdown(self) -> Result<(), BatchError> {
        drop(self.tx);
        let mut panicked = None;
        for (name, handle) in self.handles {
            if handle.join().is_err() && panicked.is_none() {
                panicked = Some(name);
            }
        }
        match panicked {
            Some(worker) => Err(BatchError::WorkerPanicked { worker }),
            None => Ok(()),
        }
    }
}

/// Summarizes instances in parallel and writes the project-wide files.
pub struct SummaryBatch {
    config: BatchConfig,
    summary: Arc<FormulaSummaryWriter>,
    writer: Arc<dyn SummaryWriter>,
}

impl SummaryBatch {
    /// Validates `config`; `summary` collects, `writer` receives the files.
    pub fn new(
        config: BatchConfig,
        summary: Arc<FormulaSummaryWriter>,
        writer: Arc<dyn SummaryWriter>,
    ) -> SpaceResult<Self> {
        Ok(Self {
            config: config.validate()?,
            summary,
            writer,
        })
    }

    /// The shared aggregator.
    #[must_use]
    pub fn summary(&self) -> &Arc<FormulaSummaryWriter> {
        &self.summary
    }

    /// A data-set job over this batch using the configured recompute mode.
    #[must_use]
    pub const fn job(&self) -> DataSetJob<'_, Self> {
        DataSetJob::from_config(self, &self.config)
    }

    /// Runs one pass over `instances`.
    ///
    /// Failed instances are logged, reported and left out of every view.
    pub fn run(&self, instances: Vec<Arc<Instance>>) -> SpaceResult<BatchReport> {
        info!(
            instances = instances.len(),
            workers = self.config.workers,
            "starting summary batch"
        );

        let (outcome_tx, outcome_rx) = unbounded::<Outcome>();
        let workers = Workers::start(self.config, &self.summary, &self.writer, &outcome_tx)?;
        drop(outcome_tx);

        let mut submit_err = None;
        for instance in instances {
            if let Err(e) = workers.submit(instance) {
                submit_err = Some(e);
                break;
            }
        }
        workers.shutdown()?;
        if let Some(e) = submit_err {
            return Err(e.into());
        }

        let mut report = BatchReport::default();
        for outcome in outcome_rx.try_iter() {
            match outcome {
                Outcome::Contributed => report.contributed += 1,
                Outcome::Empty => report.empty += 1,
                Outcome::Failed(id, message) => report.failed.push((id, message)),
            }
        }

        self.summary.write_project_summary(self.writer.as_ref())?;
        info!(
            contributed = report.contributed,
            empty = report.empty,
            failed = report.failed.len(),
            "finished summary batch"
        );
        Ok(report)
    }
}

impl DataSetTool for SummaryBatch {
    type Output = BatchReport;

    fn name(&self) -> &str {
        "formula-summary"
    }

    fn is_valid_input(&self, instance: &Instance) -> SpaceResult<bool> {
        Ok(instance.has_formula_results()?)
    }

    /// Summaries are always regenerated.
    fn is_already_computed(&self, _instance: &Instance) -> SpaceResult<bool> {
        Ok(false)
    }

    fn invalidate_results(&self, _instance: &Instance) -> SpaceResult<()> {
        Ok(())
    }

    fn compute(&self, instances: &[Arc<Instance>]) -> SpaceResult<BatchReport> {
        self.run(instances.to_vec())
    }
}

