//! Batch execution over many instances.

mod dataset;
mod summary;

pub use dataset::{ComputeDecision, DataSetJob, DataSetReport, DataSetTool};
pub use summary::{BatchReport, SummaryBatch};
