//! Formula summaries: aggregation across compounds and TSV output.

pub mod alphanum;
mod aggregator;
mod table;
mod writer;

pub use aggregator::{FormulaSummaryWriter, SummaryView, FORMULA_CANDIDATES};
pub use table::{round_half_up, ResultEntry, SummaryTable};
pub use writer::{DirectoryWriter, MemorySummaryWriter, SummaryWriter};
