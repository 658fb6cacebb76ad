//! Destinations for rendered summary tables.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::SummaryError;
use crate::summary::table::SummaryTable;

/// Receives rendered tables under project-relative paths.
pub trait SummaryWriter: Send + Sync {
    /// Writes `table` to `relative_path`, replacing any previous content.
    fn write_table(&self, relative_path: &Path, table: &SummaryTable) -> Result<(), SummaryError>;
}

/// Writes tables as files below a project root directory.
#[derive(Debug, Clone)]
pub struct DirectoryWriter {
    root: PathBuf,
}

impl DirectoryWriter {
    /// Writes below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SummaryWriter for DirectoryWriter {
    fn write_table(&self, relative_path: &Path, table: &SummaryTable) -> Result<(), SummaryError> {
        let path = self.root.join(relative_path);
        let io_err = |source| SummaryError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = File::create(&path).map_err(io_err)?;
        table.write_to(BufWriter::new(file))
    }
}

/// Keeps written tables in memory as TSV text.
#[derive(Debug, Default)]
pub struct MemorySummaryWriter {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemorySummaryWriter {
    /// An empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Content written to `path`, if any.
    pub fn get(&self, path: impl AsRef<Path>) -> Result<Option<String>, SummaryError> {
        let files = self
            .files
            .lock()
            .map_err(|_| SummaryError::Poisoned { context: "memory_writer.get" })?;
        Ok(files.get(path.as_ref()).cloned())
    }

    /// Every written path, sorted.
    pub fn paths(&self) -> Result<Vec<PathBuf>, SummaryError> {
        let files = self
            .files
            .lock()
            .map_err(|_| SummaryError::Poisoned { context: "memory_writer.paths" })?;
        Ok(files.keys().cloned().collect())
    }
}

impl SummaryWriter for MemorySummaryWriter {
    fn write_table(&self, relative_path: &Path, table: &SummaryTable) -> Result<(), SummaryError> {
        let text = table.to_tsv()?;
        self.files
            .lock()
            .map_err(|_| SummaryError::Poisoned {
                context: "memory_writer.write_table",
            })?
            .insert(relative_path.to_path_buf(), text);
        Ok(())
    }
}
