//! Execution settings passed to every operation.

use raster::{Catalog, ProcessingMode, RasterError, SampleMode};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// Partitions scheduled per worker thread unless set explicitly.
pub const PARTITIONS_PER_THREAD: usize = 4;

/// Explicitly constructed execution settings.
///
/// Clones share the cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct Context {
    catalog_dir: Option<PathBuf>,
    sample_mode: SampleMode,
    mode: ProcessingMode,
    partitions: Option<usize>,
    cancel: Arc<AtomicBool>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding catalog definitions and samples.
    #[must_use]
    pub fn catalog_dir(mut self, dir: PathBuf) -> Self {
        self.catalog_dir = Some(dir);
        self
    }

    /// How rasters are loaded from the catalog (defaults to in-memory).
    #[must_use]
    pub fn sample_mode(mut self, sample_mode: SampleMode) -> Self {
        self.sample_mode = sample_mode;
        self
    }

    /// How partitions are scheduled (defaults to the global pool).
    #[must_use]
    pub fn processing_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Number of sub-boxes an output is split into (defaults to
    /// [PARTITIONS_PER_THREAD] per worker thread).
    #[must_use]
    pub fn partitions(mut self, partitions: usize) -> Self {
        self.partitions = Some(partitions);
        self
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    pub fn partition_count(&self) -> usize {
        let threads = match self.mode {
            ProcessingMode::Sequential => 1,
            ProcessingMode::Parallel => rayon::current_num_threads(),
            ProcessingMode::ParallelWith(threads) => threads.max(1),
        };
        self.partitions
            .unwrap_or(threads * PARTITIONS_PER_THREAD)
            .max(1)
    }

    /// Asks running and future executions to stop before their next
    /// partition.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn cancel_flag(&self) -> &AtomicBool {
        &self.cancel
    }

    /// Opens the configured catalog directory, or an empty in-memory
    /// catalog when none is set.
    pub fn open_catalog(&self) -> Result<Catalog, RasterError> {
        match &self.catalog_dir {
            Some(dir) => Catalog::open(dir.clone(), self.sample_mode),
            None => Ok(Catalog::in_memory(self.sample_mode)),
        }
    }
}
