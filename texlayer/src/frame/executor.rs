//! Fan-out of per-pixel work across a worker pool.
//!
//! Small areas run on the calling thread. Areas larger than the threshold
//! are split into disjoint chunks that run on a rayon pool; the call joins
//! every chunk before returning, so callers always see complete results.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use super::FrameError;
use crate::config::EngineConfig;
use crate::geometry::{Area, Point};

/// Number of points above which a transform is split across workers.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 128 * 128;

/// Smallest chunk handed to a worker.
const MIN_CHUNK_POINTS: usize = 64;

/// Runs per-point work sequentially or in parallel depending on area size.
#[derive(Clone)]
pub struct TransformExecutor {
    /// Dedicated pool; `None` uses rayon's global pool.
    pool: Option<Arc<rayon::ThreadPool>>,
    threshold: usize,
}

impl TransformExecutor {
    /// An executor on rayon's global pool.
    pub fn new(threshold: usize) -> Self {
        Self {
            pool: None,
            threshold: threshold.max(1),
        }
    }

    /// An executor with its own pool of `threads` workers.
    pub fn with_threads(threads: usize, threshold: usize) -> Result<Self, FrameError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("texlayer-transform-{}", index))
            .build()
            .map_err(|e| FrameError::WorkerPool(e.to_string()))?;

        tracing::debug!(threads, threshold, "Created transform worker pool");

        Ok(Self {
            pool: Some(Arc::new(pool)),
            threshold: threshold.max(1),
        })
    }

    /// Build an executor from engine configuration.
    ///
    /// Without an explicit worker count the global pool is shared.
    pub fn from_config(config: &EngineConfig) -> Result<Self, FrameError> {
        match config.worker_threads {
            Some(threads) => Self::with_threads(threads, config.parallel_threshold),
            None => Ok(Self::new(config.parallel_threshold)),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether an area of `len` points takes the parallel path.
    pub fn is_parallel(&self, len: usize) -> bool {
        len > self.threshold
    }

    fn worker_count(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Points per chunk so that `len` points spread over every worker.
    pub(crate) fn chunk_size(&self, len: usize) -> usize {
        len.div_ceil(self.worker_count().max(1)).max(MIN_CHUNK_POINTS)
    }

    /// Apply `work` to every point of `area`, preserving area order.
    ///
    /// The first error from any chunk is returned once all chunks finish.
    pub(crate) fn run<T, F>(&self, area: &Area, work: F) -> Result<Vec<T>, FrameError>
    where
        T: Send,
        F: Fn(Point) -> Result<T, FrameError> + Sync,
    {
        if !self.is_parallel(area.len()) {
            return area.iter().map(&work).collect();
        }

        let chunks: Vec<&[Point]> = area.partition(self.chunk_size(area.len())).collect();
        tracing::trace!(
            points = area.len(),
            chunks = chunks.len(),
            "Splitting transform across workers"
        );

        let job = || {
            chunks
                .par_iter()
                .map(|chunk| chunk.iter().copied().map(&work).collect::<Result<Vec<T>, _>>())
                .collect::<Result<Vec<Vec<T>>, _>>()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(job),
            None => job(),
        }?;

        Ok(results.into_iter().flatten().collect())
    }
}

impl Default for TransformExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_THRESHOLD)
    }
}

impl fmt::Debug for TransformExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformExecutor")
            .field(
                "threads",
                &self.pool.as_ref().map(|pool| pool.current_num_threads()),
            )
            .field("threshold", &self.threshold)
            .finish()
    }
}
