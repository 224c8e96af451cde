//! Worker threads for per-office transitions.

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// How many threads advance offices in parallel.
///
/// `0` uses the global rayon pool (all cores), `1` runs on the caller's
/// thread, anything else builds a dedicated pool once per run.
#[derive(Debug)]
pub struct WorkerPool {
    workers: usize,
    pool: Option<ThreadPool>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = if workers > 1 {
            Some(ThreadPoolBuilder::new().num_threads(workers).build()?)
        } else {
            None
        };
        Ok(Self { workers, pool })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_sequential(&self) -> bool {
        self.workers == 1
    }

    /// Run `f` inside this pool.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }
}
