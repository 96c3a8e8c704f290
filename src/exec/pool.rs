//! Worker pools for running the hooks of one batch

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::debug;

use super::HookResult;

/// One hook execution, ready to run on any thread.
pub type Job<'a> = Box<dyn FnOnce() -> HookResult<'a> + Send + 'a>;

/// Runs a set of jobs and returns their results in submission order.
pub trait WorkerPool: Send + Sync {
    fn submit<'a>(&self, jobs: Vec<Job<'a>>) -> Vec<HookResult<'a>>;
}

/// Bounded rayon pool.
pub struct RayonWorkerPool {
    pool: ThreadPool,
}

impl RayonWorkerPool {
    pub fn new(num_threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads.max(1))
            .thread_name(|i| format!("githooks-worker-{i}"))
            .build()?;
        debug!("Created worker pool with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl WorkerPool for RayonWorkerPool {
    fn submit<'a>(&self, jobs: Vec<Job<'a>>) -> Vec<HookResult<'a>> {
        // `collect` on an indexed parallel iterator keeps the input order.
        self.pool
            .install(|| jobs.into_par_iter().map(|job| job()).collect())
    }
}

/// Runs jobs one after another on the calling thread.
#[derive(Debug, Default)]
pub struct SequentialPool;

impl WorkerPool for SequentialPool {
    fn submit<'a>(&self, jobs: Vec<Job<'a>>) -> Vec<HookResult<'a>> {
        jobs.into_iter().map(|job| job()).collect()
    }
}
