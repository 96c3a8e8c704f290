//! Fail-fast execution of collected hooks

use tracing::{debug, warn};

use super::pool::{Job, RayonWorkerPool, WorkerPool};
use super::process::{HookRunner, ProcessRunner};
use super::{ExecContext, HookResult};
use crate::error::PipelineError;
use crate::hooks::{HookCategories, HookCategory, HookPriorityList};

/// Executes hook lists batch by batch.
pub struct ParallelExecutor {
    runner: Box<dyn HookRunner>,
    pool: Option<Box<dyn WorkerPool>>,
    ctx: ExecContext,
}

impl ParallelExecutor {
    pub fn new(runner: Box<dyn HookRunner>, pool: Option<Box<dyn WorkerPool>>, ctx: ExecContext) -> Self {
        Self { runner, pool, ctx }
    }

    /// Process runner with a rayon pool of `thread_count` workers. The pool is
    /// only created when there are at least two hooks to run.
    pub fn for_hooks(thread_count: usize, hook_count: usize, ctx: ExecContext) -> Self {
        let pool: Option<Box<dyn WorkerPool>> = if hook_count >= 2 {
            match RayonWorkerPool::new(thread_count) {
                Ok(pool) => Some(Box::new(pool)),
                Err(e) => {
                    warn!("Could not create worker pool, running hooks sequentially: {e}");
                    None
                }
            }
        } else {
            None
        };
        Self::new(Box::new(ProcessRunner), pool, ctx)
    }

    /// Run every batch of `list` in order and return all results.
    ///
    /// Batches of two or more hooks go to the pool; results keep the order of
    /// the list either way.
    pub fn execute_list<'h>(&'h self, list: &'h HookPriorityList, args: &'h [String]) -> Vec<HookResult<'h>> {
        let mut results = Vec::with_capacity(list.hook_count());

        for batch in &list.batches {
            match &self.pool {
                Some(pool) if batch.len() >= 2 => {
                    let runner = self.runner.as_ref();
                    let ctx = &self.ctx;
                    let jobs: Vec<Job<'_>> = batch
                        .iter()
                        .map(|hook| Box::new(move || runner.run(hook, args, ctx)) as Job<'_>)
                        .collect();
                    results.extend(pool.submit(jobs));
                }
                _ => {
                    results.extend(batch.iter().map(|hook| self.runner.run(hook, args, &self.ctx)));
                }
            }
        }

        results
    }

    /// Run all categories in order.
    ///
    /// Every result of a category is passed to `report` once the category is
    /// done. If any hook of the category failed, the first failure is returned
    /// and later categories are not started. Returns the number of executed
    /// hooks otherwise.
    pub fn execute_categories(
        &self,
        categories: &HookCategories,
        args: &[String],
        report: &mut dyn FnMut(HookCategory, &HookResult<'_>),
    ) -> Result<usize, PipelineError> {
        let mut executed = 0;

        for category in HookCategory::ALL {
            let list = categories.get(category);
            if list.is_empty() {
                continue;
            }
            debug!("Launching {category} hooks ...");

            let results = self.execute_list(list, args);
            let mut first_failure = None;
            for result in &results {
                report(category, result);
                if let (None, Some(error)) = (&first_failure, &result.error) {
                    first_failure = Some(PipelineError::HookFailed {
                        namespace_path: result.hook.namespace_path.clone(),
                        command: result.hook.command_line(args),
                        reason: error.to_string(),
                    });
                }
            }

            if let Some(err) = first_failure {
                return Err(err);
            }
            executed += results.len();
        }

        Ok(executed)
    }
}
