//! Hook execution
//!
//! [`ParallelExecutor`] walks the collected [`HookCategories`] in order and
//! hands each batch to a [`HookRunner`], through a [`WorkerPool`] when the
//! batch holds more than one hook.
//!
//! [`HookCategories`]: crate::hooks::HookCategories

pub mod executor;
pub mod pool;
pub mod process;

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

use crate::hooks::Hook;

pub use executor::ParallelExecutor;
pub use pool::{Job, RayonWorkerPool, SequentialPool, WorkerPool};
pub use process::{HookRunner, ProcessRunner};

/// Why a hook did not succeed.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("could not launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("could not collect output of '{command}': {source}")]
    Output {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{status}")]
    Status { status: ExitStatus },
}

/// Where hooks run and what they get in addition to the inherited environment.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    pub working_dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl ExecContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Outcome of one hook execution.
#[derive(Debug)]
pub struct HookResult<'h> {
    pub hook: &'h Hook,
    /// Combined stdout and stderr.
    pub output: Vec<u8>,
    pub error: Option<ExecError>,
}

impl HookResult<'_> {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
