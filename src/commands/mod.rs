//! Command implementations behind the CLI

pub mod ignore;
pub mod list;
pub mod run;
pub mod trust;

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::git::GitContext;

/// The repository the command runs in: the current directory and a Git
/// context bound to it.
pub(crate) fn current_repository() -> Result<(PathBuf, GitContext)> {
    let cwd = env::current_dir().context("Could not get current working dir")?;
    let git = GitContext::new(&cwd);
    Ok((cwd, git))
}
