//! Git command runner
//!
//! Centralized helpers for running git with consistent error handling.
//! Hooks are launched by Git with variables such as `GIT_DIR` exported, which
//! would redirect any git call made against another repository (a shared hook
//! clone, for instance). Those calls use the sanitized variants.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, Output};

/// Variables Git exports to hooks that pin git commands to the calling repository.
const REPOSITORY_ENV_VARS: &[&str] = &[
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_OBJECT_DIRECTORY",
    "GIT_COMMON_DIR",
    "GIT_PREFIX",
];

fn git_command(args: &[&str], cwd: &Path, sanitize: bool) -> Command {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(cwd);
    if sanitize {
        for var in REPOSITORY_ENV_VARS {
            cmd.env_remove(var);
        }
    }
    cmd
}

/// Run a git command and return the raw Output.
///
/// # Arguments
/// * `args` - Git command arguments (e.g., `&["config", "--get", "core.bare"]`)
/// * `cwd` - Working directory for the git command
/// * `sanitize` - Drop repository-pinning environment variables first
pub fn run_git(args: &[&str], cwd: &Path, sanitize: bool) -> Result<Output> {
    git_command(args, cwd, sanitize)
        .output()
        .with_context(|| format!("Failed to execute: git {}", args.join(" ")))
}

/// Run a git command, check for success, and return stdout trimmed.
pub fn run_git_checked(args: &[&str], cwd: &Path, sanitize: bool) -> Result<String> {
    let output = run_git(args, cwd, sanitize)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git {} failed: {}", args.join(" "), stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a git command and return true if the exit code is 0.
///
/// Spawn failures count as `false`.
pub fn run_git_bool(args: &[&str], cwd: &Path, sanitize: bool) -> bool {
    run_git(args, cwd, sanitize)
        .map(|output| output.status.success())
        .unwrap_or(false)
}
