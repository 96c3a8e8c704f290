//! Git plumbing used by the hook runner
//!
//! This module provides:
//! - A command runner with optional environment sanitizing
//! - Config access by scope
//! - Git-compatible blob hashing for hook content
//! - The staged file list exported to commit hooks
//! - Git LFS hook forwarding

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

pub mod context;
pub mod hash;
pub mod runner;

pub use context::{ConfigScope, GitContext};
pub use hash::{hash_file, hash_strings};
pub use runner::{run_git, run_git_bool, run_git_checked};

/// Hook names which get the staged file list exported.
pub const STAGED_FILES_HOOK_NAMES: [&str; 3] = ["pre-commit", "prepare-commit-msg", "commit-msg"];

/// Hook names Git LFS installs hooks for.
pub const LFS_HOOK_NAMES: [&str; 4] = ["post-checkout", "post-commit", "post-merge", "pre-push"];

/// Marker in the repository's hooks directory demanding Git LFS.
pub const LFS_REQUIRED_FILE_NAME: &str = ".lfs-required";

/// Environment variable holding the newline separated staged files.
pub const ENV_STAGED_FILES: &str = "STAGED_FILES";

/// List staged files (added, copied, modified, renamed), one per line.
pub fn staged_files(git: &GitContext) -> Result<String> {
    git.get(&["diff", "--cached", "--diff-filter=ACMR", "--name-only"])
}

/// Whether `git-lfs` is on `PATH`.
pub fn is_lfs_available() -> bool {
    which::which("git-lfs").is_ok()
}

/// Run `git lfs <hook_name> <args>` in `cwd` with the terminal attached.
pub fn run_lfs_hook(cwd: &Path, hook_name: &str, args: &[String]) -> Result<()> {
    let status = Command::new("git")
        .arg("lfs")
        .arg(hook_name)
        .args(args)
        .current_dir(cwd)
        .status()
        .with_context(|| format!("Failed to execute: git lfs {hook_name}"))?;
    if !status.success() {
        bail!("git lfs {hook_name} failed: {status}");
    }
    Ok(())
}
