//! Fatal pipeline errors and their top-level report
//!
//! Everything that must abort a hook run ends up as a [`PipelineError`].
//! Best-effort failures (unreadable ignore files, stale checksum files) never
//! reach this type; they are logged where they happen.

use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::git::{ConfigScope, GitContext};
use crate::hooks::RunnerError;
use crate::shared::SharedTier;
use crate::{DEFAULT_BUG_REPORT_URL, HOOKS_DIR_NAME};

/// Conditions that abort the whole hook run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The content hash of a candidate hook could not be computed, so its
    /// trust status is unknown.
    #[error("Could not get hash for '{}'", path.display())]
    TrustAssessment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not detect runner for hook\n'{}'", path.display())]
    Runner {
        path: PathBuf,
        #[source]
        source: RunnerError,
    },

    #[error("Hook '{namespace_path}' failed: {reason}\n  command: {command}")]
    HookFailed {
        namespace_path: String,
        command: String,
        reason: String,
    },

    #[error("Execution of LFS hook '{hook_name}' failed: {reason}")]
    LfsHookFailed { hook_name: String, reason: String },

    #[error(
        "This repository requires Git LFS, but 'git-lfs' was not found on your PATH.\n\
         If you no longer want to use Git LFS, remove the '{}' file.",
        file.display()
    )]
    LfsRequired { file: PathBuf },

    #[error("Failed to execute shared hooks in:\n'{url}'\n{detail}")]
    SharedRepoUnavailable { url: String, detail: String },

    #[error(
        "Failed to execute shared hooks in '{url}'\n\
         The remote URL '{found}' is different.\n\
         To fix it, run:\n  $ git hooks shared purge\n  $ git hooks shared update"
    )]
    SharedRepoUrlMismatch { url: String, found: String },

    #[error(
        "Shared hooks in '.githooks/.shared' contain a local path\n'{url}'\n\
         which is forbidden.\n\n\
         You can only have local paths in shared hooks defined\n\
         in the local or global Git configuration."
    )]
    SharedRepoLocalPath { url: String },

    #[error("{tier} shared hooks are demanded but could not be listed: {message}")]
    SharedRepoList { tier: SharedTier, message: String },
}

/// Get the bug reporting hint for fatal errors.
///
/// Looks at `.githooks/.bug-report` in the repository first, then at the
/// global `githooks.bugReportInfo` setting, and falls back to the default URL.
pub fn bug_report_info(repo_path: Option<&Path>, git: Option<&GitContext>) -> String {
    if let Some(repo) = repo_path {
        let file = repo.join(HOOKS_DIR_NAME).join(".bug-report");
        if let Ok(content) = fs::read_to_string(&file) {
            let content = content.trim();
            if !content.is_empty() {
                return content.to_string();
            }
        }
    }

    if let Some(info) = git.and_then(|g| g.get_config("githooks.bugReportInfo", ConfigScope::Global)) {
        return info;
    }

    format!("-> Report this bug to: '{DEFAULT_BUG_REPORT_URL}'")
}

/// Format a fatal error with its cause chain and the bug-report hint.
pub fn format_fatal(err: &anyhow::Error, bug_info: &str) -> String {
    let mut message = format!("{err}");
    for cause in err.chain().skip(1) {
        message.push_str(&format!("\n  caused by: {cause}"));
    }
    format!("Githooks: {message}\nFatal error -> Abort.\n{bug_info}")
}

/// Print a fatal error to stderr.
pub fn report_fatal(err: &anyhow::Error, bug_info: &str) {
    let text = format_fatal(err, bug_info);
    eprintln!("{} {}", "✗".red().bold(), text.red());
}
