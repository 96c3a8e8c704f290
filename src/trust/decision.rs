//! Trust decisions for new or changed hooks
//!
//! Every active hook whose content is not trusted goes through
//! [`TrustDecisionFlow::decide`] once per run. The outcome is buffered in a
//! [`TrustRunCache`] and only written to disk by [`TrustRunCache::flush`] at
//! the end of the run.

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use std::path::Path;
use tracing::{debug, info, warn};

use super::store::{ChecksumEntry, ChecksumTrustStore};
use crate::error::PipelineError;
use crate::hooks::Hook;
use crate::ignores::{store_ignore_file, user_ignore_file, IgnorePatternSet};
use crate::prompt::Prompt;

/// Outcome of the trust prompt for one hook.
///
/// Valid transitions:
/// - `Pending` -> `Accepted` | `AcceptedAll` | `Disabled` | `Skipped`
/// - all others are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    /// No answer could be obtained (non-interactive run).
    Pending,
    Accepted,
    /// Accept this and every following hook of the run.
    AcceptedAll,
    /// Add the hook to the user ignore tier.
    Disabled,
    /// Do not run the hook this time.
    Skipped,
}

impl TrustDecision {
    /// Map a prompt answer (`y`, `a`, `n`, `d`).
    pub fn from_answer(answer: &str) -> Self {
        match answer {
            "y" => TrustDecision::Accepted,
            "a" => TrustDecision::AcceptedAll,
            "d" => TrustDecision::Disabled,
            _ => TrustDecision::Skipped,
        }
    }
}

/// Trust changes made during one run.
#[derive(Debug, Default)]
pub struct TrustRunCache {
    pub accept_all_remaining: bool,
    pub newly_trusted: Vec<ChecksumEntry>,
    pub newly_disabled: Vec<ChecksumEntry>,
}

impl TrustRunCache {
    pub fn is_empty(&self) -> bool {
        self.newly_trusted.is_empty() && self.newly_disabled.is_empty()
    }

    /// Persist the buffered decisions.
    ///
    /// Disabled hooks are added to the user ignore tier, which is then written
    /// to `<gitDir>/.githooks.ignore.yaml`; trusted hooks are appended to the
    /// checksum list file. A failure of one write does not skip the other.
    pub fn flush(
        &self,
        store: &mut ChecksumTrustStore,
        user_ignores: &mut IgnorePatternSet,
        git_dir: &Path,
    ) -> Result<()> {
        let disabled = if self.newly_disabled.is_empty() {
            Ok(())
        } else {
            for entry in &self.newly_disabled {
                user_ignores.add_namespace_path(entry.namespace_path.clone());
            }
            store_ignore_file(user_ignores, &user_ignore_file(git_dir))
                .context("Could not store disabled hooks")
        };

        let trusted = store
            .sync_checksum_add(&self.newly_trusted)
            .context("Could not store checksums of trusted hooks");

        match (disabled, trusted) {
            (Ok(()), result) | (result, Ok(())) => result,
            (Err(disabled), Err(trusted)) => Err(anyhow!("{disabled:#}\n{trusted:#}")),
        }
    }
}

/// Asks the user about untrusted hooks.
pub struct TrustDecisionFlow<'p> {
    prompt: &'p mut dyn Prompt,
}

impl<'p> TrustDecisionFlow<'p> {
    pub fn new(prompt: &'p mut dyn Prompt) -> Self {
        Self { prompt }
    }

    /// Decide about an active but untrusted hook and apply the decision to
    /// `hook`, `store` and `cache`.
    pub fn decide(
        &mut self,
        hook: &mut Hook,
        store: &mut ChecksumTrustStore,
        cache: &mut TrustRunCache,
    ) -> Result<TrustDecision, PipelineError> {
        if hook.trusted || !hook.active {
            return Ok(TrustDecision::Skipped);
        }

        let decision = if cache.accept_all_remaining {
            info!("-> Already accepted.");
            TrustDecision::Accepted
        } else if !self.prompt.is_interactive() {
            debug!(
                "Hook '{}' is not trusted and cannot be confirmed non-interactively",
                hook.path.display()
            );
            TrustDecision::Pending
        } else {
            self.ask(hook)
        };

        match decision {
            TrustDecision::Accepted | TrustDecision::AcceptedAll => {
                if decision == TrustDecision::AcceptedAll {
                    cache.accept_all_remaining = true;
                }
                let entry = self.entry_for(hook)?;
                hook.trusted = true;
                store.add_checksum(&entry.hash, &entry.path);
                cache.newly_trusted.push(entry);
            }
            TrustDecision::Disabled => {
                println!(
                    "{} Adding hook\n'{}'\nto disabled list.",
                    "→".dimmed(),
                    hook.path.display()
                );
                let entry = self.entry_for(hook)?;
                hook.active = false;
                cache.newly_disabled.push(entry);
            }
            TrustDecision::Skipped | TrustDecision::Pending => {}
        }

        Ok(decision)
    }

    fn ask(&mut self, hook: &Hook) -> TrustDecision {
        let question = format!(
            "New or changed hook found:\n'{}'\nDo you accept the changes?",
            hook.path.display()
        );

        match self.prompt.show_prompt_options(
            &question,
            "(Yes, all, no, disable)",
            "Y/a/n/d",
            &["Yes", "All", "No", "Disable"],
        ) {
            Ok(answer) => TrustDecision::from_answer(&answer),
            Err(e) => {
                warn!("Could not show prompt: {e:#}");
                TrustDecision::Skipped
            }
        }
    }

    fn entry_for(&self, hook: &Hook) -> Result<ChecksumEntry, PipelineError> {
        let hash = hook
            .content_hash()
            .map_err(|source| PipelineError::TrustAssessment {
                path: hook.path.clone(),
                source,
            })?;
        Ok(ChecksumEntry {
            hash: hash.to_string(),
            path: hook.path.clone(),
            namespace_path: hook.namespace_path.clone(),
        })
    }
}
