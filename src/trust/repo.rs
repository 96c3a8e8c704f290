//! Repository-wide trust
//!
//! A repository can ask to be trusted as a whole by committing
//! `.githooks/trust-all`. The user answers once; the answer is kept in the
//! local Git config under `githooks.trust.all`.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

use crate::config::{is_truthy, KEY_TRUST_ALL};
use crate::git::{ConfigScope, GitContext};
use crate::prompt::Prompt;
use crate::HOOKS_DIR_NAME;

/// Marker file requesting repository-wide trust.
pub const TRUST_ALL_FILE: &str = "trust-all";

/// Whether all hooks of the repository are trusted, prompting once when the
/// repository requests it and no answer is stored yet.
pub fn resolve_repo_trust(
    git: &GitContext,
    repo_path: &Path,
    prompt: &mut dyn Prompt,
) -> Result<bool> {
    if !repo_path.join(HOOKS_DIR_NAME).join(TRUST_ALL_FILE).exists() {
        return Ok(false);
    }

    match git.get_config(KEY_TRUST_ALL, ConfigScope::Local) {
        Some(flag) => Ok(is_truthy(Some(&flag))),
        None if !prompt.is_interactive() => {
            debug!("Repository requests trust-all, but no prompt is available");
            Ok(false)
        }
        None => {
            let question = "This repository wants you to trust all current and\n\
                            future hooks without prompting.\n\
                            Do you want to allow running every current and future hooks?";

            let trusted = match prompt.show_prompt_options(question, "(yes, No)", "y/N", &["Yes", "No"]) {
                Ok(answer) => answer == "y",
                Err(e) => {
                    warn!("Could not show prompt: {e:#}");
                    false
                }
            };

            git.set_config(KEY_TRUST_ALL, if trusted { "true" } else { "false" }, ConfigScope::Local)
                .with_context(|| format!("Could not store trust setting '{KEY_TRUST_ALL}'"))?;
            Ok(trusted)
        }
    }
}
