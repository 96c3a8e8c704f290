//! `githooks list`: show which hooks would run, without running them

use anyhow::Result;
use colored::Colorize;
use std::fmt::Write;

use super::run::settings_for;
use crate::hooks::{collect_for_names_without_executing, ListedHook, MANAGED_HOOK_NAMES};
use crate::ignores::load_user_tier;
use crate::prompt::NoPrompt;
use crate::shared::ConfiguredSharedRepos;
use crate::trust::{resolve_repo_trust, ChecksumTrustStore};

/// List hooks for `hook_names`, or for all managed hooks when empty.
pub fn execute(hook_names: Vec<String>) -> Result<()> {
    let (cwd, git) = super::current_repository()?;

    let names: Vec<&str> = if hook_names.is_empty() {
        MANAGED_HOOK_NAMES.to_vec()
    } else {
        hook_names.iter().map(String::as_str).collect()
    };

    let mut settings = settings_for(&git, &cwd, names[0])?;
    settings.is_repo_trusted = resolve_repo_trust(&git, &cwd, &mut NoPrompt)?;

    let store = ChecksumTrustStore::open_default(&settings.git_dir, settings.checksum_cache_dir.as_deref());
    let user_ignores = load_user_tier(&settings.git_dir);
    let shared = ConfiguredSharedRepos::new(&git, &settings.install_dir, &settings.repository_hooks_dir);

    let listed = collect_for_names_without_executing(&settings, &user_ignores, &store, &shared, &names)?;
    print!("{}", format_listing(&names, &listed));
    Ok(())
}

fn state_label(hook: &ListedHook) -> colored::ColoredString {
    if !hook.hook.active {
        "ignored".yellow()
    } else if !hook.hook.trusted {
        "untrusted".red()
    } else {
        "active".green()
    }
}

/// One block per hook name that has hooks.
pub fn format_listing(hook_names: &[&str], listed: &[ListedHook]) -> String {
    let mut out = String::new();

    for name in hook_names {
        let hooks: Vec<_> = listed.iter().filter(|l| l.hook_name == *name).collect();
        if hooks.is_empty() {
            continue;
        }

        let _ = writeln!(out, "{}", format!("{name}:").bold());
        for listed_hook in hooks {
            let _ = writeln!(
                out,
                "  - '{}' ({}) [{}]",
                listed_hook.hook.namespace_path,
                state_label(listed_hook),
                listed_hook.tag.name().dimmed()
            );
        }
    }

    if out.is_empty() {
        out.push_str("No hooks found.\n");
    }
    out
}
