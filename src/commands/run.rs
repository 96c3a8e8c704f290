//! `githooks run`: the entry point Git's hook stubs call
//!
//! Order of a run:
//! 1. repository trust, checksum store and ignore patterns are loaded
//! 2. Git LFS hooks and the replaced hook run (the only hooks run when
//!    Githooks is disabled)
//! 3. local and shared hooks are collected, prompting for untrusted ones
//! 4. the hooks execute category by category, stopping at the first failure
//! 5. trust and disable decisions are written back, also after a failure

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{HookInvocation, RunSettings};
use crate::error::PipelineError;
use crate::exec::{ExecContext, HookResult, HookRunner, ParallelExecutor, ProcessRunner};
use crate::git::{
    is_lfs_available, run_lfs_hook, staged_files, GitContext, ENV_STAGED_FILES, LFS_HOOK_NAMES,
    LFS_REQUIRED_FILE_NAME, STAGED_FILES_HOOK_NAMES,
};
use crate::hooks::{HookCategories, HookCategory, HookCollector};
use crate::ignores::RepoIgnorePatterns;
use crate::prompt::{create_prompt, Prompt};
use crate::shared::{ConfiguredSharedRepos, SharedRepoSource};
use crate::trust::{resolve_repo_trust, ChecksumTrustStore, TrustRunCache};

/// What a run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub replaced_executed: bool,
    /// Hooks executed from the four categories.
    pub executed: usize,
}

/// Execute the hooks for the Git hook at `hook_path`.
pub fn execute(hook_path: PathBuf, args: Vec<String>) -> Result<()> {
    let (cwd, git) = super::current_repository()?;

    let invocation = HookInvocation::new(&hook_path, args)?;
    let mut settings = RunSettings::load(&git, &cwd, invocation)?;
    let mut prompt = create_prompt(settings.non_interactive);
    let shared = ConfiguredSharedRepos::new(&git, &settings.install_dir, &settings.repository_hooks_dir);

    let summary = run_pipeline(&git, &mut settings, prompt.as_mut(), &shared)?;
    debug!(
        "All done [replaced hook: {}, hooks: {}]",
        summary.replaced_executed, summary.executed
    );
    Ok(())
}

/// The full run for already resolved settings.
///
/// Pending trust decisions are stored even if a hook fails.
pub fn run_pipeline(
    git: &GitContext,
    settings: &mut RunSettings,
    prompt: &mut dyn Prompt,
    shared: &dyn SharedRepoSource,
) -> Result<RunSummary> {
    settings.is_repo_trusted = resolve_repo_trust(git, &settings.repository_path, prompt)?;

    let mut store =
        ChecksumTrustStore::open_default(&settings.git_dir, settings.checksum_cache_dir.as_deref());
    let mut ignores = RepoIgnorePatterns::load(
        &settings.repository_hooks_dir,
        &settings.git_dir,
        &[settings.hook_name()],
    );
    debug!(
        "Ignore patterns: hooks dir '{:?}', user '{:?}'",
        ignores.directory.patterns().collect::<Vec<_>>(),
        ignores.user.patterns().collect::<Vec<_>>()
    );

    let mut cache = TrustRunCache::default();
    let result = run_hooks(git, settings, &ignores, &mut store, prompt, &mut cache, shared);

    let flushed = if cache.is_empty() {
        Ok(())
    } else {
        cache.flush(&mut store, &mut ignores.user, &settings.git_dir)
    };

    match (result, flushed) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e.into()),
        (Err(e), Err(flush_err)) => {
            warn!("{flush_err:#}");
            Err(e.into())
        }
    }
}

fn run_hooks(
    git: &GitContext,
    settings: &RunSettings,
    ignores: &RepoIgnorePatterns,
    store: &mut ChecksumTrustStore,
    prompt: &mut dyn Prompt,
    cache: &mut TrustRunCache,
    shared: &dyn SharedRepoSource,
) -> Result<RunSummary, PipelineError> {
    let mut summary = RunSummary::default();
    let mut ctx = ExecContext::new(&settings.repository_path);
    let args = &settings.invocation.args;

    let mut collector = HookCollector::new(settings, ignores, store, prompt, cache);

    if settings.disabled {
        debug!("Githooks is disabled, only LFS and the replaced hook run");
        execute_lfs_hooks(settings, is_lfs_available())?;
        summary.replaced_executed = run_replaced(&mut collector, args, &ctx)?;
        return Ok(summary);
    }

    if STAGED_FILES_HOOK_NAMES.contains(&settings.hook_name()) {
        match staged_files(git) {
            Ok(files) => ctx = ctx.with_env(ENV_STAGED_FILES, files),
            Err(e) => warn!("Could not list staged files: {e:#}"),
        }
    }

    execute_lfs_hooks(settings, is_lfs_available())?;
    summary.replaced_executed = run_replaced(&mut collector, args, &ctx)?;

    let categories = collector.collect(shared)?;
    log_categories(&categories);

    let executor = ParallelExecutor::for_hooks(settings.thread_count, categories.hook_count(), ctx);
    summary.executed = executor.execute_categories(&categories, args, &mut report_result)?;

    Ok(summary)
}

/// Forward LFS hook names to `git lfs`.
///
/// Without `git-lfs` this is only an error if the repository demands LFS
/// through `.githooks/.lfs-required`.
pub fn execute_lfs_hooks(settings: &RunSettings, lfs_available: bool) -> Result<(), PipelineError> {
    let hook_name = settings.hook_name();
    if !LFS_HOOK_NAMES.contains(&hook_name) {
        return Ok(());
    }

    if !lfs_available {
        let required = settings.repository_hooks_dir.join(LFS_REQUIRED_FILE_NAME);
        if required.is_file() {
            return Err(PipelineError::LfsRequired { file: required });
        }
        debug!("Git LFS not available");
        return Ok(());
    }

    debug!("Executing LFS hook");
    run_lfs_hook(&settings.repository_path, hook_name, &settings.invocation.args).map_err(|e| {
        PipelineError::LfsHookFailed {
            hook_name: hook_name.to_string(),
            reason: format!("{e:#}"),
        }
    })
}

/// Run the replaced hook with the terminal attached.
fn run_replaced(collector: &mut HookCollector<'_>, args: &[String], ctx: &ExecContext) -> Result<bool, PipelineError> {
    let Some(hook) = collector.collect_replaced()? else {
        return Ok(false);
    };

    ProcessRunner
        .run_attached(&hook, args, ctx)
        .map_err(|e| PipelineError::HookFailed {
            namespace_path: hook.namespace_path.clone(),
            command: hook.command_line(args),
            reason: e.to_string(),
        })?;
    Ok(true)
}

fn log_categories(categories: &HookCategories) {
    for category in HookCategory::ALL {
        let list = categories.get(category);
        if list.is_empty() {
            debug!("{category} hooks: none");
            continue;
        }
        for (idx, batch) in list.batches.iter().enumerate() {
            for hook in batch {
                debug!(
                    "{category} hooks, batch {idx}: '{}' [runner: {:?}]",
                    hook.path.display(),
                    hook.run_spec
                );
            }
        }
    }
}

/// Write a hook's output to stderr; Git may be using stdin and stdout.
fn report_result(category: HookCategory, result: &HookResult<'_>) {
    let mut stderr = io::stderr().lock();
    if !result.output.is_empty() {
        let _ = stderr.write_all(&result.output);
    }
    if let Some(error) = &result.error {
        let _ = writeln!(
            stderr,
            "{} {} hook '{}' failed: {}",
            "✗".red().bold(),
            category,
            result.hook.namespace_path,
            error
        );
    }
}

/// Settings for running `hook_name` in `repository_path` without a hook stub,
/// used by `list` and tests.
pub fn settings_for(git: &GitContext, repository_path: &Path, hook_name: &str) -> Result<RunSettings> {
    let git_dir = git.common_git_dir().context("Could not get git directory")?;
    let invocation = HookInvocation::new(&git_dir.join("hooks").join(hook_name), Vec::new())?;
    RunSettings::load(git, repository_path, invocation)
}
