//! Run settings resolved from the Git configuration and the environment
//!
//! [`RunSettings`] is built once per hook invocation and then passed by
//! reference through collection and execution.

use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::git::{ConfigScope, GitContext};
use crate::HOOKS_DIR_NAME;

pub const KEY_TRUST_ALL: &str = "githooks.trust.all";
pub const KEY_NUM_THREADS: &str = "githooks.numThreads";
pub const KEY_FAIL_ON_NON_EXISTING_SHARED_HOOKS: &str = "githooks.failOnNonExistingSharedHooks";
pub const KEY_CHECKSUM_CACHE_DIR: &str = "githooks.checksumCacheDir";
pub const KEY_DISABLE: &str = "githooks.disable";
pub const KEY_SHARED: &str = "githooks.shared";
pub const KEY_INSTALL_DIR: &str = "githooks.installDir";

pub const ENV_DISABLE: &str = "GITHOOKS_DISABLE";
pub const ENV_NON_INTERACTIVE: &str = "GITHOOKS_NON_INTERACTIVE";

/// The hook Git asked us to run.
#[derive(Debug, Clone)]
pub struct HookInvocation {
    /// Absolute path of the hook Git invoked (e.g. `<gitDir>/hooks/pre-commit`)
    pub hook_path: PathBuf,
    /// File name of the hook, e.g. `pre-commit`
    pub hook_name: String,
    /// Directory containing the invoked hook
    pub hook_dir: PathBuf,
    /// Arguments Git passed to the hook
    pub args: Vec<String>,
}

impl HookInvocation {
    pub fn new(hook_path: &Path, args: Vec<String>) -> Result<Self> {
        let hook_path = if hook_path.is_absolute() {
            hook_path.to_path_buf()
        } else {
            env::current_dir()
                .context("Could not get current working dir")?
                .join(hook_path)
        };

        let hook_name = match hook_path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => bail!("Invalid hook path '{}'", hook_path.display()),
        };
        let hook_dir = hook_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self {
            hook_path,
            hook_name,
            hook_dir,
            args,
        })
    }
}

/// Everything a run needs to know, resolved up front.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub invocation: HookInvocation,
    pub repository_path: PathBuf,
    /// `<repository>/.githooks`
    pub repository_hooks_dir: PathBuf,
    /// Absolute common Git directory
    pub git_dir: PathBuf,
    pub install_dir: PathBuf,
    pub is_repo_trusted: bool,
    pub fail_on_non_existing_shared_hooks: bool,
    pub thread_count: usize,
    pub non_interactive: bool,
    pub disabled: bool,
    pub checksum_cache_dir: Option<PathBuf>,
}

impl RunSettings {
    /// Resolve settings for a hook run in `repository_path`.
    ///
    /// `is_repo_trusted` only reflects the stored configuration here; the
    /// trust-all prompt is handled by [`crate::trust::repo::resolve_repo_trust`].
    pub fn load(git: &GitContext, repository_path: &Path, invocation: HookInvocation) -> Result<Self> {
        let git_dir = git
            .common_git_dir()
            .context("Could not get git directory")?;

        let settings = Self {
            repository_hooks_dir: repository_path.join(HOOKS_DIR_NAME),
            repository_path: repository_path.to_path_buf(),
            git_dir,
            install_dir: resolve_install_dir(git.get_config(KEY_INSTALL_DIR, ConfigScope::Global)),
            is_repo_trusted: is_truthy(git.get_config(KEY_TRUST_ALL, ConfigScope::Local).as_deref()),
            fail_on_non_existing_shared_hooks: git
                .get_config(KEY_FAIL_ON_NON_EXISTING_SHARED_HOOKS, ConfigScope::Traverse)
                .as_deref()
                == Some("true"),
            thread_count: resolve_thread_count(
                git.get_config(KEY_NUM_THREADS, ConfigScope::Traverse).as_deref(),
            ),
            non_interactive: env_flag(ENV_NON_INTERACTIVE),
            disabled: is_disabled(git),
            checksum_cache_dir: git
                .get_config(KEY_CHECKSUM_CACHE_DIR, ConfigScope::Traverse)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            invocation,
        };

        debug!(?settings, "Resolved run settings");
        Ok(settings)
    }

    pub fn hook_name(&self) -> &str {
        &self.invocation.hook_name
    }
}

/// Number of worker threads for hook execution.
///
/// A positive integer setting wins; anything else falls back to the number of
/// logical CPUs.
pub fn resolve_thread_count(setting: Option<&str>) -> usize {
    let cpus = || {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    };

    match setting.map(str::trim) {
        None | Some("") => cpus(),
        Some(value) => match value.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                warn!("Invalid '{KEY_NUM_THREADS}' value '{value}', using CPU count");
                cpus()
            }
        },
    }
}

/// Install directory from config, falling back to `~/.githooks` when unset
/// or missing on disk.
pub fn resolve_install_dir(configured: Option<String>) -> PathBuf {
    let default = || {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(HOOKS_DIR_NAME)
    };

    match configured.filter(|dir| !dir.is_empty()) {
        None => default(),
        Some(dir) => {
            let dir = PathBuf::from(dir);
            if dir.exists() {
                dir
            } else {
                let fallback = default();
                warn!(
                    "Githooks installation is corrupt! Install directory at '{}' is missing. \
                     Falling back to '{}'.",
                    dir.display(),
                    fallback.display()
                );
                fallback
            }
        }
    }
}

/// Whether Githooks is disabled by environment or configuration.
pub fn is_disabled(git: &GitContext) -> bool {
    env_flag(ENV_DISABLE) || is_truthy(git.get_config(KEY_DISABLE, ConfigScope::Traverse).as_deref())
}

/// `true`, `y` or `Y`.
pub fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("true" | "y" | "Y"))
}

/// An environment flag counts as set when present and not `0`, `false` or empty.
pub fn env_flag(name: &str) -> bool {
    match env::var(name) {
        Ok(value) => !matches!(value.trim(), "" | "0" | "false"),
        Err(_) => false,
    }
}
