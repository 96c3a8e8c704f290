//! Shared hook repositories
//!
//! Shared repositories are configured in three tiers: the repository's
//! `.githooks/.shared` file and the `githooks.shared` entries of the local
//! and global Git config. Cloning and updating them is done elsewhere; this
//! module maps entries to the directories their hooks live in and checks
//! that those directories are usable.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::config::KEY_SHARED;
use crate::error::PipelineError;
use crate::git::{hash_strings, ConfigScope, GitContext};
use crate::hooks::HookCategory;
use crate::HOOKS_DIR_NAME;

/// Repository file listing shared hook repositories.
pub const REPO_SHARED_FILE: &str = ".shared";

/// Length of the readable part of a clone directory name.
const CLONE_NAME_MAX_LEN: usize = 48;

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^:/?#]+://").expect("Invalid regex pattern"));
static SCP_SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+@.+:.+").expect("Invalid regex pattern"));
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("Invalid regex pattern"));

/// Where a shared repository entry is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharedTier {
    /// `.githooks/.shared` in the repository
    Repo,
    /// `githooks.shared` in the local Git config
    Local,
    /// `githooks.shared` in the global Git config
    Global,
}

impl SharedTier {
    pub const ALL: [SharedTier; 3] = [SharedTier::Repo, SharedTier::Local, SharedTier::Global];

    pub fn category(&self) -> HookCategory {
        match self {
            SharedTier::Repo => HookCategory::RepoShared,
            SharedTier::Local => HookCategory::LocalShared,
            SharedTier::Global => HookCategory::GlobalShared,
        }
    }
}

impl fmt::Display for SharedTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SharedTier::Repo => "Repository",
            SharedTier::Local => "Local",
            SharedTier::Global => "Global",
        };
        f.write_str(name)
    }
}

/// One configured shared repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedRepoRef {
    pub tier: SharedTier,
    /// The entry as configured.
    pub original_url: String,
    /// Clone URL without the branch suffix (empty when not cloned).
    pub resolved_url: String,
    pub branch: Option<String>,
    /// Whether hooks are taken from a clone in the install directory.
    pub is_cloned: bool,
    /// Local path or `file://` URL.
    pub is_local_path: bool,
    pub repository_dir: PathBuf,
}

impl SharedRepoRef {
    /// Directory holding the hooks: `<repo>/.githooks` if it exists,
    /// otherwise the repository itself.
    pub fn hooks_root(&self) -> PathBuf {
        let nested = self.repository_dir.join(HOOKS_DIR_NAME);
        if nested.is_dir() {
            nested
        } else {
            self.repository_dir.clone()
        }
    }
}

fn is_local_path(entry: &str) -> bool {
    !(URL_SCHEME.is_match(entry) || SCP_SYNTAX.is_match(entry))
}

fn is_local_url(entry: &str) -> bool {
    entry.starts_with("file://")
}

/// Split `url@branch`. The `@` must come after the last `/` and `:` so that
/// `user@host:path` stays intact.
fn split_branch(entry: &str) -> (String, Option<String>) {
    let Some(at) = entry.rfind('@') else {
        return (entry.to_string(), None);
    };
    let last_sep = entry.rfind(&['/', ':'][..]);
    if at == 0 || last_sep.is_some_and(|sep| sep > at) {
        return (entry.to_string(), None);
    }
    let branch = &entry[at + 1..];
    if branch.is_empty() {
        return (entry[..at].to_string(), None);
    }
    (entry[..at].to_string(), Some(branch.to_string()))
}

/// Clone directory of a shared entry:
/// `<installDir>/shared/<sha1(blob)>-<escaped name>`.
pub fn shared_clone_dir(install_dir: &Path, entry: &str) -> PathBuf {
    let hash = hash_strings(&["blob ", &entry.len().to_string(), "\0", entry]);
    let name: String = entry.chars().take(CLONE_NAME_MAX_LEN).collect();
    let name = NON_ALPHANUMERIC.replace_all(&name, "-");
    install_dir.join("shared").join(format!("{hash}-{name}"))
}

/// Parse one configured entry.
pub fn parse_shared_entry(install_dir: &Path, entry: &str, tier: SharedTier) -> SharedRepoRef {
    let mut repo = SharedRepoRef {
        tier,
        original_url: entry.to_string(),
        resolved_url: String::new(),
        branch: None,
        is_cloned: true,
        is_local_path: false,
        repository_dir: PathBuf::new(),
    };

    let mut split = true;
    if is_local_path(entry) {
        repo.is_local_path = true;
        if GitContext::sanitized(entry).is_bare_repo() {
            split = false;
        } else {
            repo.is_cloned = false;
            repo.repository_dir = PathBuf::from(entry);
        }
    } else if is_local_url(entry) {
        repo.is_local_path = true;
    }

    if repo.is_cloned {
        if split {
            let (url, branch) = split_branch(entry);
            repo.resolved_url = url;
            repo.branch = branch;
        } else {
            repo.resolved_url = entry.to_string();
        }
        repo.repository_dir = shared_clone_dir(install_dir, entry);
    }

    repo
}

/// Parse a list of entries, skipping blanks and `#` comments.
pub fn parse_shared_entries<'a, I>(install_dir: &Path, lines: I, tier: SharedTier) -> Vec<SharedRepoRef>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| parse_shared_entry(install_dir, l, tier))
        .collect()
}

/// Supplies the shared repositories of each tier.
pub trait SharedRepoSource {
    fn list(&self, tier: SharedTier) -> Result<Vec<SharedRepoRef>>;
}

/// Shared repositories from the repository file and the Git config.
pub struct ConfiguredSharedRepos<'a> {
    git: &'a GitContext,
    install_dir: PathBuf,
    repository_hooks_dir: PathBuf,
}

impl<'a> ConfiguredSharedRepos<'a> {
    pub fn new(git: &'a GitContext, install_dir: &Path, repository_hooks_dir: &Path) -> Self {
        Self {
            git,
            install_dir: install_dir.to_path_buf(),
            repository_hooks_dir: repository_hooks_dir.to_path_buf(),
        }
    }
}

impl SharedRepoSource for ConfiguredSharedRepos<'_> {
    fn list(&self, tier: SharedTier) -> Result<Vec<SharedRepoRef>> {
        let entries = match tier {
            SharedTier::Repo => {
                let file = self.repository_hooks_dir.join(REPO_SHARED_FILE);
                if !file.exists() {
                    return Ok(Vec::new());
                }
                let content = fs::read_to_string(&file)
                    .with_context(|| format!("Could not read '{}'", file.display()))?;
                content.lines().map(String::from).collect()
            }
            SharedTier::Local => self.git.get_config_all(KEY_SHARED, ConfigScope::Local),
            SharedTier::Global => self.git.get_config_all(KEY_SHARED, ConfigScope::Global),
        };

        let repos = parse_shared_entries(&self.install_dir, entries.iter().map(String::as_str), tier);
        debug!("{tier} shared repositories: {}", repos.len());
        Ok(repos)
    }
}

/// Fixed shared repositories per tier.
#[derive(Debug, Default)]
pub struct StaticSharedRepos {
    repos: HashMap<SharedTier, Vec<SharedRepoRef>>,
}

impl StaticSharedRepos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, repo: SharedRepoRef) -> Self {
        self.repos.entry(repo.tier).or_default().push(repo);
        self
    }
}

impl SharedRepoSource for StaticSharedRepos {
    fn list(&self, tier: SharedTier) -> Result<Vec<SharedRepoRef>> {
        Ok(self.repos.get(&tier).cloned().unwrap_or_default())
    }
}

/// Report a problem with a shared repository: fatal when `fail` is set,
/// otherwise a warning and the repository is skipped.
fn fail_or_warn(fail: bool, err: PipelineError) -> Result<bool, PipelineError> {
    if fail {
        Err(err)
    } else {
        warn!("{err}\nContinuing...");
        Ok(false)
    }
}

/// Whether hooks of `repo` should be collected.
///
/// `seen` holds the repository directories already collected in this run.
pub fn check_shared_repo(
    repo: &SharedRepoRef,
    seen: &[PathBuf],
    fail_on_non_existing: bool,
) -> Result<bool, PipelineError> {
    if seen.contains(&repo.repository_dir) {
        warn!(
            "Shared hooks entry:\n'{}'\nis already listed and will be skipped.",
            repo.original_url
        );
        return Ok(false);
    }

    if repo.tier == SharedTier::Repo && repo.is_local_path {
        return Err(PipelineError::SharedRepoLocalPath {
            url: repo.original_url.clone(),
        });
    }

    if !repo.repository_dir.exists() {
        let detail = if repo.is_cloned {
            "It is not available. To fix, run:\n$ git hooks shared update"
        } else {
            "It does not exist."
        };
        return fail_or_warn(
            fail_on_non_existing,
            PipelineError::SharedRepoUnavailable {
                url: repo.original_url.clone(),
                detail: detail.to_string(),
            },
        );
    }

    if repo.is_cloned {
        let found = GitContext::sanitized(&repo.repository_dir)
            .get_config("remote.origin.url", ConfigScope::Local)
            .unwrap_or_default();
        if found != repo.resolved_url {
            return fail_or_warn(
                fail_on_non_existing,
                PipelineError::SharedRepoUrlMismatch {
                    url: repo.original_url.clone(),
                    found,
                },
            );
        }
    }

    Ok(true)
}
