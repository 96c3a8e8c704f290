//! Hook collection
//!
//! Walks every hooks root (the repository's `.githooks`, the shared
//! repositories of all three tiers and the replaced-hook slot), decides for
//! each candidate whether it is active and trusted, and assembles the
//! executable hooks into [`HookCategories`].

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::namespace::{
    make_namespace_path, resolve_namespace, HooksSource, NAMESPACE_REPLACED_HOOK,
};
use super::run_spec::{detect_run_spec, RUNNER_SUFFIX};
use super::{replaced_hook_file_name, Hook, HookCategories, HookCategory, HookPriorityList, HookTag};
use crate::config::RunSettings;
use crate::error::PipelineError;
use crate::ignores::{load_directory_tier, IgnorePatternSet, RepoIgnorePatterns};
use crate::prompt::Prompt;
use crate::shared::{check_shared_repo, SharedRepoSource, SharedTier};
use crate::trust::{ChecksumTrustStore, TrustDecisionFlow, TrustRunCache};

/// Which ignore tiers may suppress a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IgnoreScope {
    /// Directory and user tier, plus the hooks root's own ignore files
    All,
    /// Only the user tier (replaced hooks)
    UserOnly,
}

/// Builds [`Hook`]s for one hook name without side effects.
struct Scanner<'s> {
    hook_name: &'s str,
    repository_hooks_dir: &'s Path,
    is_repo_trusted: bool,
    ignores: &'s RepoIgnorePatterns,
    store: &'s ChecksumTrustStore,
    /// Skip hashing and runner detection for ignored hooks.
    lazy_if_ignored: bool,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Candidate files for `hook_name` below `hooks_root`: the file
/// `<root>/<hookName>` or every file in the directory `<root>/<hookName>/`.
fn enumerate_candidates(hooks_root: &Path, hook_name: &str) -> Result<Vec<PathBuf>, walkdir::Error> {
    let dir_or_file = hooks_root.join(hook_name);

    if dir_or_file.is_dir() {
        let mut files = Vec::new();
        let walker = WalkDir::new(&dir_or_file)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        for entry in walker {
            let entry = entry?;
            let is_runner_file = entry
                .file_name()
                .to_string_lossy()
                .ends_with(RUNNER_SUFFIX);
            if entry.file_type().is_file() && !is_runner_file {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    } else if dir_or_file.is_file() {
        Ok(vec![dir_or_file])
    } else {
        Ok(Vec::new())
    }
}

impl Scanner<'_> {
    /// Inspect one candidate file.
    fn build_hook(&self, path: PathBuf, namespace_path: String, ignored: bool) -> Result<Hook, PipelineError> {
        let mut hook = Hook::new(path, namespace_path);
        hook.active = !ignored;

        if ignored && self.lazy_if_ignored {
            return Ok(hook);
        }

        if self.is_repo_trusted {
            hook.trusted = true;
        } else {
            let (trusted, hash) =
                self.store
                    .is_trusted(&hook.path)
                    .map_err(|source| PipelineError::TrustAssessment {
                        path: hook.path.clone(),
                        source,
                    })?;
            hook.trusted = trusted;
            hook.set_content_hash(hash);
        }

        hook.run_spec = Some(detect_run_spec(&hook.path).map_err(|source| PipelineError::Runner {
            path: hook.path.clone(),
            source,
        })?);

        Ok(hook)
    }

    fn is_ignored(&self, namespace_path: &str, scope: IgnoreScope, root_ignores: &IgnorePatternSet) -> bool {
        let (ignored, by_user) = self.ignores.is_ignored(namespace_path);
        match scope {
            IgnoreScope::All => ignored || root_ignores.matches(namespace_path),
            IgnoreScope::UserOnly => ignored && by_user,
        }
    }

    /// All hooks of one hooks root. Unreadable roots are logged and yield
    /// nothing.
    fn scan_root(&self, hooks_root: &Path, source: &HooksSource) -> Result<Vec<Hook>, PipelineError> {
        debug!("Getting hooks in '{}'", hooks_root.display());

        let namespace = match resolve_namespace(hooks_root, source) {
            Ok(ns) => ns,
            Err(e) => {
                warn!(
                    "Could not get hook namespace in '{}': {e}. Skipping.",
                    hooks_root.display()
                );
                return Ok(Vec::new());
            }
        };

        let candidates = match enumerate_candidates(hooks_root, self.hook_name) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "Errors while collecting hooks in '{}': {e}. Skipping.",
                    hooks_root.display()
                );
                return Ok(Vec::new());
            }
        };
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // The repository's own ignore files are already the directory tier.
        let root_ignores = if hooks_root == self.repository_hooks_dir {
            IgnorePatternSet::new()
        } else {
            load_directory_tier(hooks_root, &[self.hook_name])
        };

        candidates
            .into_iter()
            .map(|path| {
                let namespace_path = make_namespace_path(hooks_root, &path, &namespace)
                    .unwrap_or_else(|| path.to_string_lossy().replace('\\', "/"));
                let ignored = self.is_ignored(&namespace_path, IgnoreScope::All, &root_ignores);
                self.build_hook(path, namespace_path, ignored)
            })
            .collect()
    }

    /// The replaced hook `<hookDir>/<hookName>.replaced.githook`, if present.
    fn scan_replaced(&self, hook_dir: &Path) -> Result<Option<Hook>, PipelineError> {
        let path = hook_dir.join(replaced_hook_file_name(self.hook_name));
        if !path.is_file() {
            debug!("Old hook:\n'{}'\ndoes not exist. -> Skip!", path.display());
            return Ok(None);
        }

        let namespace = resolve_namespace(hook_dir, &HooksSource::Replaced).unwrap_or_else(|e| {
            warn!("Could not get hook namespace in '{}': {e}", hook_dir.display());
            NAMESPACE_REPLACED_HOOK.to_string()
        });
        let namespace_path = make_namespace_path(hook_dir, &path, &namespace)
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let ignored = self.is_ignored(&namespace_path, IgnoreScope::UserOnly, &IgnorePatternSet::new());

        self.build_hook(path, namespace_path, ignored).map(Some)
    }
}

/// Collects the hooks to execute for the current invocation, prompting for
/// untrusted hooks.
pub struct HookCollector<'a> {
    settings: &'a RunSettings,
    ignores: &'a RepoIgnorePatterns,
    store: &'a mut ChecksumTrustStore,
    flow: TrustDecisionFlow<'a>,
    cache: &'a mut TrustRunCache,
}

impl<'a> HookCollector<'a> {
    pub fn new(
        settings: &'a RunSettings,
        ignores: &'a RepoIgnorePatterns,
        store: &'a mut ChecksumTrustStore,
        prompt: &'a mut dyn Prompt,
        cache: &'a mut TrustRunCache,
    ) -> Self {
        Self {
            settings,
            ignores,
            store,
            flow: TrustDecisionFlow::new(prompt),
            cache,
        }
    }

    fn scanner(&self) -> Scanner<'_> {
        Scanner {
            hook_name: self.settings.hook_name(),
            repository_hooks_dir: &self.settings.repository_hooks_dir,
            is_repo_trusted: self.settings.is_repo_trusted,
            ignores: self.ignores,
            store: &*self.store,
            lazy_if_ignored: true,
        }
    }

    /// Run the trust decision if needed and keep the hook if it may run.
    fn admit(&mut self, mut hook: Hook) -> Result<Option<Hook>, PipelineError> {
        if hook.active && !hook.trusted {
            self.flow.decide(&mut hook, self.store, self.cache)?;
        }

        if hook.is_runnable() {
            Ok(Some(hook))
        } else {
            debug!(
                "Hook '{}' is skipped [active: '{}', trusted: '{}']",
                hook.path.display(),
                hook.active,
                hook.trusted
            );
            Ok(None)
        }
    }

    fn collect_root(&mut self, hooks_root: &Path, source: &HooksSource) -> Result<HookPriorityList, PipelineError> {
        let hooks = self.scanner().scan_root(hooks_root, source)?;

        let mut list = HookPriorityList::default();
        for hook in hooks {
            if let Some(hook) = self.admit(hook)? {
                list.push_single(hook);
            }
        }
        Ok(list)
    }

    /// The replaced hook, if present, active and trusted.
    ///
    /// It can only be ignored through the user tier.
    pub fn collect_replaced(&mut self) -> Result<Option<Hook>, PipelineError> {
        let hook_dir = self.settings.invocation.hook_dir.clone();
        let replaced = self.scanner().scan_replaced(&hook_dir)?;
        match replaced {
            Some(hook) => self.admit(hook),
            None => Ok(None),
        }
    }

    /// Local and shared hooks, grouped by category.
    pub fn collect(&mut self, shared: &dyn SharedRepoSource) -> Result<HookCategories, PipelineError> {
        let mut categories = HookCategories::default();

        let repository_hooks_dir = self.settings.repository_hooks_dir.clone();
        categories.local = self.collect_root(&repository_hooks_dir, &HooksSource::Repository)?;

        let fail = self.settings.fail_on_non_existing_shared_hooks;
        let mut seen: Vec<PathBuf> = Vec::new();

        for tier in SharedTier::ALL {
            let repos = match shared.list(tier) {
                Ok(repos) => repos,
                Err(e) if fail => {
                    return Err(PipelineError::SharedRepoList {
                        tier,
                        message: format!("{e:#}"),
                    })
                }
                Err(e) => {
                    warn!("{tier} shared hooks could not be listed: {e:#}");
                    continue;
                }
            };

            for repo in &repos {
                if !check_shared_repo(repo, &seen, fail)? {
                    continue;
                }
                let source = HooksSource::Shared {
                    original_url: repo.original_url.clone(),
                };
                let list = self.collect_root(&repo.hooks_root(), &source)?;
                categories.get_mut(tier.category()).extend(list);
                seen.push(repo.repository_dir.clone());
            }
        }

        for category in HookCategory::ALL {
            debug!(
                "{category} hooks: {}",
                categories.get(category).hook_count()
            );
        }
        Ok(categories)
    }
}

/// A hook found by [`collect_for_names_without_executing`].
#[derive(Debug)]
pub struct ListedHook {
    pub hook_name: String,
    pub tag: HookTag,
    pub hook: Hook,
}

/// All hooks for `hook_names`, including ignored and untrusted ones, without
/// prompting or changing any state.
///
/// The repository's directory tier is loaded per hook name, as a run of that
/// hook would load it; `user_ignores` applies to every name. Problems with
/// shared repositories are reported as warnings.
pub fn collect_for_names_without_executing(
    settings: &RunSettings,
    user_ignores: &IgnorePatternSet,
    store: &ChecksumTrustStore,
    shared: &dyn SharedRepoSource,
    hook_names: &[&str],
) -> Result<Vec<ListedHook>, PipelineError> {
    let mut listed = Vec::new();

    let mut shared_roots = Vec::new();
    let mut seen: Vec<PathBuf> = Vec::new();
    for tier in SharedTier::ALL {
        let repos = match shared.list(tier) {
            Ok(repos) => repos,
            Err(e) => {
                warn!("{tier} shared hooks could not be listed: {e:#}");
                continue;
            }
        };
        for repo in repos {
            match check_shared_repo(&repo, &seen, false) {
                Ok(true) => {
                    seen.push(repo.repository_dir.clone());
                    shared_roots.push(repo);
                }
                Ok(false) => {}
                Err(e) => warn!("{e}"),
            }
        }
    }

    for hook_name in hook_names {
        let ignores = RepoIgnorePatterns {
            directory: load_directory_tier(&settings.repository_hooks_dir, &[*hook_name]),
            user: user_ignores.clone(),
        };
        let scanner = Scanner {
            hook_name,
            repository_hooks_dir: &settings.repository_hooks_dir,
            is_repo_trusted: settings.is_repo_trusted,
            ignores: &ignores,
            store,
            lazy_if_ignored: false,
        };

        let mut push = |tag: HookTag, hooks: Vec<Hook>| {
            listed.extend(hooks.into_iter().map(|hook| ListedHook {
                hook_name: hook_name.to_string(),
                tag,
                hook,
            }));
        };

        if let Some(hook) = scanner.scan_replaced(&settings.invocation.hook_dir)? {
            push(HookTag::Replaced, vec![hook]);
        }
        push(
            HookTag::Repository,
            scanner.scan_root(&settings.repository_hooks_dir, &HooksSource::Repository)?,
        );
        for repo in &shared_roots {
            let source = HooksSource::Shared {
                original_url: repo.original_url.clone(),
            };
            push(
                HookTag::from(repo.tier.category()),
                scanner.scan_root(&repo.hooks_root(), &source)?,
            );
        }
    }

    Ok(listed)
}
