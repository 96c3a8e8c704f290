//! Hook model
//!
//! A [`Hook`] is one runnable file discovered for the current invocation.
//! Hooks are grouped into batches (hooks that may run concurrently), batches
//! into a [`HookPriorityList`] (run strictly in order) and the lists into
//! [`HookCategories`], which are executed in the fixed order of
//! [`HookCategory::ALL`].

pub mod collector;
pub mod namespace;
pub mod run_spec;

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::git::hash_file;

pub use collector::{collect_for_names_without_executing, HookCollector, ListedHook};
pub use namespace::{make_namespace_path, resolve_namespace, HooksSource};
pub use run_spec::{detect_run_spec, RunSpec, RunnerError};

/// Git hooks Githooks manages, in the order they are listed.
pub const MANAGED_HOOK_NAMES: [&str; 19] = [
    "applypatch-msg",
    "pre-applypatch",
    "post-applypatch",
    "pre-commit",
    "prepare-commit-msg",
    "commit-msg",
    "post-commit",
    "pre-rebase",
    "post-checkout",
    "post-merge",
    "pre-push",
    "pre-receive",
    "update",
    "post-receive",
    "post-update",
    "push-to-checkout",
    "pre-auto-gc",
    "post-rewrite",
    "sendemail-validate",
];

/// Suffix of a hook that was replaced by the Githooks runner.
pub const REPLACED_HOOK_SUFFIX: &str = ".replaced.githook";

/// File name of the replaced hook for `hook_name`.
pub fn replaced_hook_file_name(hook_name: &str) -> String {
    format!("{hook_name}{REPLACED_HOOK_SUFFIX}")
}

/// A hook discovered for this run.
#[derive(Debug)]
pub struct Hook {
    pub path: PathBuf,
    /// `None` when the hook was ignored and never inspected.
    pub run_spec: Option<RunSpec>,
    pub namespace_path: String,
    pub active: bool,
    pub trusted: bool,
    content_hash: OnceLock<String>,
}

impl Hook {
    pub fn new(path: PathBuf, namespace_path: String) -> Self {
        Self {
            path,
            run_spec: None,
            namespace_path,
            active: true,
            trusted: false,
            content_hash: OnceLock::new(),
        }
    }

    /// Record a hash computed elsewhere (e.g. by the trust store).
    pub fn set_content_hash(&self, hash: String) {
        let _ = self.content_hash.set(hash);
    }

    /// Hash of the file content, computed at most once.
    pub fn content_hash(&self) -> io::Result<&str> {
        if let Some(hash) = self.content_hash.get() {
            return Ok(hash);
        }
        let hash = hash_file(&self.path)?;
        Ok(self.content_hash.get_or_init(|| hash))
    }

    pub fn cached_hash(&self) -> Option<&str> {
        self.content_hash.get().map(String::as_str)
    }

    /// Active and trusted.
    pub fn is_runnable(&self) -> bool {
        self.active && self.trusted
    }

    /// Program and arguments to launch this hook with `args` appended.
    pub fn command(&self, args: &[String]) -> (String, Vec<String>) {
        let spec = self.run_spec.as_ref().unwrap_or(&RunSpec::Direct);
        let (program, mut all_args) = spec.command_for(&self.path);
        all_args.extend(args.iter().cloned());
        (program, all_args)
    }

    /// Shell-quoted command line, for messages.
    pub fn command_line(&self, args: &[String]) -> String {
        let (program, args) = self.command(args);
        std::iter::once(program)
            .chain(args)
            .map(|s| shell_escape::escape(s.into()).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Hooks that may run concurrently.
pub type HookBatch = Vec<Hook>;

/// Batches executed strictly in order.
#[derive(Debug, Default)]
pub struct HookPriorityList {
    pub batches: Vec<HookBatch>,
}

impl HookPriorityList {
    /// Append a batch holding only `hook`.
    pub fn push_single(&mut self, hook: Hook) {
        self.batches.push(vec![hook]);
    }

    pub fn extend(&mut self, other: HookPriorityList) {
        self.batches.extend(other.batches);
    }

    pub fn hook_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.hook_count() == 0
    }

    pub fn hooks(&self) -> impl Iterator<Item = &Hook> {
        self.batches.iter().flatten()
    }
}

/// Source category of collected hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookCategory {
    Local,
    RepoShared,
    LocalShared,
    GlobalShared,
}

impl HookCategory {
    /// Execution order.
    pub const ALL: [HookCategory; 4] = [
        HookCategory::Local,
        HookCategory::RepoShared,
        HookCategory::LocalShared,
        HookCategory::GlobalShared,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HookCategory::Local => "local",
            HookCategory::RepoShared => "repository shared",
            HookCategory::LocalShared => "local shared",
            HookCategory::GlobalShared => "global shared",
        }
    }
}

impl fmt::Display for HookCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// All collected hooks, one priority list per category.
#[derive(Debug, Default)]
pub struct HookCategories {
    pub local: HookPriorityList,
    pub repo_shared: HookPriorityList,
    pub local_shared: HookPriorityList,
    pub global_shared: HookPriorityList,
}

impl HookCategories {
    pub fn get(&self, category: HookCategory) -> &HookPriorityList {
        match category {
            HookCategory::Local => &self.local,
            HookCategory::RepoShared => &self.repo_shared,
            HookCategory::LocalShared => &self.local_shared,
            HookCategory::GlobalShared => &self.global_shared,
        }
    }

    pub fn get_mut(&mut self, category: HookCategory) -> &mut HookPriorityList {
        match category {
            HookCategory::Local => &mut self.local,
            HookCategory::RepoShared => &mut self.repo_shared,
            HookCategory::LocalShared => &mut self.local_shared,
            HookCategory::GlobalShared => &mut self.global_shared,
        }
    }

    pub fn hook_count(&self) -> usize {
        HookCategory::ALL
            .iter()
            .map(|c| self.get(*c).hook_count())
            .sum()
    }
}

/// Tag shown in hook listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookTag {
    Replaced,
    Repository,
    SharedRepo,
    SharedLocal,
    SharedGlobal,
}

impl HookTag {
    pub fn name(&self) -> &'static str {
        match self {
            HookTag::Replaced => "replaced",
            HookTag::Repository => "repo",
            HookTag::SharedRepo => "shared:repo",
            HookTag::SharedLocal => "shared:local",
            HookTag::SharedGlobal => "shared:global",
        }
    }
}

impl From<HookCategory> for HookTag {
    fn from(category: HookCategory) -> Self {
        match category {
            HookCategory::Local => HookTag::Repository,
            HookCategory::RepoShared => HookTag::SharedRepo,
            HookCategory::LocalShared => HookTag::SharedLocal,
            HookCategory::GlobalShared => HookTag::SharedGlobal,
        }
    }
}

impl fmt::Display for HookTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
