//! Ignore patterns for hooks
//!
//! Hooks are ignored by namespace path, either through glob patterns
//! (`*`, `?`, `[...]` stay within one path segment, `**` spans any number of
//! segments, a leading `!` re-includes what earlier patterns matched) or
//! through exact namespace paths, which cannot be re-included.
//!
//! Two tiers exist per run: the directory tier committed with the hooks and
//! the user tier stored in the Git directory.

pub mod file;

use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub use file::{
    load_directory_tier, load_ignore_file, load_user_tier, store_ignore_file, user_ignore_file,
    IgnoreFile, IGNORE_FILE_NAME, USER_IGNORE_FILE_NAME,
};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Error)]
pub enum IgnoreError {
    #[error("Malformed ignore pattern '{pattern}': {reason}")]
    MalformedPattern { pattern: String, reason: String },

    #[error("Could not read ignore file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse ignore file '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Could not write ignore file '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One validated glob pattern.
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    raw: String,
    glob: Pattern,
    inverted: bool,
}

impl IgnorePattern {
    pub fn parse(raw: &str) -> Result<Self, IgnoreError> {
        let malformed = |reason: &str| IgnoreError::MalformedPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let (inverted, body) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        if body.is_empty() {
            return Err(malformed("empty pattern"));
        }
        if body.contains('\\') {
            return Err(malformed("only forward slashes are allowed"));
        }

        let glob = Pattern::new(body).map_err(|e| malformed(e.msg))?;
        Ok(Self {
            raw: raw.to_string(),
            glob,
            inverted,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    fn is_match(&self, namespace_path: &str) -> bool {
        self.glob.matches_with(namespace_path, MATCH_OPTIONS)
    }
}

/// Glob patterns plus exact namespace paths.
#[derive(Debug, Clone, Default)]
pub struct IgnorePatternSet {
    patterns: Vec<IgnorePattern>,
    namespace_paths: BTreeSet<String>,
}

impl IgnorePatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a pattern.
    pub fn add_pattern(&mut self, raw: &str) -> Result<(), IgnoreError> {
        self.patterns.push(IgnorePattern::parse(raw)?);
        Ok(())
    }

    /// Append patterns, dropping malformed ones with a warning.
    ///
    /// Returns the rejected patterns' errors.
    pub fn add_patterns_lossy<'a, I>(&mut self, raws: I) -> Vec<IgnoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut errors = Vec::new();
        for raw in raws {
            if let Err(e) = self.add_pattern(raw) {
                warn!("{e}");
                errors.push(e);
            }
        }
        errors
    }

    pub fn add_namespace_path(&mut self, namespace_path: impl Into<String>) {
        self.namespace_paths.insert(namespace_path.into());
    }

    /// Append the other set's patterns after this set's patterns.
    pub fn extend(&mut self, other: &IgnorePatternSet) {
        self.patterns.extend(other.patterns.iter().cloned());
        self.namespace_paths
            .extend(other.namespace_paths.iter().cloned());
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(IgnorePattern::as_str)
    }

    pub fn namespace_paths(&self) -> impl Iterator<Item = &str> {
        self.namespace_paths.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.namespace_paths.is_empty()
    }

    /// Whether `namespace_path` is ignored by this set.
    ///
    /// Patterns are applied in order: a plain pattern can only turn the result
    /// on, an inverted one can only turn it off. Exact namespace paths are
    /// checked last and always win.
    pub fn matches(&self, namespace_path: &str) -> bool {
        let mut matched = false;

        for pattern in &self.patterns {
            if matched && !pattern.inverted {
                continue;
            }
            let is_match = pattern.is_match(namespace_path);
            if pattern.inverted {
                matched = matched && !is_match;
            } else {
                matched = matched || is_match;
            }
        }

        matched || self.namespace_paths.contains(namespace_path)
    }
}

impl PartialEq for IgnorePatternSet {
    fn eq(&self, other: &Self) -> bool {
        self.patterns().eq(other.patterns()) && self.namespace_paths == other.namespace_paths
    }
}

/// The directory tier and the user tier of one run.
#[derive(Debug, Clone, Default)]
pub struct RepoIgnorePatterns {
    pub directory: IgnorePatternSet,
    pub user: IgnorePatternSet,
}

impl RepoIgnorePatterns {
    /// Directory tier of the repository's hooks for `hook_names` and the
    /// user tier of `git_dir`.
    pub fn load(repository_hooks_dir: &Path, git_dir: &Path, hook_names: &[&str]) -> Self {
        Self {
            directory: load_directory_tier(repository_hooks_dir, hook_names),
            user: load_user_tier(git_dir),
        }
    }

    /// Returns `(ignored, ignored_by_user_tier)`.
    pub fn is_ignored(&self, namespace_path: &str) -> (bool, bool) {
        if self.directory.matches(namespace_path) {
            (true, false)
        } else if self.user.matches(namespace_path) {
            (true, true)
        } else {
            (false, false)
        }
    }
}
