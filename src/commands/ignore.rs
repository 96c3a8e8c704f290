//! `githooks ignore`: manage ignore patterns

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::ignores::{
    load_ignore_file, store_ignore_file, user_ignore_file, IgnoreError, IgnorePattern, IGNORE_FILE_NAME,
};
use crate::HOOKS_DIR_NAME;

/// Which ignore file to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreTarget {
    /// `<gitDir>/.githooks.ignore.yaml`
    User,
    /// `.githooks/.ignore.yaml`, or `.githooks/<hookName>/.ignore.yaml`
    Repository { hook_name: Option<String> },
}

impl IgnoreTarget {
    pub fn file(&self, repository_path: &Path, git_dir: &Path) -> PathBuf {
        match self {
            IgnoreTarget::User => user_ignore_file(git_dir),
            IgnoreTarget::Repository { hook_name } => {
                let mut dir = repository_path.join(HOOKS_DIR_NAME);
                if let Some(name) = hook_name {
                    dir.push(name);
                }
                dir.join(IGNORE_FILE_NAME)
            }
        }
    }
}

/// Add patterns and namespace paths to the ignore file of `target`.
pub fn add(patterns: Vec<String>, namespace_paths: Vec<String>, target: IgnoreTarget) -> Result<()> {
    let (cwd, git) = super::current_repository()?;
    let git_dir = git.common_git_dir().context("Could not get git directory")?;
    let file = target.file(&cwd, &git_dir);

    let added = add_to_file(&file, &patterns, &namespace_paths)
        .with_context(|| format!("Could not add ignore entries to '{}'", file.display()))?;

    if added == 0 {
        println!("Nothing new to add to '{}'.", file.display());
    } else {
        println!(
            "{} Added {added} ignore entr{} to '{}'.",
            "✓".green().bold(),
            if added == 1 { "y" } else { "ies" },
            file.display()
        );
    }
    Ok(())
}

/// Validate every pattern, then add the new entries to the file at `path`.
///
/// Nothing is written if any pattern is malformed. Returns the number of
/// entries that were not present yet.
pub fn add_to_file(path: &Path, patterns: &[String], namespace_paths: &[String]) -> Result<usize, IgnoreError> {
    for pattern in patterns {
        IgnorePattern::parse(pattern)?;
    }

    let mut set = load_ignore_file(path)?;
    let mut added = 0;

    for pattern in patterns {
        if !set.patterns().any(|p| p == pattern.as_str()) {
            set.add_pattern(pattern)?;
            added += 1;
        }
    }
    for namespace_path in namespace_paths {
        if !set.namespace_paths().any(|p| p == namespace_path.as_str()) {
            set.add_namespace_path(namespace_path.as_str());
            added += 1;
        }
    }

    if added > 0 {
        store_ignore_file(&set, path)?;
    }
    Ok(added)
}
