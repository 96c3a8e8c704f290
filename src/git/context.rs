//! Git configuration access bound to a working directory

use anyhow::Result;
use std::path::PathBuf;

use super::runner::{run_git, run_git_bool, run_git_checked};

/// Scope for reading and writing Git configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    /// `--local`: only the repository's own config file
    Local,
    /// `--global`: the user's config file
    Global,
    /// No scope flag: Git's normal lookup across system, global and local
    Traverse,
}

impl ConfigScope {
    fn flag(&self) -> Option<&'static str> {
        match self {
            ConfigScope::Local => Some("--local"),
            ConfigScope::Global => Some("--global"),
            ConfigScope::Traverse => None,
        }
    }
}

/// A git invocation context: the directory commands run in and whether the
/// repository-pinning environment is stripped.
#[derive(Debug, Clone)]
pub struct GitContext {
    cwd: PathBuf,
    sanitized: bool,
}

impl GitContext {
    /// Context for the repository the current hook runs in.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            sanitized: false,
        }
    }

    /// Context for another repository (e.g. a shared hooks clone).
    pub fn sanitized(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            sanitized: true,
        }
    }

    /// Run git and return trimmed stdout, failing on a non-zero exit.
    pub fn get(&self, args: &[&str]) -> Result<String> {
        run_git_checked(args, &self.cwd, self.sanitized)
    }

    /// Run git and report whether it succeeded.
    pub fn check(&self, args: &[&str]) -> bool {
        run_git_bool(args, &self.cwd, self.sanitized)
    }

    fn config_args<'a>(scope: ConfigScope, rest: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec!["config"];
        if let Some(flag) = scope.flag() {
            args.push(flag);
        }
        args.extend_from_slice(rest);
        args
    }

    /// Read a single config value. Unset keys and git failures yield `None`.
    pub fn get_config(&self, key: &str, scope: ConfigScope) -> Option<String> {
        let args = Self::config_args(scope, &["--get", key]);
        let output = run_git(&args, &self.cwd, self.sanitized).ok()?;
        if !output.status.success() {
            return None;
        }
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Some(value)
    }

    /// Read all values of a multi-valued config key.
    pub fn get_config_all(&self, key: &str, scope: ConfigScope) -> Vec<String> {
        let args = Self::config_args(scope, &["--get-all", key]);
        match run_git(&args, &self.cwd, self.sanitized) {
            Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_config(&self, key: &str, value: &str, scope: ConfigScope) -> Result<()> {
        let args = Self::config_args(scope, &[key, value]);
        run_git_checked(&args, &self.cwd, self.sanitized).map(|_| ())
    }

    /// Absolute path of the common Git directory (shared by all worktrees).
    pub fn common_git_dir(&self) -> Result<PathBuf> {
        let dir = PathBuf::from(self.get(&["rev-parse", "--git-common-dir"])?);
        Ok(if dir.is_absolute() {
            dir
        } else {
            self.cwd.join(dir)
        })
    }

    /// Whether the working directory is a bare repository.
    pub fn is_bare_repo(&self) -> bool {
        self.get(&["rev-parse", "--is-bare-repository"])
            .map(|out| out == "true")
            .unwrap_or(false)
    }
}
