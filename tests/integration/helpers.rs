//! Shared test helpers for pipeline integration tests

use std::env;
use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use githooks::commands::run::settings_for;
use githooks::config::RunSettings;
use githooks::git::GitContext;

/// Test helper: Create a temporary git repository with initial commit
pub fn init_test_repo() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let repo_root = temp_dir.path();

    git(repo_root, &["init", "-q"]);
    git(repo_root, &["config", "user.email", "test@test.com"]);
    git(repo_root, &["config", "user.name", "Test User"]);

    fs::write(repo_root.join("README.md"), "# Test Repository\n").expect("Failed to write README.md");
    git(repo_root, &["add", "."]);
    git(repo_root, &["commit", "-q", "-m", "Initial commit"]);

    temp_dir
}

/// Run git in `dir`, ignoring any repository the test process runs in.
pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .env_remove("GIT_INDEX_FILE")
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Test helper: Write an executable hook script
pub fn write_hook(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().expect("hook has a parent")).expect("Failed to create hook dir");
    fs::write(path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write hook");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("Failed to chmod hook");
}

/// Test helper: Hook body that records its run by creating `marker`
pub fn touch(marker: &Path) -> String {
    format!("touch '{}'", marker.display())
}

/// Restores `PATH` when dropped.
pub struct PathGuard {
    previous: Option<OsString>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(path) => env::set_var("PATH", path),
            None => env::remove_var("PATH"),
        }
    }
}

/// Test helper: Put `dir` in front of `PATH` until the guard is dropped
pub fn prepend_path(dir: &Path) -> PathGuard {
    let previous = env::var_os("PATH");
    let mut dirs = vec![dir.to_path_buf()];
    if let Some(path) = &previous {
        dirs.extend(env::split_paths(path));
    }
    env::set_var("PATH", env::join_paths(dirs).expect("Invalid PATH entry"));
    PathGuard { previous }
}

/// Git context and settings for `hook_name` in `repo`.
pub fn context(repo: &Path, hook_name: &str) -> (GitContext, RunSettings) {
    let git = GitContext::sanitized(repo);
    let mut settings = settings_for(&git, repo, hook_name).expect("Failed to load settings");
    settings.disabled = false;
    settings.non_interactive = false;
    settings.fail_on_non_existing_shared_hooks = false;
    settings.thread_count = 2;
    (git, settings)
}

/// Lines of the checksum list file in the Git directory.
pub fn checksum_lines(repo: &Path) -> Vec<String> {
    let file: PathBuf = repo.join(".git").join(".githooks.checksum");
    fs::read_to_string(file)
        .map(|c| c.lines().map(String::from).collect())
        .unwrap_or_default()
}
