//! End-to-end hook runs: trust prompts, persistence and fail-fast execution

use serial_test::serial;
use std::fs;

use githooks::commands::run::{execute_lfs_hooks, run_pipeline, RunSummary};
use githooks::error::PipelineError;
use githooks::prompt::{NoPrompt, ScriptedPrompt};
use githooks::shared::{parse_shared_entry, SharedTier, StaticSharedRepos};

use super::helpers::{checksum_lines, context, git, init_test_repo, prepend_path, touch, write_hook};

#[test]
#[serial]
fn test_fail_fast_stops_later_categories() {
    let temp = init_test_repo();
    let repo = temp.path();
    let markers = tempfile::TempDir::new().unwrap();

    fs::create_dir_all(repo.join(".githooks")).unwrap();
    fs::write(repo.join(".githooks/trust-all"), "").unwrap();
    git(repo, &["config", "--local", "githooks.trust.all", "true"]);

    write_hook(
        &repo.join(".githooks/pre-commit/a-ok.sh"),
        &touch(&markers.path().join("local-ok")),
    );
    write_hook(&repo.join(".githooks/pre-commit/b-fail.sh"), "echo 'lint failed'\nexit 1");
    write_hook(
        &repo.join(".githooks/pre-commit/c-after.sh"),
        &touch(&markers.path().join("local-after")),
    );

    let shared_dir = markers.path().join("shared");
    write_hook(
        &shared_dir.join("pre-commit"),
        &touch(&markers.path().join("shared-ran")),
    );
    let shared = StaticSharedRepos::new().with(parse_shared_entry(
        &repo.join("install"),
        &shared_dir.to_string_lossy(),
        SharedTier::Local,
    ));

    let (git_ctx, mut settings) = context(repo, "pre-commit");
    let err = run_pipeline(&git_ctx, &mut settings, &mut NoPrompt, &shared).unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::HookFailed { namespace_path, .. }) => {
            assert_eq!(namespace_path, "pre-commit/b-fail.sh")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(settings.is_repo_trusted);
    // The failing category runs to completion, later categories never start.
    assert!(markers.path().join("local-ok").exists());
    assert!(markers.path().join("local-after").exists());
    assert!(!markers.path().join("shared-ran").exists());
}

#[test]
#[serial]
fn test_accept_all_trusts_and_persists() {
    let temp = init_test_repo();
    let repo = temp.path();
    let markers = tempfile::TempDir::new().unwrap();

    write_hook(&repo.join(".githooks/pre-rebase/one.sh"), &touch(&markers.path().join("one")));
    write_hook(&repo.join(".githooks/pre-rebase/two.sh"), &touch(&markers.path().join("two")));

    let (git_ctx, mut settings) = context(repo, "pre-rebase");
    let mut prompt = ScriptedPrompt::new(["a"]);
    let summary = run_pipeline(&git_ctx, &mut settings, &mut prompt, &StaticSharedRepos::new()).unwrap();

    assert_eq!(
        summary,
        RunSummary {
            replaced_executed: false,
            executed: 2
        }
    );
    assert_eq!(prompt.asked.len(), 1);
    assert!(markers.path().join("one").exists());
    assert!(markers.path().join("two").exists());

    let lines = checksum_lines(repo);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("pre-rebase/one.sh"));

    // Trusted now: a non-interactive run executes both without asking.
    fs::remove_file(markers.path().join("one")).unwrap();
    let (git_ctx, mut settings) = context(repo, "pre-rebase");
    let summary = run_pipeline(&git_ctx, &mut settings, &mut NoPrompt, &StaticSharedRepos::new()).unwrap();
    assert_eq!(summary.executed, 2);
    assert!(markers.path().join("one").exists());
}

#[test]
#[serial]
fn test_non_interactive_skips_untrusted() {
    let temp = init_test_repo();
    let repo = temp.path();
    let markers = tempfile::TempDir::new().unwrap();

    write_hook(&repo.join(".githooks/post-rewrite"), &touch(&markers.path().join("ran")));

    let (git_ctx, mut settings) = context(repo, "post-rewrite");
    settings.non_interactive = true;
    let summary = run_pipeline(&git_ctx, &mut settings, &mut NoPrompt, &StaticSharedRepos::new()).unwrap();

    assert_eq!(summary.executed, 0);
    assert!(!markers.path().join("ran").exists());
    assert!(checksum_lines(repo).is_empty());
}

#[test]
#[serial]
fn test_changed_hook_needs_new_trust() {
    let temp = init_test_repo();
    let repo = temp.path();
    let hook = repo.join(".githooks/post-applypatch");
    write_hook(&hook, "exit 0");

    let (git_ctx, mut settings) = context(repo, "post-applypatch");
    let mut prompt = ScriptedPrompt::new(["y"]);
    run_pipeline(&git_ctx, &mut settings, &mut prompt, &StaticSharedRepos::new()).unwrap();
    assert_eq!(prompt.asked.len(), 1);

    // Unchanged content stays trusted.
    let mut prompt = ScriptedPrompt::default();
    let (git_ctx, mut settings) = context(repo, "post-applypatch");
    let summary = run_pipeline(&git_ctx, &mut settings, &mut prompt, &StaticSharedRepos::new()).unwrap();
    assert_eq!(summary.executed, 1);
    assert!(prompt.asked.is_empty());

    // Editing breaks it.
    write_hook(&hook, "exit 0 # changed");
    let mut prompt = ScriptedPrompt::new(["n"]);
    let (git_ctx, mut settings) = context(repo, "post-applypatch");
    let summary = run_pipeline(&git_ctx, &mut settings, &mut prompt, &StaticSharedRepos::new()).unwrap();
    assert_eq!(summary.executed, 0);
    assert_eq!(prompt.asked.len(), 1);
}

#[test]
#[serial]
fn test_disable_answer_adds_user_ignore() {
    let temp = init_test_repo();
    let repo = temp.path();
    let markers = tempfile::TempDir::new().unwrap();
    write_hook(&repo.join(".githooks/pre-commit/noisy.sh"), &touch(&markers.path().join("noisy")));

    let (git_ctx, mut settings) = context(repo, "pre-commit");
    let mut prompt = ScriptedPrompt::new(["d"]);
    run_pipeline(&git_ctx, &mut settings, &mut prompt, &StaticSharedRepos::new()).unwrap();

    let user_ignores = fs::read_to_string(repo.join(".git/.githooks.ignore.yaml")).unwrap();
    assert!(user_ignores.contains("pre-commit/noisy.sh"));
    assert!(!markers.path().join("noisy").exists());

    // Ignored hooks are not asked about again.
    let mut prompt = ScriptedPrompt::default();
    let (git_ctx, mut settings) = context(repo, "pre-commit");
    run_pipeline(&git_ctx, &mut settings, &mut prompt, &StaticSharedRepos::new()).unwrap();
    assert!(prompt.asked.is_empty());
    assert!(!markers.path().join("noisy").exists());
}

#[test]
#[serial]
fn test_disabled_runs_only_replaced_hook() {
    let temp = init_test_repo();
    let repo = temp.path();
    let markers = tempfile::TempDir::new().unwrap();

    fs::create_dir_all(repo.join(".githooks")).unwrap();
    fs::write(repo.join(".githooks/trust-all"), "").unwrap();
    git(repo, &["config", "--local", "githooks.trust.all", "true"]);

    write_hook(
        &repo.join(".git/hooks/pre-commit.replaced.githook"),
        &touch(&markers.path().join("replaced")),
    );
    write_hook(&repo.join(".githooks/pre-commit"), &touch(&markers.path().join("local")));

    let (git_ctx, mut settings) = context(repo, "pre-commit");
    settings.disabled = true;
    let summary = run_pipeline(&git_ctx, &mut settings, &mut NoPrompt, &StaticSharedRepos::new()).unwrap();

    assert!(summary.replaced_executed);
    assert_eq!(summary.executed, 0);
    assert!(markers.path().join("replaced").exists());
    assert!(!markers.path().join("local").exists());
}

#[test]
#[serial]
fn test_staged_files_are_exported() {
    let temp = init_test_repo();
    let repo = temp.path();
    let markers = tempfile::TempDir::new().unwrap();
    let out = markers.path().join("staged");

    fs::create_dir_all(repo.join(".githooks")).unwrap();
    fs::write(repo.join(".githooks/trust-all"), "").unwrap();
    git(repo, &["config", "--local", "githooks.trust.all", "true"]);

    fs::write(repo.join("new.txt"), "new\n").unwrap();
    fs::write(repo.join("README.md"), "# Changed\n").unwrap();
    git(repo, &["add", "new.txt", "README.md"]);

    write_hook(
        &repo.join(".githooks/pre-commit"),
        &format!("printf '%s' \"$STAGED_FILES\" > '{}'", out.display()),
    );

    let (git_ctx, mut settings) = context(repo, "pre-commit");
    run_pipeline(&git_ctx, &mut settings, &mut NoPrompt, &StaticSharedRepos::new()).unwrap();

    let staged = fs::read_to_string(&out).unwrap();
    let mut files: Vec<_> = staged.lines().collect();
    files.sort();
    assert_eq!(files, vec!["README.md", "new.txt"]);
}

#[test]
#[serial]
fn test_lfs_hook_runs_before_replaced_hook() {
    let temp = init_test_repo();
    let repo = temp.path();
    let markers = tempfile::TempDir::new().unwrap();
    let lfs_args = markers.path().join("lfs-args");

    let bin = markers.path().join("bin");
    write_hook(&bin.join("git-lfs"), &format!("printf '%s ' \"$@\" > '{}'", lfs_args.display()));
    let _path = prepend_path(&bin);

    fs::create_dir_all(repo.join(".githooks")).unwrap();
    fs::write(repo.join(".githooks/trust-all"), "").unwrap();
    git(repo, &["config", "--local", "githooks.trust.all", "true"]);
    write_hook(
        &repo.join(".git/hooks/post-checkout.replaced.githook"),
        &format!(
            "test -f '{}' && touch '{}'",
            lfs_args.display(),
            markers.path().join("replaced").display()
        ),
    );

    let (git_ctx, mut settings) = context(repo, "post-checkout");
    settings.invocation.args = vec!["a".to_string(), "b".to_string(), "1".to_string()];
    let summary = run_pipeline(&git_ctx, &mut settings, &mut NoPrompt, &StaticSharedRepos::new()).unwrap();

    assert!(summary.replaced_executed);
    assert!(markers.path().join("replaced").exists());
    assert_eq!(fs::read_to_string(&lfs_args).unwrap().trim_end(), "post-checkout a b 1");
}

#[test]
#[serial]
fn test_failing_lfs_hook_aborts_run() {
    let temp = init_test_repo();
    let repo = temp.path();
    let markers = tempfile::TempDir::new().unwrap();

    let bin = markers.path().join("bin");
    write_hook(&bin.join("git-lfs"), "exit 3");
    let _path = prepend_path(&bin);

    fs::create_dir_all(repo.join(".githooks")).unwrap();
    fs::write(repo.join(".githooks/trust-all"), "").unwrap();
    git(repo, &["config", "--local", "githooks.trust.all", "true"]);
    write_hook(&repo.join(".githooks/pre-push"), &touch(&markers.path().join("local")));

    let (git_ctx, mut settings) = context(repo, "pre-push");
    let err = run_pipeline(&git_ctx, &mut settings, &mut NoPrompt, &StaticSharedRepos::new()).unwrap_err();

    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::LfsHookFailed { hook_name, .. }) => assert_eq!(hook_name, "pre-push"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!markers.path().join("local").exists());
}

#[test]
#[serial]
fn test_missing_lfs_fails_only_when_required() {
    let temp = init_test_repo();
    let repo = temp.path();
    fs::create_dir_all(repo.join(".githooks")).unwrap();

    let (_, settings) = context(repo, "post-merge");
    execute_lfs_hooks(&settings, false).unwrap();

    fs::write(repo.join(".githooks/.lfs-required"), "").unwrap();
    match execute_lfs_hooks(&settings, false) {
        Err(PipelineError::LfsRequired { file }) => assert!(file.ends_with(".githooks/.lfs-required")),
        other => panic!("unexpected result: {other:?}"),
    }

    // Hooks Git LFS does not handle never need it.
    let (_, settings) = context(repo, "pre-commit");
    execute_lfs_hooks(&settings, false).unwrap();
}
