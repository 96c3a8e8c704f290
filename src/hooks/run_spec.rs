//! How a hook file gets launched
//!
//! Executable files run directly. Anything else needs an interpreter: the
//! tokens of a `<hook>.runner` companion file if there is one, otherwise `sh`.

use regex::{Captures, Regex};
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Suffix of runner companion files.
pub const RUNNER_SUFFIX: &str = ".runner";

/// Interpreter used for non-executable hooks without a runner file.
pub const DEFAULT_RUNNER: &str = "sh";

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$?)\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("Invalid regex pattern")
});

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Could not read runner file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse runner file '{}'", path.display())]
    Parse { path: PathBuf },

    #[error("Runner file '{}' is empty", path.display())]
    Empty { path: PathBuf },
}

/// Launch mode of a hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSpec {
    /// Execute the hook file itself.
    Direct,
    /// Run `tokens... <hookPath>`.
    Runner(Vec<String>),
}

impl RunSpec {
    /// Program and leading arguments for launching `hook_path`.
    pub fn command_for(&self, hook_path: &Path) -> (String, Vec<String>) {
        let path = hook_path.to_string_lossy().to_string();
        match self {
            RunSpec::Direct => (path, Vec::new()),
            RunSpec::Runner(tokens) => {
                let mut args = tokens[1..].to_vec();
                args.push(path);
                (tokens[0].clone(), args)
            }
        }
    }
}

/// Whether any execute bit is set on `path`.
pub fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Work out how `hook_path` is launched.
pub fn detect_run_spec(hook_path: &Path) -> Result<RunSpec, RunnerError> {
    if is_executable(hook_path) {
        return Ok(RunSpec::Direct);
    }

    let mut runner_file = hook_path.as_os_str().to_owned();
    runner_file.push(RUNNER_SUFFIX);
    let runner_file = PathBuf::from(runner_file);

    if !runner_file.is_file() {
        return Ok(RunSpec::Runner(vec![DEFAULT_RUNNER.to_string()]));
    }

    let content = fs::read_to_string(&runner_file).map_err(|source| RunnerError::Read {
        path: runner_file.clone(),
        source,
    })?;

    let tokens = shlex::split(&expand_env_vars(&content)).ok_or_else(|| RunnerError::Parse {
        path: runner_file.clone(),
    })?;

    if tokens.is_empty() {
        return Err(RunnerError::Empty { path: runner_file });
    }

    Ok(RunSpec::Runner(tokens))
}

/// Expand `$VAR` and `${VAR}` from the environment.
///
/// Unset variables expand to nothing; `$$VAR` and `$${VAR}` are escapes for
/// the literal text without the leading `$`.
pub fn expand_env_vars(s: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(s, |caps: &Captures| {
            let whole = &caps[0];
            if !caps[1].is_empty() {
                return whole[1..].to_string();
            }
            let name = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            env::var(name).unwrap_or_default()
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str, mode: u32) {
        fs::write(path, content).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn test_executable_runs_directly() {
        let temp = TempDir::new().unwrap();
        let hook = temp.path().join("lint.sh");
        write(&hook, "#!/bin/sh\nexit 0\n", 0o755);

        assert_eq!(detect_run_spec(&hook).unwrap(), RunSpec::Direct);
    }

    #[test]
    fn test_non_executable_defaults_to_sh() {
        let temp = TempDir::new().unwrap();
        let hook = temp.path().join("lint.sh");
        write(&hook, "exit 0\n", 0o644);

        let spec = detect_run_spec(&hook).unwrap();
        assert_eq!(spec, RunSpec::Runner(vec!["sh".to_string()]));
        let (program, args) = spec.command_for(&hook);
        assert_eq!(program, "sh");
        assert_eq!(args, vec![hook.to_string_lossy().to_string()]);
    }

    #[test]
    #[serial]
    fn test_runner_file_is_split_and_expanded() {
        let temp = TempDir::new().unwrap();
        let hook = temp.path().join("check.py");
        write(&hook, "print('hi')\n", 0o644);
        write(
            &temp.path().join("check.py.runner"),
            "${GITHOOKS_TEST_PY} -X 'utf8 mode' $$HOME\n",
            0o644,
        );

        env::set_var("GITHOOKS_TEST_PY", "python3");
        let spec = detect_run_spec(&hook).unwrap();
        env::remove_var("GITHOOKS_TEST_PY");

        assert_eq!(
            spec,
            RunSpec::Runner(vec![
                "python3".to_string(),
                "-X".to_string(),
                "utf8 mode".to_string(),
                "$HOME".to_string(),
            ])
        );
    }

    #[test]
    fn test_unparsable_runner_file() {
        let temp = TempDir::new().unwrap();
        let hook = temp.path().join("check");
        write(&hook, "", 0o644);
        write(&temp.path().join("check.runner"), "python 'unclosed", 0o644);

        assert!(matches!(
            detect_run_spec(&hook),
            Err(RunnerError::Parse { .. })
        ));
    }

    #[test]
    fn test_empty_runner_file() {
        let temp = TempDir::new().unwrap();
        let hook = temp.path().join("check");
        write(&hook, "", 0o644);
        write(&temp.path().join("check.runner"), "  \n", 0o644);

        assert!(matches!(
            detect_run_spec(&hook),
            Err(RunnerError::Empty { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_expand_env_vars() {
        env::set_var("GITHOOKS_TEST_A", "alpha");
        env::remove_var("GITHOOKS_TEST_UNSET");

        assert_eq!(expand_env_vars("$GITHOOKS_TEST_A/x"), "alpha/x");
        assert_eq!(expand_env_vars("${GITHOOKS_TEST_A}x"), "alphax");
        assert_eq!(expand_env_vars("[$GITHOOKS_TEST_UNSET]"), "[]");
        assert_eq!(expand_env_vars("$$GITHOOKS_TEST_A"), "$GITHOOKS_TEST_A");
        assert_eq!(expand_env_vars("$${GITHOOKS_TEST_A}"), "${GITHOOKS_TEST_A}");
        assert_eq!(expand_env_vars("cost: $5"), "cost: $5");

        env::remove_var("GITHOOKS_TEST_A");
    }
}
