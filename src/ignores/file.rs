//! YAML ignore files
//!
//! ```yaml
//! version: 1
//! patterns:
//!   - "pre-commit/**"
//!   - "!pre-commit/keep.sh"
//! namespace-paths:
//!   - "ns/pre-push/slow.sh"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{IgnoreError, IgnorePatternSet};

/// Ignore file inside a hooks root or hook directory.
pub const IGNORE_FILE_NAME: &str = ".ignore.yaml";

/// User tier ignore file inside the Git directory.
pub const USER_IGNORE_FILE_NAME: &str = ".githooks.ignore.yaml";

pub const IGNORE_FILE_VERSION: u32 = 1;

/// On-disk form of an [`IgnorePatternSet`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IgnoreFile {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default, rename = "namespace-paths")]
    pub namespace_paths: Vec<String>,
}

impl From<&IgnorePatternSet> for IgnoreFile {
    fn from(set: &IgnorePatternSet) -> Self {
        Self {
            version: IGNORE_FILE_VERSION,
            patterns: set.patterns().map(String::from).collect(),
            namespace_paths: set.namespace_paths().map(String::from).collect(),
        }
    }
}

/// Load an ignore file. A missing file is an empty set; malformed patterns
/// are dropped with a warning.
pub fn load_ignore_file(path: &Path) -> Result<IgnorePatternSet, IgnoreError> {
    if !path.exists() {
        return Ok(IgnorePatternSet::new());
    }

    let content = fs::read_to_string(path).map_err(|source| IgnoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut set = IgnorePatternSet::new();
    if content.trim().is_empty() {
        return Ok(set);
    }

    let file: IgnoreFile = serde_yaml::from_str(&content).map_err(|source| IgnoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let dropped = set.add_patterns_lossy(file.patterns.iter().map(String::as_str));
    if !dropped.is_empty() {
        warn!(
            "Dropped {} malformed pattern(s) from '{}'",
            dropped.len(),
            path.display()
        );
    }
    for namespace_path in file.namespace_paths {
        set.add_namespace_path(namespace_path);
    }

    debug!(
        "Loaded ignore file '{}' [patterns: {}]",
        path.display(),
        set.patterns().count()
    );
    Ok(set)
}

/// Write an ignore file atomically.
pub fn store_ignore_file(set: &IgnorePatternSet, path: &Path) -> Result<(), IgnoreError> {
    let write_err = |source: std::io::Error| IgnoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let yaml = serde_yaml::to_string(&IgnoreFile::from(set))
        .map_err(|e| write_err(std::io::Error::other(e)))?;

    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(yaml.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Best-effort load: errors are logged and yield an empty set.
fn load_or_warn(path: &Path) -> IgnorePatternSet {
    load_ignore_file(path).unwrap_or_else(|e| {
        warn!("{e}");
        IgnorePatternSet::new()
    })
}

/// Directory tier of a hooks root: `<root>/.ignore.yaml` followed by
/// `<root>/<hookName>/.ignore.yaml` for every given hook name.
pub fn load_directory_tier(hooks_root: &Path, hook_names: &[&str]) -> IgnorePatternSet {
    let mut set = load_or_warn(&hooks_root.join(IGNORE_FILE_NAME));
    for hook_name in hook_names {
        set.extend(&load_or_warn(
            &hooks_root.join(hook_name).join(IGNORE_FILE_NAME),
        ));
    }
    set
}

pub fn user_ignore_file(git_dir: &Path) -> PathBuf {
    git_dir.join(USER_IGNORE_FILE_NAME)
}

/// User tier stored in the Git directory.
pub fn load_user_tier(git_dir: &Path) -> IgnorePatternSet {
    load_or_warn(&user_ignore_file(git_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(USER_IGNORE_FILE_NAME);

        let mut set = IgnorePatternSet::new();
        set.add_pattern("pre-commit/**").unwrap();
        set.add_pattern("!pre-commit/keep.sh").unwrap();
        set.add_namespace_path("ns/pre-push/slow.sh");

        store_ignore_file(&set, &path).unwrap();
        let loaded = load_ignore_file(&path).unwrap();

        assert_eq!(loaded, set);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("version: 1"));
        assert!(content.contains("namespace-paths:"));
    }

    #[test]
    fn test_load_missing_and_empty() {
        let temp = TempDir::new().unwrap();
        assert!(load_ignore_file(&temp.path().join("missing.yaml"))
            .unwrap()
            .is_empty());

        let empty = temp.path().join("empty.yaml");
        fs::write(&empty, "\n").unwrap();
        assert!(load_ignore_file(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_load_drops_malformed_patterns() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(IGNORE_FILE_NAME);
        fs::write(&path, "patterns:\n  - 'a/**'\n  - 'lint**.sh'\n").unwrap();

        let set = load_ignore_file(&path).unwrap();
        assert_eq!(set.patterns().collect::<Vec<_>>(), vec!["a/**"]);
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(IGNORE_FILE_NAME);
        fs::write(&path, "patterns: [unclosed\n").unwrap();

        assert!(matches!(
            load_ignore_file(&path),
            Err(IgnoreError::Parse { .. })
        ));
    }

    #[test]
    fn test_directory_tier_merges_hook_dir_file() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("pre-commit")).unwrap();
        fs::write(root.join(IGNORE_FILE_NAME), "patterns: ['pre-push/**']\n").unwrap();
        fs::write(
            root.join("pre-commit").join(IGNORE_FILE_NAME),
            "namespace-paths: ['pre-commit/slow.sh']\n",
        )
        .unwrap();

        let set = load_directory_tier(root, &["pre-commit"]);
        assert!(set.matches("pre-push/x"));
        assert!(set.matches("pre-commit/slow.sh"));
        assert!(!set.matches("pre-commit/fast.sh"));
    }
}
