//! Checksum trust store
//!
//! A hook is trusted when the Git blob hash of its content is known. Hashes
//! come from directory sources (a file named after the hash marks it trusted)
//! and list files (`<sha1> <absPath>` per line). The list file in the Git
//! directory doubles as the store new trust decisions are written to.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::fs::{locked_append, locked_read, locked_retain_lines};
use crate::git::hash_file;

/// Checksum list file inside the Git directory.
pub const CHECKSUM_FILE_NAME: &str = ".githooks.checksum";

/// Default checksum directory inside the Git directory.
pub const CHECKSUM_DIR_NAME: &str = ".githooks.checksums";

const SHA1_HEX_LEN: usize = 40;

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("Could not read checksum file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "Could not parse checksum file '{}:{line}': '{content}'\n\
         format: 'sha1<space>absPath'",
        path.display()
    )]
    Malformed {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("No checksum list file to store trusted hooks in")]
    NoBackingFile,

    #[error("Could not update checksum file '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// A hash with the path it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumEntry {
    pub hash: String,
    pub path: PathBuf,
    pub namespace_path: String,
}

/// In-memory view over all checksum sources of a repository.
#[derive(Debug, Default)]
pub struct ChecksumTrustStore {
    checksum_dirs: Vec<PathBuf>,
    checksum_files: Vec<PathBuf>,
    checksums: BTreeMap<String, BTreeSet<PathBuf>>,
    backing_file: Option<PathBuf>,
}

pub(crate) fn is_sha1_hex(s: &str) -> bool {
    s.len() == SHA1_HEX_LEN && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Parse a checksum list file's content into `(hash, path)` pairs.
fn parse_checksum_list(path: &Path, content: &str) -> Result<Vec<(String, PathBuf)>, TrustError> {
    let mut entries = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = line
            .split_once(' ')
            .map(|(hash, file)| (hash, Path::new(file.trim())))
            .filter(|(hash, file)| is_sha1_hex(hash) && file.is_absolute());

        match parsed {
            Some((hash, file)) => entries.push((hash.to_lowercase(), file.to_path_buf())),
            None => {
                return Err(TrustError::Malformed {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    content: line.to_string(),
                })
            }
        }
    }
    Ok(entries)
}

impl ChecksumTrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store for a repository: `checksum_cache_dir` (or
    /// `<gitDir>/.githooks.checksums`) as directory source and
    /// `<gitDir>/.githooks.checksum` as list file and backing file.
    ///
    /// A list file that fails to load is reported and skipped.
    pub fn open_default(git_dir: &Path, checksum_cache_dir: Option<&Path>) -> Self {
        let mut store = Self::new();

        let dir = checksum_cache_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| git_dir.join(CHECKSUM_DIR_NAME));
        store.add_directory(dir);

        let file = git_dir.join(CHECKSUM_FILE_NAME);
        if let Err(e) = store.add_list_file(&file) {
            warn!("{e}");
        }
        store.backing_file = Some(file);

        debug!("{store}");
        store
    }

    /// Add a directory source. Missing directories are kept: they may be
    /// created later.
    pub fn add_directory(&mut self, dir: impl Into<PathBuf>) {
        self.checksum_dirs.push(dir.into());
    }

    /// Parse a list file into the in-memory map. Missing files are skipped;
    /// on a malformed line nothing from the file is added.
    pub fn add_list_file(&mut self, path: &Path) -> Result<(), TrustError> {
        if !path.is_file() {
            return Ok(());
        }

        let content = locked_read(path).map_err(|source| TrustError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        for (hash, file) in parse_checksum_list(path, &content)? {
            self.add_checksum(&hash, &file);
        }
        self.checksum_files.push(path.to_path_buf());
        Ok(())
    }

    /// Record `hash` for `path` in memory.
    ///
    /// Returns `true` when the hash was already known and the path merged into
    /// its entry.
    pub fn add_checksum(&mut self, hash: &str, path: &Path) -> bool {
        match self.checksums.get_mut(hash) {
            Some(paths) => {
                paths.insert(path.to_path_buf());
                true
            }
            None => {
                self.checksums
                    .insert(hash.to_string(), BTreeSet::from([path.to_path_buf()]));
                false
            }
        }
    }

    /// Whether a hash is trusted by any source.
    pub fn is_hash_trusted(&self, hash: &str) -> bool {
        self.checksum_dirs.iter().any(|dir| dir.join(hash).is_file())
            || self.checksums.contains_key(hash)
    }

    /// Hash `file_path` and check it.
    ///
    /// Returns `(trusted, hash)`. Failing to hash the file is an error, never
    /// an untrusted result.
    pub fn is_trusted(&self, file_path: &Path) -> io::Result<(bool, String)> {
        let hash = hash_file(file_path)?;
        Ok((self.is_hash_trusted(&hash), hash))
    }

    /// Append entries to the backing file and register them in memory.
    pub fn sync_checksum_add(&mut self, entries: &[ChecksumEntry]) -> Result<(), TrustError> {
        if entries.is_empty() {
            return Ok(());
        }
        let file = self.backing_file.clone().ok_or(TrustError::NoBackingFile)?;

        let lines: String = entries
            .iter()
            .map(|e| format!("{} {}\n", e.hash, e.path.display()))
            .collect();

        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|e| TrustError::Write {
                path: file.clone(),
                source: e.into(),
            })?;
        }
        locked_append(&file, &lines).map_err(|source| TrustError::Write {
            path: file.clone(),
            source,
        })?;

        for entry in entries {
            self.add_checksum(&entry.hash, &entry.path);
        }
        debug!("Stored {} checksum(s) in '{}'", entries.len(), file.display());
        Ok(())
    }

    /// Remove every trace of `hash`: its lines in the backing file, its
    /// directory markers and the in-memory entry.
    ///
    /// Returns whether anything was removed.
    pub fn sync_checksum_remove(&mut self, hash: &str) -> Result<bool, TrustError> {
        let mut removed = self.checksums.remove(hash).is_some();

        if let Some(file) = self.backing_file.clone() {
            let prefix = format!("{hash} ");
            let count = locked_retain_lines(&file, |line| !line.trim().starts_with(&prefix))
                .map_err(|source| TrustError::Write {
                    path: file.clone(),
                    source,
                })?;
            removed |= count > 0;
        }

        for dir in &self.checksum_dirs {
            let marker = dir.join(hash);
            if marker.is_file() {
                fs::remove_file(&marker).map_err(|e| TrustError::Write {
                    path: marker.clone(),
                    source: e.into(),
                })?;
                removed = true;
            }
        }

        Ok(removed)
    }

    /// Known paths for `hash`.
    pub fn paths_for(&self, hash: &str) -> impl Iterator<Item = &Path> {
        self.checksums
            .get(hash)
            .into_iter()
            .flatten()
            .map(PathBuf::as_path)
    }

    pub fn summary(&self) -> ChecksumSummary {
        ChecksumSummary {
            checksums: self.checksums.len(),
            files: self.checksum_files.len(),
            directories: self.checksum_dirs.len(),
        }
    }
}

impl fmt::Display for ChecksumTrustStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.summary().fmt(f)
    }
}

/// Counts reported by [`ChecksumTrustStore::summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumSummary {
    pub checksums: usize,
    pub files: usize,
    pub directories: usize,
}

impl fmt::Display for ChecksumSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Checksum store contains '{}' parsed checksums from '{}' files\n\
             and '{}' directory search paths.",
            self.checksums, self.files, self.directories
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO_HASH: &str = "ce013625030ba8dba906f756967f9e9ca394464a";

    #[test]
    fn test_trust_binds_to_content() {
        let temp = TempDir::new().unwrap();
        let hook = temp.path().join("lint.sh");
        fs::write(&hook, "hello\n").unwrap();

        let mut store = ChecksumTrustStore::new();
        let (trusted, hash) = store.is_trusted(&hook).unwrap();
        assert!(!trusted);
        assert_eq!(hash, HELLO_HASH);

        store.add_checksum(&hash, &hook);

        // Renaming keeps trust.
        let renamed = temp.path().join("renamed.sh");
        fs::rename(&hook, &renamed).unwrap();
        assert!(store.is_trusted(&renamed).unwrap().0);

        // Editing breaks it.
        fs::write(&renamed, "hello!\n").unwrap();
        assert!(!store.is_trusted(&renamed).unwrap().0);
    }

    #[test]
    fn test_is_trusted_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let store = ChecksumTrustStore::new();
        assert!(store.is_trusted(&temp.path().join("gone")).is_err());
    }

    #[test]
    fn test_add_checksum_reports_merge() {
        let mut store = ChecksumTrustStore::new();
        assert!(!store.add_checksum(HELLO_HASH, Path::new("/a")));
        assert!(store.add_checksum(HELLO_HASH, Path::new("/b")));
        assert_eq!(store.paths_for(HELLO_HASH).count(), 2);
        assert_eq!(store.summary().checksums, 1);
    }

    #[test]
    fn test_directory_source_marker() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("checksums");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(HELLO_HASH), "").unwrap();

        let mut store = ChecksumTrustStore::new();
        store.add_directory(&dir);
        assert!(store.is_hash_trusted(HELLO_HASH));
        assert!(!store.is_hash_trusted("e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"));
    }

    #[test]
    fn test_list_file_parsing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join(CHECKSUM_FILE_NAME);
        fs::write(&file, format!("{HELLO_HASH} /repo/.githooks/pre-commit\n\n")).unwrap();

        let mut store = ChecksumTrustStore::new();
        store.add_list_file(&file).unwrap();
        assert!(store.is_hash_trusted(HELLO_HASH));
        assert_eq!(store.summary().files, 1);
    }

    #[test]
    fn test_malformed_list_file_is_skipped_whole() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join(CHECKSUM_FILE_NAME);
        fs::write(
            &file,
            format!("{HELLO_HASH} /repo/a\nnot-a-hash relative/path\n"),
        )
        .unwrap();

        let mut store = ChecksumTrustStore::new();
        let err = store.add_list_file(&file).unwrap_err();
        assert!(matches!(err, TrustError::Malformed { line: 2, .. }));
        assert!(!store.is_hash_trusted(HELLO_HASH));
        assert_eq!(store.summary().files, 0);
    }

    #[test]
    fn test_sync_add_then_remove() {
        let temp = TempDir::new().unwrap();
        let git_dir = temp.path();

        let mut store = ChecksumTrustStore::open_default(git_dir, None);
        store
            .sync_checksum_add(&[ChecksumEntry {
                hash: HELLO_HASH.to_string(),
                path: PathBuf::from("/repo/.githooks/pre-commit"),
                namespace_path: "pre-commit".to_string(),
            }])
            .unwrap();

        let reopened = ChecksumTrustStore::open_default(git_dir, None);
        assert!(reopened.is_hash_trusted(HELLO_HASH));

        assert!(store.sync_checksum_remove(HELLO_HASH).unwrap());
        assert!(!store.is_hash_trusted(HELLO_HASH));
        let reopened = ChecksumTrustStore::open_default(git_dir, None);
        assert!(!reopened.is_hash_trusted(HELLO_HASH));
        assert!(!store.sync_checksum_remove(HELLO_HASH).unwrap());
    }

    #[test]
    fn test_summary_format() {
        let temp = TempDir::new().unwrap();
        let store = ChecksumTrustStore::open_default(temp.path(), None);
        assert_eq!(
            store.to_string(),
            "Checksum store contains '0' parsed checksums from '0' files\n\
             and '1' directory search paths."
        );
    }
}
