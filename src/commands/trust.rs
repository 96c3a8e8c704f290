//! `githooks trust`: inspect and edit the checksum store

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::config::KEY_CHECKSUM_CACHE_DIR;
use crate::git::{ConfigScope, GitContext};
use crate::trust::store::is_sha1_hex;
use crate::trust::ChecksumTrustStore;

fn open_store(git: &GitContext) -> Result<ChecksumTrustStore> {
    let git_dir = git.common_git_dir().context("Could not get git directory")?;
    let cache_dir = git
        .get_config(KEY_CHECKSUM_CACHE_DIR, ConfigScope::Traverse)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from);
    Ok(ChecksumTrustStore::open_default(&git_dir, cache_dir.as_deref()))
}

/// Print how many checksums are known and where they come from.
pub fn summary() -> Result<()> {
    let (_, git) = super::current_repository()?;
    let store = open_store(&git)?;
    println!("{}", store.summary());
    Ok(())
}

/// Report whether the current content of `file` is trusted.
pub fn check(file: &Path) -> Result<()> {
    let (cwd, git) = super::current_repository()?;
    let store = open_store(&git)?;

    let path = cwd.join(file);
    let (trusted, hash) = store
        .is_trusted(&path)
        .with_context(|| format!("Could not get hash for '{}'", path.display()))?;

    if trusted {
        println!("{} '{}' is trusted [{hash}]", "✓".green().bold(), path.display());
    } else {
        println!("{} '{}' is not trusted [{hash}]", "✗".red().bold(), path.display());
    }
    Ok(())
}

/// Forget the checksum `hash` everywhere it is stored.
pub fn remove(hash: &str) -> Result<()> {
    let hash = normalize_hash(hash)?;

    let (_, git) = super::current_repository()?;
    let mut store = open_store(&git)?;

    match remove_checksum(&mut store, &hash)? {
        Some(paths) => {
            println!("{} Removed checksum '{hash}'", "✓".green().bold());
            for path in paths {
                println!("  was trusted for '{path}'");
            }
        }
        None => println!("Checksum '{hash}' is not in the store."),
    }
    Ok(())
}

/// Lowercase SHA1 hex of a user supplied checksum.
fn normalize_hash(hash: &str) -> Result<String> {
    let hash = hash.trim().to_ascii_lowercase();
    if !is_sha1_hex(&hash) {
        bail!("'{hash}' is not a SHA1 checksum");
    }
    Ok(hash)
}

/// Remove a lowercase `hash`, returning the paths it was trusted for, or
/// `None` if the store did not know it.
fn remove_checksum(store: &mut ChecksumTrustStore, hash: &str) -> Result<Option<Vec<String>>> {
    let paths: Vec<String> = store
        .paths_for(hash)
        .map(|p| p.display().to_string())
        .collect();

    Ok(store.sync_checksum_remove(hash)?.then_some(paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::ChecksumEntry;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_hash() {
        assert_eq!(
            normalize_hash("E69DE29BB2D1D6434B8B29AE775AD8C2E48C5391").unwrap(),
            "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"
        );
        assert!(normalize_hash("e69de29").is_err());
        assert!(normalize_hash("zzzde29bb2d1d6434b8b29ae775ad8c2e48c5391").is_err());
    }

    #[test]
    fn test_remove_checksum_from_list_file() {
        let temp = TempDir::new().unwrap();
        let hash = "ce013625030ba8dba906f756967f9e9ca394464a";

        let mut store = ChecksumTrustStore::open_default(temp.path(), None);
        store
            .sync_checksum_add(&[ChecksumEntry {
                hash: hash.to_string(),
                path: PathBuf::from("/repo/.githooks/pre-commit"),
                namespace_path: "pre-commit".to_string(),
            }])
            .unwrap();

        let typed = normalize_hash("CE013625030BA8DBA906F756967F9E9CA394464A").unwrap();
        let mut store = ChecksumTrustStore::open_default(temp.path(), None);
        let paths = remove_checksum(&mut store, &typed).unwrap();
        assert_eq!(paths, Some(vec!["/repo/.githooks/pre-commit".to_string()]));

        let mut store = ChecksumTrustStore::open_default(temp.path(), None);
        assert!(!store.is_hash_trusted(hash));
        assert_eq!(remove_checksum(&mut store, hash).unwrap(), None);
    }
}
