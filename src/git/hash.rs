//! Content hashing compatible with `git hash-object`

use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// SHA1 of a file as a Git blob (`"blob <len>\0"` followed by the content).
///
/// The file is streamed, so large hooks are not read into memory at once.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();

    let mut hasher = Sha1::new();
    hasher.update(format!("blob {len}\0").as_bytes());

    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Plain SHA1 hex digest of the concatenated strings.
pub fn hash_strings(parts: &[&str]) -> String {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_file_matches_git_blob_hash() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hook");

        fs::write(&path, "").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"
        );

        fs::write(&path, "hello\n").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    #[test]
    fn test_hash_file_missing() {
        let temp = TempDir::new().unwrap();
        assert!(hash_file(&temp.path().join("nope")).is_err());
    }

    #[test]
    fn test_hash_strings() {
        // sha1("abc")
        assert_eq!(
            hash_strings(&["a", "bc"]),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }
}
