//! Locked file access for the checksum list file
//!
//! Uses `fs2` advisory locks so that concurrent hook runs (two `git commit`s
//! in different worktrees of the same repository, for instance) do not
//! interleave their updates of files in the common Git directory.
//!
//! Advisory locks are cooperative - all writers must go through these functions.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Read a whole file while holding a shared lock, so a concurrent rewrite by
/// [`locked_retain_lines`] is never seen half done.
pub fn locked_read(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    file.lock_shared()
        .with_context(|| format!("Failed to acquire shared lock: {}", path.display()))?;
    let mut content = String::new();
    BufReader::new(&file)
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(content)
}

/// Append to a file under an exclusive lock, creating it if missing.
pub fn locked_append(path: &Path, content: &str) -> Result<()> {
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open file for appending: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;
    let mut writer = BufWriter::new(&file);
    writer
        .write_all(content.as_bytes())
        .with_context(|| format!("Failed to append to file: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush file: {}", path.display()))?;
    Ok(())
}

/// Rewrite a file keeping only the lines for which `keep` returns true.
///
/// Read and write happen under one exclusive lock. A missing file is left alone.
pub fn locked_retain_lines<F>(path: &Path, mut keep: F) -> Result<usize>
where
    F: FnMut(&str) -> bool,
{
    if !path.exists() {
        return Ok(0);
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;

    let mut content = String::new();
    BufReader::new(&file)
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let mut removed = 0;
    let mut kept = String::with_capacity(content.len());
    for line in content.lines() {
        if keep(line) {
            kept.push_str(line);
            kept.push('\n');
        } else {
            removed += 1;
        }
    }

    file.set_len(0)
        .with_context(|| format!("Failed to truncate file: {}", path.display()))?;
    let mut writer = BufWriter::new(&file);
    // The read moved the cursor to the end; rewind before rewriting.
    std::io::Seek::rewind(&mut writer)
        .with_context(|| format!("Failed to rewind file: {}", path.display()))?;
    writer
        .write_all(kept.as_bytes())
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush file: {}", path.display()))?;
    Ok(removed)
}
