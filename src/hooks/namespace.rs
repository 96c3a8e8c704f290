//! Hook namespaces
//!
//! Every hook gets a namespace path `<namespace>/<relPath>` which ignore
//! patterns and the listing refer to. Repository hooks have an empty
//! namespace, replaced hooks live in `hooks`, and shared repositories either
//! declare one in a `.namespace` file or get one derived from their URL.

use std::fs;
use std::io;
use std::path::{Component, Path};

use crate::git::hash_strings;

/// Namespace marker file inside a hooks root.
pub const NAMESPACE_FILE: &str = ".namespace";

/// Namespace of the replaced hook slot.
pub const NAMESPACE_REPLACED_HOOK: &str = "hooks";

/// Where a hooks root comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HooksSource {
    Repository,
    Shared { original_url: String },
    Replaced,
}

/// Resolve the namespace of `hooks_root`.
///
/// A readable `.namespace` file wins; failing to read an existing one is an
/// error for that root.
pub fn resolve_namespace(hooks_root: &Path, source: &HooksSource) -> io::Result<String> {
    let file = hooks_root.join(NAMESPACE_FILE);
    if file.is_file() {
        let content = fs::read_to_string(&file)?;
        if let Some(line) = content.lines().map(str::trim).find(|l| !l.is_empty()) {
            return Ok(line.to_string());
        }
    }

    Ok(match source {
        HooksSource::Shared { original_url } => default_shared_namespace(original_url),
        HooksSource::Replaced => NAMESPACE_REPLACED_HOOK.to_string(),
        HooksSource::Repository => String::new(),
    })
}

/// First 10 hex characters of the SHA1 of the shared repository URL.
pub fn default_shared_namespace(original_url: &str) -> String {
    let mut hash = hash_strings(&[original_url]);
    hash.truncate(10);
    hash
}

/// Build `<namespace>/<path relative to base>` with forward slashes.
///
/// Returns `None` if `path` is not below `base`.
pub fn make_namespace_path(base: &Path, path: &Path, namespace: &str) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let rel = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    Some(if namespace.is_empty() {
        rel
    } else if rel.is_empty() {
        namespace.to_string()
    } else {
        format!("{namespace}/{rel}")
    })
}
