//! Path canonicalization for admission checks.
//!
//! Every path-based check works on the resolved location of a target, never on
//! the string the agent supplied, so a symlink cannot smuggle an edit past the
//! classifier or the integrity guard. Resolution never fails: paths for files
//! that do not exist yet are resolved through their nearest existing ancestor,
//! and when nothing resolves the raw string is used as-is.

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Absolute, symlink-resolved form of a request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPath {
    path: PathBuf,
    resolved: bool,
}

impl CanonicalPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// False when resolution failed and the raw request string was kept.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn is_empty(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Resolve `raw` against `base` (used for relative paths).
pub fn canonicalize(raw: &str, base: &Path) -> CanonicalPath {
    let fallback = CanonicalPath {
        path: PathBuf::from(raw),
        resolved: false,
    };
    if raw.trim().is_empty() {
        return fallback;
    }

    let candidate = Path::new(raw);
    let absolute = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    };

    if let Ok(path) = fs::canonicalize(&absolute) {
        return CanonicalPath {
            path,
            resolved: true,
        };
    }

    match resolve_through_ancestor(&absolute) {
        Some(path) => CanonicalPath {
            path,
            resolved: true,
        },
        None => {
            tracing::debug!(raw, "path resolution failed, keeping raw value");
            fallback
        }
    }
}

/// Canonicalize a directory the gate itself was configured with.
pub fn canonicalize_dir(dir: &Path) -> PathBuf {
    fs::canonicalize(dir)
        .ok()
        .or_else(|| resolve_through_ancestor(dir))
        .unwrap_or_else(|| dir.to_path_buf())
}

fn resolve_through_ancestor(absolute: &Path) -> Option<PathBuf> {
    for ancestor in absolute.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        let Ok(resolved_base) = fs::canonicalize(ancestor) else {
            continue;
        };
        let rest = absolute.strip_prefix(ancestor).ok()?;
        return Some(normalize_lexically(&resolved_base.join(rest)));
    }
    None
}

/// Fold `.` and `..` segments without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Case-insensitive `Path::starts_with`.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    let mut inner = path.components();
    for expected in dir.components() {
        match inner.next() {
            Some(actual) if component_eq(actual.as_os_str(), expected.as_os_str()) => {}
            _ => return false,
        }
    }
    true
}

pub(crate) fn component_eq(a: &OsStr, b: &OsStr) -> bool {
    a.to_string_lossy()
        .eq_ignore_ascii_case(&b.to_string_lossy())
}
