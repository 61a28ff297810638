//! Resource classification.
//!
//! Buckets a canonical target into [`ResourceClass`] with an ordered
//! whitelist, first match wins:
//!
//! 1. inside `<project>/.claude` or `$HOME/.claude`, or named `CLAUDE.md` → `SystemConfig`
//! 2. documentation/data extension → `NonCode`
//! 3. code extension → `Code`
//! 4. anything else, including no path at all → `NonCode`
//!
//! All comparisons ignore ASCII case.

use crate::core::config::ProjectLayout;
use crate::core::paths::{self, CanonicalPath};
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

pub const INSTRUCTION_FILE: &str = "CLAUDE.md";

const NON_CODE_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "rst", "adoc", "json", "jsonc", "yaml", "yml", "toml", "ini", "cfg",
    "conf", "csv", "tsv", "xml", "lock", "log", "env", "svg", "png", "jpg", "jpeg", "gif", "ico",
    "pdf",
];

const CODE_EXTENSIONS: &[&str] = &[
    "py", "pyi", "js", "jsx", "mjs", "cjs", "ts", "tsx", "rs", "go", "java", "kt", "kts", "scala",
    "c", "h", "cc", "cpp", "cxx", "hpp", "cs", "rb", "php", "swift", "m", "mm", "sh", "bash", "zsh",
    "fish", "ps1", "lua", "pl", "r", "dart", "ex", "exs", "erl", "hs", "ml", "clj", "vue", "svelte",
    "sql", "html", "css", "scss", "sass", "less",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    SystemConfig,
    NonCode,
    Code,
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SystemConfig => write!(f, "system-config"),
            Self::NonCode => write!(f, "non-code"),
            Self::Code => write!(f, "code"),
        }
    }
}

/// Classify a target. `None` (no path supplied) is `NonCode`.
pub fn classify(target: Option<&CanonicalPath>, layout: &ProjectLayout) -> ResourceClass {
    let Some(target) = target.filter(|t| !t.is_empty()) else {
        return ResourceClass::NonCode;
    };
    let path = target.as_path();

    if is_system_config(path, layout) {
        return ResourceClass::SystemConfig;
    }

    match extension_of(path) {
        Some(ext) if NON_CODE_EXTENSIONS.contains(&ext.as_str()) => ResourceClass::NonCode,
        Some(ext) if CODE_EXTENSIONS.contains(&ext.as_str()) => ResourceClass::Code,
        _ => ResourceClass::NonCode,
    }
}

fn is_system_config(path: &Path, layout: &ProjectLayout) -> bool {
    paths::is_within(path, &layout.config_dir())
        || layout
            .user_config_dir()
            .is_some_and(|dir| paths::is_within(path, &dir))
        || path
            .file_name()
            .is_some_and(|name| paths::component_eq(name, OsStr::new(INSTRUCTION_FILE)))
}

/// Lowercased text after the final `.` of the file name; dotfiles have none.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}
