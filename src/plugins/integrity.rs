//! Hook-integrity guard.
//!
//! The gate's own control scripts live under `.claude/hooks/`. No agent,
//! delegated or not, may edit them directly; the only mutable part of that
//! namespace is `.claude/hooks/extensions/`.

use crate::core::config::{CONFIG_NAMESPACE, EXTENSIONS_DIR, HOOKS_DIR};
use crate::core::gatekeeper::{BlockReason, CheckKind};
use crate::core::paths::{CanonicalPath, component_eq};
use std::ffi::OsStr;
use std::path::{Component, Path};

pub const REMEDIATION: &str = "use the extension mechanism: put hook changes under .claude/hooks/extensions/ instead of editing the control scripts";

/// True when `path` is inside a `.claude/hooks` directory but not inside its
/// `extensions` sub-directory. Matched on path segments, so it holds for the
/// project's hooks and for any other `.claude` tree the target resolves into.
pub fn is_protected(path: &Path) -> bool {
    let names: Vec<&OsStr> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .collect();

    names.windows(2).enumerate().any(|(i, pair)| {
        let is_hooks = component_eq(pair[0], OsStr::new(CONFIG_NAMESPACE))
            && component_eq(pair[1], OsStr::new(HOOKS_DIR));
        let in_extensions = names
            .get(i + 2)
            .is_some_and(|next| component_eq(next, OsStr::new(EXTENSIONS_DIR)));
        is_hooks && !in_extensions
    })
}

pub fn check_integrity(target: &CanonicalPath) -> Option<BlockReason> {
    if target.is_empty() || !is_protected(target.as_path()) {
        return None;
    }
    Some(BlockReason {
        check: CheckKind::HookIntegrity,
        resource: target.to_string(),
        message: "direct edits to the gate's control scripts are not allowed".to_string(),
        remediation: REMEDIATION.to_string(),
    })
}
