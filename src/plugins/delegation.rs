//! Delegation decision engine.
//!
//! Code edits are reserved for the implementation subagent. Until the session
//! log holds a completion record, any edit to a `Code` target is blocked;
//! `SystemConfig` and `NonCode` targets never consult the store.

use crate::core::classify::ResourceClass;
use crate::core::gatekeeper::{BlockReason, CheckKind};
use crate::core::paths::CanonicalPath;
use crate::core::store::StateStore;

pub const REMEDIATION: &str = "delegate this change to the implementation subagent and let it finish; its AGENT_COMPLETED record in the session log unlocks code edits for this session";

pub fn check_delegation(
    target: &CanonicalPath,
    class: ResourceClass,
    store: &dyn StateStore,
) -> Option<BlockReason> {
    if class != ResourceClass::Code {
        return None;
    }
    if store.has_completion_evidence() {
        tracing::debug!(path = %target, "delegation evidence present");
        return None;
    }
    Some(BlockReason {
        check: CheckKind::Delegation,
        resource: target.to_string(),
        message: format!("code edit to {} requires a completed delegation", target),
        remediation: REMEDIATION.to_string(),
    })
}
