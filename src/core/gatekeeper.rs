//! Gatekeeper admission pipeline
//!
//! Runs one request through the fixed check sequence:
//! - Hook integrity (every request carrying a path, except read-only tools)
//! - Dangerous-command scan (every request, over the raw serialized text)
//! - Classification and delegation (file edits only)
//!
//! The first check that blocks ends evaluation. Nothing is written anywhere
//! while a request is evaluated; the only shared state is a read of the
//! session store.

use crate::core::classify::{self, ResourceClass};
use crate::core::config::ProjectLayout;
use crate::core::paths::{self, CanonicalPath};
use crate::core::request::{RequestKind, ToolInvocationRequest};
use crate::core::store::StateStore;
use crate::plugins::{danger, delegation, integrity};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    HookIntegrity,
    DangerousCommand,
    Delegation,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HookIntegrity => write!(f, "hook integrity"),
            Self::DangerousCommand => write!(f, "dangerous command"),
            Self::Delegation => write!(f, "delegation required"),
        }
    }
}

/// Why a request was blocked. Always names the resource and the fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockReason {
    pub check: CheckKind,
    pub resource: String,
    pub message: String,
    pub remediation: String,
}

/// Typed verdict; [`crate::core::emit`] turns it into host signalling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Carries the original request text, unchanged.
    Allow(String),
    Block(BlockReason),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    pub fn block_reason(&self) -> Option<&BlockReason> {
        match self {
            Self::Allow(_) => None,
            Self::Block(reason) => Some(reason),
        }
    }
}

pub struct Gatekeeper<'a> {
    layout: &'a ProjectLayout,
    store: &'a dyn StateStore,
}

impl<'a> Gatekeeper<'a> {
    pub fn new(layout: &'a ProjectLayout, store: &'a dyn StateStore) -> Self {
        Self { layout, store }
    }

    pub fn evaluate(&self, request: &ToolInvocationRequest) -> Verdict {
        let kind = request.kind();
        let target = request
            .target_path()
            .map(|raw| paths::canonicalize(raw, &self.base_dir(request)));

        if kind != RequestKind::ReadOnly {
            if let Some(reason) = target.as_ref().and_then(integrity::check_integrity) {
                return block(reason);
            }
        }

        if let Some(reason) = danger::check_request(request) {
            return block(reason);
        }

        if kind == RequestKind::FileEdit {
            let class = classify::classify(target.as_ref(), self.layout);
            tracing::debug!(
                target = target.as_ref().map(|t| t.to_string()).unwrap_or_default(),
                %class,
                "classified file edit"
            );
            if let Some(reason) = target
                .as_ref()
                .and_then(|t| delegation::check_delegation(t, class, self.store))
            {
                return block(reason);
            }
        } else if target.is_none() && request.command().is_none() {
            tracing::warn!("request names no path and no command; allowing");
        }

        Verdict::Allow(request.raw().to_string())
    }

    /// Classification of `raw` as the pipeline would see it.
    pub fn classify_path(&self, raw: &str) -> (CanonicalPath, ResourceClass) {
        let target = paths::canonicalize(raw, self.layout.root());
        let class = classify::classify(Some(&target), self.layout);
        (target, class)
    }

    fn base_dir(&self, request: &ToolInvocationRequest) -> PathBuf {
        request
            .cwd()
            .map(Path::new)
            .filter(|p| p.is_absolute())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.layout.root().to_path_buf())
    }
}

fn block(reason: BlockReason) -> Verdict {
    tracing::info!(check = %reason.check, resource = %reason.resource, "blocked");
    Verdict::Block(reason)
}
