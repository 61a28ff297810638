//! Dangerous-command scanner.
//!
//! A closed table of tagged rules matched, case-insensitively, against the
//! whole serialized request and against every decoded string in it, rather
//! than a parsed shell command. Command text nested in any field is caught,
//! including whitespace that JSON escapes (`rm\t-rf`), and file contents that
//! merely mention one of these idioms are blocked too. New rules are new rows,
//! not new control flow.

use crate::core::gatekeeper::{BlockReason, CheckKind};
use crate::core::output;
use crate::core::request::ToolInvocationRequest;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerKind {
    RecursiveDelete,
    PermissiveMode,
    DynamicEval,
}

impl fmt::Display for DangerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecursiveDelete => write!(f, "recursive forced deletion"),
            Self::PermissiveMode => write!(f, "world-writable permission change"),
            Self::DynamicEval => write!(f, "dynamic code evaluation"),
        }
    }
}

#[derive(Debug)]
pub struct DangerRule {
    pub kind: DangerKind,
    pub pattern: &'static str,
    pub message: &'static str,
}

pub const DANGER_RULES: &[DangerRule] = &[
    DangerRule {
        kind: DangerKind::RecursiveDelete,
        pattern: r"\brm\s+(?:-\S+\s+)*-[a-z]*(?:r[a-z]*f|f[a-z]*r)[a-z]*\b",
        message: "rewrite the command without `rm -rf`; delete specific files explicitly",
    },
    DangerRule {
        kind: DangerKind::RecursiveDelete,
        pattern: r"\brm\s+(?:-\S+\s+)*(?:-r|--recursive)\s+(?:-\S+\s+)*(?:-f|--force)\b",
        message: "rewrite the command without `rm -r -f`; delete specific files explicitly",
    },
    DangerRule {
        kind: DangerKind::RecursiveDelete,
        pattern: r"\brm\s+(?:-\S+\s+)*(?:-f|--force)\s+(?:-\S+\s+)*(?:-r|--recursive)\b",
        message: "rewrite the command without `rm -f -r`; delete specific files explicitly",
    },
    DangerRule {
        kind: DangerKind::PermissiveMode,
        pattern: r"\bchmod\s+(?:-\S+\s+)*0?777\b",
        message: "grant only the permissions needed instead of mode 777",
    },
    DangerRule {
        kind: DangerKind::PermissiveMode,
        pattern: r"\bchmod\s+(?:-\S+\s+)*(?:a|ugo)\+rwx\b",
        message: "grant only the permissions needed instead of a+rwx",
    },
    DangerRule {
        kind: DangerKind::DynamicEval,
        pattern: r"(?:^|[^.\w])eval\s*\(",
        message: "call the code directly instead of evaluating a string",
    },
    DangerRule {
        kind: DangerKind::DynamicEval,
        pattern: r#"\beval\s+[\\"'$`]"#,
        message: "run the command directly instead of passing it through shell `eval`",
    },
    DangerRule {
        kind: DangerKind::DynamicEval,
        pattern: r"(?:^|[^.\w])exec\s*\(",
        message: "call the code directly instead of `exec()` on a string",
    },
];

struct CompiledRule {
    rule: &'static DangerRule,
    regex: Regex,
}

static COMPILED_RULES: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    DANGER_RULES
        .iter()
        .filter_map(|rule| {
            match RegexBuilder::new(rule.pattern)
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => Some(CompiledRule { rule, regex }),
                Err(e) => {
                    tracing::error!(pattern = rule.pattern, error = %e, "invalid danger rule");
                    None
                }
            }
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DangerMatch {
    pub kind: DangerKind,
    pub fragment: String,
    pub message: &'static str,
}

/// First rule that matches `text`, in table order.
pub fn scan(text: &str) -> Option<DangerMatch> {
    COMPILED_RULES.iter().find_map(|compiled| {
        compiled.regex.find(text).map(|m| DangerMatch {
            kind: compiled.rule.kind,
            fragment: m.as_str().trim().to_string(),
            message: compiled.rule.message,
        })
    })
}

pub fn check_dangerous(serialized: &str) -> Option<BlockReason> {
    scan(serialized).map(block_reason)
}

/// Scan the raw text (malformed input included), then each decoded string.
pub fn check_request(request: &ToolInvocationRequest) -> Option<BlockReason> {
    scan(request.raw())
        .or_else(|| request.string_values().into_iter().find_map(scan))
        .map(block_reason)
}

fn block_reason(found: DangerMatch) -> BlockReason {
    BlockReason {
        check: CheckKind::DangerousCommand,
        resource: output::compact_line(&found.fragment, 80),
        message: format!("request contains {}", found.kind),
        remediation: found.message.to_string(),
    }
}
