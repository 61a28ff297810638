//! Request normalization.
//!
//! A hook invocation is one JSON object on stdin. The interesting parts may
//! sit under `tool_input` (the host's shape) or at the top level (bare
//! requests), under any of several keys. Nothing here fails: an unparseable
//! body is kept as raw text with every derived field absent.

use serde_json::{Map, Value};

/// Target-path keys, highest priority first.
pub const PATH_KEYS: &[&str] = &["file_path", "path", "notebook_path", "target_file"];
/// Command-text keys, highest priority first.
pub const COMMAND_KEYS: &[&str] = &["command", "cmd"];

const FILE_EDIT_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit", "NotebookEdit"];
const SHELL_TOOLS: &[&str] = &["Bash"];
const READ_ONLY_TOOLS: &[&str] = &["Read", "Glob", "Grep", "LS", "WebFetch", "WebSearch"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    FileEdit,
    Shell,
    ReadOnly,
    Other,
}

/// One hook invocation, immutable once received.
#[derive(Debug, Clone)]
pub struct ToolInvocationRequest {
    raw: String,
    tool_name: Option<String>,
    target_path: Option<String>,
    command: Option<String>,
    cwd: Option<String>,
    fields: Map<String, Value>,
}

impl ToolInvocationRequest {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let fields = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                tracing::warn!("hook input is not a JSON object; treating as opaque");
                Map::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "hook input is not valid JSON; treating as opaque");
                Map::new()
            }
        };

        let tool_input = fields.get("tool_input").and_then(Value::as_object);
        let lookup = |keys: &[&str]| {
            tool_input
                .and_then(|input| first_string(input, keys))
                .or_else(|| first_string(&fields, keys))
        };
        let target_path = lookup(PATH_KEYS);
        let command = lookup(COMMAND_KEYS);
        let tool_name = first_string(&fields, &["tool_name"]);
        let cwd = first_string(&fields, &["cwd"]);

        Self {
            raw,
            tool_name,
            target_path,
            command,
            cwd,
            fields,
        }
    }

    /// Exact text received; echoed verbatim on allow.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    pub fn target_path(&self) -> Option<&str> {
        self.target_path.as_deref()
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Working directory reported by the host, if any.
    pub fn cwd(&self) -> Option<&str> {
        self.cwd.as_deref()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Every decoded string value in the request, depth first.
    pub fn string_values(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for value in self.fields.values() {
            collect_strings(value, &mut out);
        }
        out
    }

    /// A request without a tool name that names a path is treated as a file
    /// edit; without either it is `Other` and only the unconditional checks apply.
    pub fn kind(&self) -> RequestKind {
        let Some(tool) = self.tool_name() else {
            return if self.target_path.is_some() {
                RequestKind::FileEdit
            } else {
                RequestKind::Other
            };
        };
        let is = |names: &[&str]| names.iter().any(|n| n.eq_ignore_ascii_case(tool));
        if is(FILE_EDIT_TOOLS) {
            RequestKind::FileEdit
        } else if is(SHELL_TOOLS) {
            RequestKind::Shell
        } else if is(READ_ONLY_TOOLS) {
            RequestKind::ReadOnly
        } else {
            RequestKind::Other
        }
    }
}

fn first_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k).and_then(Value::as_str))
        .find(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn collect_strings<'v>(value: &'v Value, out: &mut Vec<&'v str>) {
    match value {
        Value::String(text) => out.push(text),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}
