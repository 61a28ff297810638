//! Session state store.
//!
//! The session log is an append-only text file, one event per line:
//!
//! ```text
//! 2025-01-01T00:00:00Z AGENT_STARTED run-01J...
//! 2025-01-01T00:04:12Z AGENT_COMPLETED run-01J...
//! ```
//!
//! The gate only ever reads it. Lines are appended by the host's subagent
//! lifecycle hooks (`delegate-gate record`) and cleared by whatever manages
//! the session lifecycle, never by an admission check.
//!
//! A session is delegated iff at least one line matches the completion
//! pattern. The file merely existing, or mentioning the marker somewhere
//! without a leading timestamp, does not count.

use crate::core::error::GateError;
use crate::core::output;
use crate::core::time;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{LazyLock, Mutex};

/// `<ISO-8601 timestamp><anything>AGENT_COMPLETED<anything>`
static COMPLETION_RECORD: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(?::\d{2}(?:[.,]\d+)?)?(?:Z|[+-]\d{2}(?::?\d{2})?)?.*AGENT_COMPLETED",
    )
    .ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    #[serde(rename = "AGENT_STARTED")]
    AgentStarted,
    #[serde(rename = "AGENT_COMPLETED")]
    AgentCompleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AgentStarted => "AGENT_STARTED",
            Self::AgentCompleted => "AGENT_COMPLETED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AGENT_STARTED" => Ok(Self::AgentStarted),
            "AGENT_COMPLETED" => Ok(Self::AgentCompleted),
            other => Err(GateError::InvalidEventKind(other.to_string())),
        }
    }
}

/// One line of the session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEvent {
    pub ts: String,
    pub kind: EventKind,
    pub payload: String,
}

impl SessionEvent {
    /// Event stamped with the current time.
    pub fn now(kind: EventKind, payload: &str) -> Self {
        Self::at(&time::now_iso8601(), kind, payload)
    }

    /// Payload line breaks are flattened so one event is always one line.
    pub fn at(ts: &str, kind: EventKind, payload: &str) -> Self {
        Self {
            ts: ts.to_string(),
            kind,
            payload: output::single_line(payload),
        }
    }

    /// Newline-terminated log line.
    pub fn to_line(&self) -> String {
        if self.payload.is_empty() {
            format!("{} {}\n", self.ts, self.kind)
        } else {
            format!("{} {} {}\n", self.ts, self.kind, self.payload)
        }
    }

    /// Parse a line written by [`SessionEvent::to_line`].
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim_end().splitn(3, ' ');
        let ts = parts.next()?;
        let kind = parts.next()?.parse().ok()?;
        let payload = parts.next().unwrap_or("");
        chrono::DateTime::parse_from_rfc3339(ts).ok()?;
        Some(Self::at(ts, kind, payload))
    }
}

/// True iff `line` is a well-formed completion record.
pub fn is_completion_record(line: &str) -> bool {
    COMPLETION_RECORD
        .as_ref()
        .is_some_and(|re| re.is_match(line))
}

/// Durable, append-only session state.
pub trait StateStore {
    /// Append one event as a single atomic line write.
    fn append(&self, event: &SessionEvent) -> Result<(), GateError>;

    /// Whether any completion record has ever been written. A missing or
    /// unreadable store answers `false`.
    fn has_completion_evidence(&self) -> bool;
}

/// File-backed store; the file and its directory are created on first append.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All lines currently in the log; a missing log reads as empty.
    pub fn read_lines(&self) -> Result<Vec<String>, GateError> {
        match self.read_text() {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(GateError::IoError(e)),
        }
    }

    /// Invalid UTF-8 from another writer is replaced, not fatal.
    fn read_text(&self) -> std::io::Result<String> {
        let bytes = fs::read(&self.path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl StateStore for FileStateStore {
    fn append(&self, event: &SessionEvent) -> Result<(), GateError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // Single write on an O_APPEND handle: concurrent writers never interleave.
        file.write_all(event.to_line().as_bytes())?;
        Ok(())
    }

    fn has_completion_evidence(&self) -> bool {
        match self.read_text() {
            Ok(content) => content.lines().any(is_completion_record),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "session log unavailable");
                false
            }
        }
    }
}

/// In-process store with the same matching rules as [`FileStateStore`].
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    lines: Mutex<Vec<String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with raw lines, well-formed or not.
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Mutex::new(lines.into_iter().map(Into::into).collect()),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl StateStore for MemoryStateStore {
    fn append(&self, event: &SessionEvent) -> Result<(), GateError> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| GateError::StoreUnavailable("memory store lock poisoned".into()))?;
        lines.push(event.to_line().trim_end_matches('\n').to_string());
        Ok(())
    }

    fn has_completion_evidence(&self) -> bool {
        self.lines
            .lock()
            .map(|lines| lines.iter().any(|l| is_completion_record(l)))
            .unwrap_or(false)
    }
}
