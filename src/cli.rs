//! CLI struct definitions for the delegate-gate command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use crate::core::store::EventKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "delegate-gate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Admission-control hook for coding agents: gates code edits on delegation, protects its own control scripts, refuses catastrophic commands.",
    disable_version_flag = true
)]
pub(crate) struct Cli {
    /// Project root (defaults to $CLAUDE_PROJECT_DIR, then the current directory).
    #[clap(long, global = true)]
    pub project_dir: Option<PathBuf>,
    /// Defaults to `check` when omitted, which is how hook hosts invoke it.
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Evaluate one hook request from stdin (hook mode)
    Check,
    /// Append a lifecycle event to the session log
    Record(RecordCli),
    /// Show whether the current session holds delegation evidence
    Status(FormatCli),
    /// Show how a path would be classified
    Classify(ClassifyCli),
    /// Run only the dangerous-command scanner over TEXT
    Scan {
        /// Text to scan, e.g. a shell command
        text: String,
    },
    /// Print version
    Version,
}

#[derive(clap::Args, Debug)]
pub(crate) struct RecordCli {
    /// Lifecycle event to record.
    #[clap(value_enum)]
    pub kind: RecordKind,
    /// Free-text payload (defaults to a fresh run id).
    #[clap(long)]
    pub payload: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RecordKind {
    Started,
    Completed,
}

impl From<RecordKind> for EventKind {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Started => EventKind::AgentStarted,
            RecordKind::Completed => EventKind::AgentCompleted,
        }
    }
}

#[derive(clap::Args, Debug)]
pub(crate) struct FormatCli {
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text")]
    pub format: String,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ClassifyCli {
    /// Path to classify; relative paths are taken from the project root.
    pub path: String,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text")]
    pub format: String,
}
