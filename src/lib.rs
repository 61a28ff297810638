//! delegate-gate: admission control for coding-agent tool calls
//!
//! A hook host runs `delegate-gate` synchronously before it performs a file
//! edit or shell command, feeding the tool invocation as JSON on stdin. The
//! gate answers with its exit status:
//!
//! - **0**: allowed; the request is echoed unchanged on stdout
//! - **2**: blocked; a diagnostic naming the resource and the fix is on stderr
//!
//! # Checks
//!
//! - **Hook integrity**: `.claude/hooks/` is immutable except for
//!   `.claude/hooks/extensions/`
//! - **Dangerous commands**: a fixed deny-list (recursive forced deletion,
//!   mode 777, string evaluation) over the whole request text
//! - **Delegation**: edits to code files need an `AGENT_COMPLETED` record in
//!   the session log, i.e. the implementation subagent has done the work
//!
//! Missing or malformed input fails open. The gate never writes the session
//! log while evaluating; `delegate-gate record` is the writer, called from the
//! host's subagent lifecycle hooks.
//!
//! # Examples
//!
//! ```bash
//! # Hook mode (what the host runs)
//! echo '{"tool_name":"Edit","tool_input":{"file_path":"src/app.py"}}' | delegate-gate
//!
//! # Subagent lifecycle
//! delegate-gate record started --payload impl-run-1
//! delegate-gate record completed --payload impl-run-1
//!
//! # Inspection
//! delegate-gate status --format json
//! delegate-gate classify src/app.py
//! delegate-gate scan 'rm -rf build'
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: request model, path resolution, classification, session store,
//!   gatekeeper pipeline and emitter
//! - [`plugins`]: the individual policy checks

mod cli;
pub mod core;
pub mod plugins;

use crate::cli::{Cli, ClassifyCli, Command, FormatCli, RecordCli};
use crate::core::config::GateConfig;
use crate::core::emit::{self, ALLOW_EXIT_CODE, BLOCK_EXIT_CODE, USAGE_EXIT_CODE};
use crate::core::gatekeeper::{Gatekeeper, Verdict};
use crate::core::request::ToolInvocationRequest;
use crate::core::store::{FileStateStore, SessionEvent, StateStore, is_completion_record};
use crate::core::time;
use crate::plugins::{danger, integrity};

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::io::{self, Read, Write};
use std::path::PathBuf;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse argv, dispatch, and return the process exit code.
pub fn run() -> anyhow::Result<u8> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help lands here too and is not a failure.
            e.print()?;
            return Ok(if e.use_stderr() {
                USAGE_EXIT_CODE
            } else {
                ALLOW_EXIT_CODE
            });
        }
    };
    match cli.command.unwrap_or(Command::Check) {
        Command::Check => Ok(run_check(cli.project_dir)),
        Command::Record(record) => run_record(cli.project_dir, record),
        Command::Status(format) => run_status(cli.project_dir, format),
        Command::Classify(classify) => run_classify(cli.project_dir, classify),
        Command::Scan { text } => Ok(run_scan(&text)),
        Command::Version => {
            println!("v{}", VERSION);
            Ok(ALLOW_EXIT_CODE)
        }
    }
}

/// Hook mode. Always resolves to a verdict; internal failures allow.
fn run_check(project_dir: Option<PathBuf>) -> u8 {
    let mut bytes = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut bytes) {
        tracing::warn!(error = %e, "could not read hook input; allowing");
        return ALLOW_EXIT_CODE;
    }
    let (raw, verbatim) = match String::from_utf8(bytes) {
        Ok(text) => (text, None),
        Err(e) => {
            tracing::warn!("hook input is not UTF-8; scanning a lossy copy");
            let bytes = e.into_bytes();
            (String::from_utf8_lossy(&bytes).into_owned(), Some(bytes))
        }
    };

    let config = match GateConfig::from_env_lenient(project_dir) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "could not resolve project; allowing");
            return echo(verbatim.as_deref().unwrap_or(raw.as_bytes()));
        }
    };

    let store = FileStateStore::new(&config.session_log);
    let gate = Gatekeeper::new(&config.layout, &store);
    let request = ToolInvocationRequest::parse(raw);
    let verdict = gate.evaluate(&request);

    if let (Verdict::Allow(_), Some(bytes)) = (&verdict, verbatim.as_deref()) {
        return echo(bytes);
    }

    let fallback = if verdict.is_allowed() {
        ALLOW_EXIT_CODE
    } else {
        BLOCK_EXIT_CODE
    };
    let stdout = io::stdout();
    let stderr = io::stderr();
    emit::emit(&verdict, &mut stdout.lock(), &mut stderr.lock()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not write verdict");
        fallback
    })
}

fn echo(bytes: &[u8]) -> u8 {
    let mut out = io::stdout().lock();
    if let Err(e) = out.write_all(bytes).and_then(|_| out.flush()) {
        tracing::warn!(error = %e, "could not echo hook input");
    }
    ALLOW_EXIT_CODE
}

fn run_record(project_dir: Option<PathBuf>, record: RecordCli) -> anyhow::Result<u8> {
    let config = GateConfig::from_env(project_dir).context("resolving gate configuration")?;
    let store = FileStateStore::new(&config.session_log);
    let payload = record.payload.unwrap_or_else(time::new_run_id);
    let event = SessionEvent::now(record.kind.into(), &payload);
    store
        .append(&event)
        .with_context(|| format!("appending to {}", store.path().display()))?;
    println!("✓ Recorded {} in {}", event.kind, store.path().display());
    Ok(ALLOW_EXIT_CODE)
}

fn run_status(project_dir: Option<PathBuf>, format: FormatCli) -> anyhow::Result<u8> {
    let config = GateConfig::from_env(project_dir).context("resolving gate configuration")?;
    let store = FileStateStore::new(&config.session_log);
    let lines = store
        .read_lines()
        .with_context(|| format!("reading {}", store.path().display()))?;
    let events = lines.iter().filter_map(|l| SessionEvent::parse(l)).count();
    let completions = lines.iter().filter(|l| is_completion_record(l)).count();
    let delegated = store.has_completion_evidence();

    if format.format == "json" {
        let report = serde_json::json!({
            "project_root": config.layout.root(),
            "session_log": store.path(),
            "log_exists": store.path().exists(),
            "lines": lines.len(),
            "events": events,
            "completions": completions,
            "delegated": delegated,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Project:     {}", config.layout.root().display());
        println!("Session log: {}", store.path().display());
        println!("Events:      {} ({} completion records)", events, completions);
        if delegated {
            println!("{} code edits unlocked for this session", "✓".bright_green());
        } else {
            println!(
                "{} no completed delegation yet; code edits are blocked",
                "✗".bright_red()
            );
        }
    }
    Ok(ALLOW_EXIT_CODE)
}

fn run_classify(project_dir: Option<PathBuf>, classify: ClassifyCli) -> anyhow::Result<u8> {
    let config = GateConfig::from_env(project_dir).context("resolving gate configuration")?;
    let store = FileStateStore::new(&config.session_log);
    let gate = Gatekeeper::new(&config.layout, &store);
    let (target, class) = gate.classify_path(&classify.path);
    let protected = integrity::is_protected(target.as_path());

    if classify.format == "json" {
        let report = serde_json::json!({
            "input": classify.path,
            "canonical": target.to_string(),
            "resolved": target.is_resolved(),
            "class": class,
            "protected": protected,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Canonical: {}", target);
        println!("Class:     {}", class);
        if protected {
            println!("Protected: yes (edit via .claude/hooks/extensions/)");
        } else {
            println!("Protected: no");
        }
    }
    Ok(ALLOW_EXIT_CODE)
}

fn run_scan(text: &str) -> u8 {
    match danger::scan(text) {
        Some(found) => {
            println!(
                "{} {}: `{}` ({})",
                "✗".bright_red(),
                found.kind,
                found.fragment,
                found.message
            );
            BLOCK_EXIT_CODE
        }
        None => {
            println!("{} no dangerous pattern", "✓".bright_green());
            ALLOW_EXIT_CODE
        }
    }
}
