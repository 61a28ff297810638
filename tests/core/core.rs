use delegate_gate::core::classify::ResourceClass;
use delegate_gate::core::config::ProjectLayout;
use delegate_gate::core::gatekeeper::{CheckKind, Gatekeeper, Verdict};
use delegate_gate::core::request::ToolInvocationRequest;
use delegate_gate::core::store::{
    EventKind, FileStateStore, MemoryStateStore, SessionEvent, StateStore,
};
use std::fs;
use tempfile::TempDir;

const COMPLETED: &str = "2025-01-01T00:00:00 AGENT_COMPLETED run1";

fn project() -> (TempDir, ProjectLayout) {
    let tmp = TempDir::new().expect("tmpdir");
    let layout = ProjectLayout::new(tmp.path());
    (tmp, layout)
}

fn bare(path: &str) -> ToolInvocationRequest {
    ToolInvocationRequest::parse(serde_json::json!({ "file_path": path }).to_string())
}

fn in_root(layout: &ProjectLayout, rel: &str) -> String {
    layout.root().join(rel).display().to_string()
}

#[test]
fn code_edit_without_delegation_is_blocked_and_names_the_path() {
    let (_tmp, layout) = project();
    let store = MemoryStateStore::new();
    let gate = Gatekeeper::new(&layout, &store);
    let app = in_root(&layout, "src/app.py");

    let verdict = gate.evaluate(&bare(&app));
    let reason = verdict.block_reason().expect("blocked");
    assert_eq!(reason.check, CheckKind::Delegation);
    assert!(reason.message.contains(&app));
    assert_eq!(reason.resource, app);
}

#[test]
fn code_edit_after_completion_is_allowed_with_payload_unchanged() {
    let (_tmp, layout) = project();
    let store = MemoryStateStore::with_lines([COMPLETED]);
    let gate = Gatekeeper::new(&layout, &store);
    let request = bare(&in_root(&layout, "src/app.py"));

    assert_eq!(
        gate.evaluate(&request),
        Verdict::Allow(request.raw().to_string())
    );
}

#[test]
fn non_code_and_system_config_allow_regardless_of_session_state() {
    let (_tmp, layout) = project();
    let empty = MemoryStateStore::new();
    let delegated = MemoryStateStore::with_lines([COMPLETED]);

    for rel in [
        "README.md",
        "docs/guide.rst",
        "Makefile",
        "CLAUDE.md",
        ".claude/settings.json",
        ".claude/agents/impl.py",
    ] {
        let request = bare(&in_root(&layout, rel));
        for store in [&empty as &dyn StateStore, &delegated] {
            let gate = Gatekeeper::new(&layout, store);
            assert!(gate.evaluate(&request).is_allowed(), "{rel}");
        }
    }
}

#[test]
fn classification_is_case_insensitive() {
    let (_tmp, layout) = project();
    let store = MemoryStateStore::new();
    let gate = Gatekeeper::new(&layout, &store);

    assert_eq!(gate.classify_path("FOO.PY").1, gate.classify_path("foo.py").1);
    assert_eq!(gate.classify_path("FOO.PY").1, ResourceClass::Code);
    assert!(!gate.evaluate(&bare(&in_root(&layout, "SRC/MAIN.RS"))).is_allowed());
}

#[cfg(unix)]
#[test]
fn symlink_into_config_namespace_is_system_config() {
    let (_tmp, layout) = project();
    let agents = layout.config_dir().join("agents");
    fs::create_dir_all(&agents).unwrap();
    fs::write(agents.join("impl.py"), "print('x')\n").unwrap();
    std::os::unix::fs::symlink(agents.join("impl.py"), layout.root().join("tool.py")).unwrap();

    let store = MemoryStateStore::new();
    let gate = Gatekeeper::new(&layout, &store);
    let (canonical, class) = gate.classify_path("tool.py");
    assert_eq!(class, ResourceClass::SystemConfig);
    assert_eq!(canonical.as_path(), agents.join("impl.py"));
    assert!(gate.evaluate(&bare(&in_root(&layout, "tool.py"))).is_allowed());
}

#[cfg(unix)]
#[test]
fn symlink_cannot_smuggle_a_hook_edit() {
    let (_tmp, layout) = project();
    let hooks = layout.hooks_dir();
    fs::create_dir_all(&hooks).unwrap();
    fs::write(hooks.join("gate.sh"), "#!/bin/sh\n").unwrap();
    std::os::unix::fs::symlink(hooks.join("gate.sh"), layout.root().join("notes.txt")).unwrap();

    let store = MemoryStateStore::with_lines([COMPLETED]);
    let gate = Gatekeeper::new(&layout, &store);
    let verdict = gate.evaluate(&bare(&in_root(&layout, "notes.txt")));
    assert_eq!(
        verdict.block_reason().map(|r| r.check),
        Some(CheckKind::HookIntegrity)
    );
}

#[test]
fn spoofed_log_content_does_not_count_as_delegation() {
    let (tmp, layout) = project();
    let log = tmp.path().join("delegation.log");
    fs::write(
        &log,
        "AGENT_COMPLETED\nthe subagent finished, AGENT_COMPLETED\nagent completed 2025-01-01T00:00:00\n",
    )
    .unwrap();
    let store = FileStateStore::new(&log);
    let gate = Gatekeeper::new(&layout, &store);

    assert!(!gate.evaluate(&bare(&in_root(&layout, "src/app.py"))).is_allowed());
}

#[test]
fn started_record_alone_does_not_unlock_code_edits() {
    let (tmp, layout) = project();
    let store = FileStateStore::new(tmp.path().join("delegation.log"));
    store
        .append(&SessionEvent::now(EventKind::AgentStarted, "impl-run"))
        .unwrap();
    let gate = Gatekeeper::new(&layout, &store);

    assert!(!gate.evaluate(&bare(&in_root(&layout, "src/app.py"))).is_allowed());
}

#[test]
fn file_store_evidence_unlocks_code_edits() {
    let (tmp, layout) = project();
    let store = FileStateStore::new(tmp.path().join("state/delegation.log"));
    let gate = Gatekeeper::new(&layout, &store);
    let request = bare(&in_root(&layout, "lib/core.ts"));

    assert!(!gate.evaluate(&request).is_allowed());
    store
        .append(&SessionEvent::now(EventKind::AgentCompleted, "run1"))
        .unwrap();
    assert!(gate.evaluate(&request).is_allowed());
}

#[test]
fn dangerous_command_blocks_even_for_non_code_targets() {
    let (_tmp, layout) = project();
    let store = MemoryStateStore::with_lines([COMPLETED]);
    let gate = Gatekeeper::new(&layout, &store);

    let request = ToolInvocationRequest::parse(
        serde_json::json!({
            "file_path": in_root(&layout, "README.md"),
            "command": "rm -rf /"
        })
        .to_string(),
    );
    assert_eq!(
        gate.evaluate(&request).block_reason().map(|r| r.check),
        Some(CheckKind::DangerousCommand)
    );
}

#[test]
fn dangerous_shell_command_blocks_regardless_of_state() {
    let (_tmp, layout) = project();
    for store in [
        MemoryStateStore::new(),
        MemoryStateStore::with_lines([COMPLETED]),
    ] {
        let gate = Gatekeeper::new(&layout, &store);
        let request = ToolInvocationRequest::parse(
            r#"{"tool_name":"Bash","tool_input":{"command":"rm -rf /"}}"#,
        );
        assert!(!gate.evaluate(&request).is_allowed());
    }
}

#[test]
fn escaped_whitespace_cannot_hide_a_dangerous_command() {
    let (_tmp, layout) = project();
    let store = MemoryStateStore::with_lines([COMPLETED]);
    let gate = Gatekeeper::new(&layout, &store);

    for command in ["rm\t-rf /", "chmod\t777 /", "sudo rm -r\t-f /srv"] {
        let request = ToolInvocationRequest::parse(
            serde_json::json!({"tool_name": "Bash", "tool_input": {"command": command}})
                .to_string(),
        );
        let reason = gate.evaluate(&request);
        assert_eq!(
            reason.block_reason().map(|r| r.check),
            Some(CheckKind::DangerousCommand),
            "{command:?}"
        );
    }
}

#[test]
fn malformed_input_with_dangerous_text_is_still_blocked() {
    let (_tmp, layout) = project();
    let store = MemoryStateStore::new();
    let gate = Gatekeeper::new(&layout, &store);

    let request = ToolInvocationRequest::parse("{\"command\": \"chmod 777 / ");
    assert_eq!(
        gate.evaluate(&request).block_reason().map(|r| r.check),
        Some(CheckKind::DangerousCommand)
    );

    let request = ToolInvocationRequest::parse("garbage");
    assert!(gate.evaluate(&request).is_allowed());
}

#[test]
fn control_script_edit_is_blocked_even_when_delegated() {
    let (_tmp, layout) = project();
    let store = MemoryStateStore::with_lines([COMPLETED]);
    let gate = Gatekeeper::new(&layout, &store);

    let verdict = gate.evaluate(&bare(&in_root(&layout, ".claude/hooks/delegate-gate.sh")));
    let reason = verdict.block_reason().expect("blocked");
    assert_eq!(reason.check, CheckKind::HookIntegrity);
    assert!(reason.remediation.contains("extension"));

    let ext = in_root(&layout, ".claude/hooks/extensions/notify.sh");
    assert!(gate.evaluate(&bare(&ext)).is_allowed());
}

#[test]
fn evaluation_is_idempotent() {
    let (_tmp, layout) = project();
    let store = MemoryStateStore::new();
    let gate = Gatekeeper::new(&layout, &store);
    let request = bare(&in_root(&layout, "src/app.py"));

    let first = gate.evaluate(&request);
    for _ in 0..5 {
        assert_eq!(gate.evaluate(&request), first);
    }
    assert!(store.lines().is_empty());
}

#[test]
fn host_shaped_requests_are_gated_by_tool() {
    let (_tmp, layout) = project();
    let store = MemoryStateStore::new();
    let gate = Gatekeeper::new(&layout, &store);
    let app = in_root(&layout, "src/app.py");

    let edit = ToolInvocationRequest::parse(
        serde_json::json!({
            "session_id": "abc",
            "hook_event_name": "PreToolUse",
            "tool_name": "MultiEdit",
            "tool_input": {"file_path": app, "edits": []}
        })
        .to_string(),
    );
    assert!(!gate.evaluate(&edit).is_allowed());

    let read = ToolInvocationRequest::parse(
        serde_json::json!({"tool_name": "Read", "tool_input": {"file_path": app}}).to_string(),
    );
    assert!(gate.evaluate(&read).is_allowed());

    let shell = ToolInvocationRequest::parse(
        serde_json::json!({"tool_name": "Bash", "tool_input": {"command": "cargo test"}})
            .to_string(),
    );
    assert!(gate.evaluate(&shell).is_allowed());
}

#[test]
fn missing_path_fails_open() {
    let (_tmp, layout) = project();
    let store = MemoryStateStore::new();
    let gate = Gatekeeper::new(&layout, &store);

    let request = ToolInvocationRequest::parse(r#"{"tool_name":"Write","tool_input":{}}"#);
    assert!(gate.evaluate(&request).is_allowed());
}
