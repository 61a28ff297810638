use delegate_gate::core::classify::ResourceClass;
use delegate_gate::core::config::ProjectLayout;
use delegate_gate::core::gatekeeper::CheckKind;
use delegate_gate::core::paths::canonicalize;
use delegate_gate::core::store::{EventKind, FileStateStore, SessionEvent, StateStore};
use delegate_gate::plugins::delegation::{REMEDIATION, check_delegation};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_block_then_allow_across_lifecycle() {
    let tmp = tempdir().unwrap();
    let layout = ProjectLayout::new(tmp.path());
    let store = FileStateStore::new(layout.default_session_log());
    let target = canonicalize("src/app.py", layout.root());

    // Log not created yet
    let reason = check_delegation(&target, ResourceClass::Code, &store).unwrap();
    assert_eq!(reason.check, CheckKind::Delegation);
    assert_eq!(reason.remediation, REMEDIATION);

    // Subagent started but not finished
    store
        .append(&SessionEvent::now(EventKind::AgentStarted, "impl"))
        .unwrap();
    assert!(check_delegation(&target, ResourceClass::Code, &store).is_some());

    // Subagent finished
    store
        .append(&SessionEvent::now(EventKind::AgentCompleted, "impl"))
        .unwrap();
    assert!(check_delegation(&target, ResourceClass::Code, &store).is_none());
}

#[test]
fn test_unreadable_log_is_absent_evidence() {
    let tmp = tempdir().unwrap();
    // A directory where the log file should be cannot be read as a file.
    let log = tmp.path().join("delegation.log");
    fs::create_dir(&log).unwrap();
    let store = FileStateStore::new(&log);
    let target = canonicalize("lib.rs", tmp.path());

    assert!(!store.has_completion_evidence());
    assert!(check_delegation(&target, ResourceClass::Code, &store).is_some());
}

#[test]
fn test_evidence_has_no_expiry() {
    let tmp = tempdir().unwrap();
    let log = tmp.path().join("delegation.log");
    fs::write(&log, "1999-12-31T23:59:59Z AGENT_COMPLETED ancient\n").unwrap();
    let store = FileStateStore::new(&log);
    let target = canonicalize("main.go", tmp.path());

    assert!(check_delegation(&target, ResourceClass::Code, &store).is_none());
}

#[test]
fn test_log_is_never_modified_by_the_check() {
    let tmp = tempdir().unwrap();
    let log = tmp.path().join("delegation.log");
    fs::write(&log, "2025-01-01T00:00:00 AGENT_COMPLETED run1\n").unwrap();
    let before = fs::read(&log).unwrap();
    let store = FileStateStore::new(&log);
    let target = canonicalize("x.py", tmp.path());

    for _ in 0..3 {
        check_delegation(&target, ResourceClass::Code, &store);
    }
    assert_eq!(fs::read(&log).unwrap(), before);
}

#[test]
fn test_concurrent_appends_never_interleave() {
    const WRITERS: usize = 8;
    const EVENTS_PER_WRITER: usize = 200;

    let tmp = tempdir().unwrap();
    let store = FileStateStore::new(tmp.path().join("state/delegation.log"));
    let padding = "x".repeat(512);

    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let store = store.clone();
            let padding = &padding;
            scope.spawn(move || {
                for i in 0..EVENTS_PER_WRITER {
                    let kind = if i % 2 == 0 {
                        EventKind::AgentStarted
                    } else {
                        EventKind::AgentCompleted
                    };
                    let payload = format!("w{writer}-{i} {padding}");
                    store.append(&SessionEvent::now(kind, &payload)).unwrap();
                }
            });
        }
    });

    let lines = store.read_lines().unwrap();
    assert_eq!(lines.len(), WRITERS * EVENTS_PER_WRITER);
    for line in &lines {
        let event = SessionEvent::parse(line).unwrap_or_else(|| panic!("torn line: {line:?}"));
        assert!(event.payload.ends_with(&padding), "{line:?}");
    }
    assert!(store.has_completion_evidence());
}
