//! Timestamp helpers for session events.

use chrono::{SecondsFormat, Utc};
use ulid::Ulid;

/// Returns the current UTC time as RFC 3339 with second precision (e.g. `2025-01-01T00:00:00Z`).
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Fresh run identifier used when a recorded event carries no payload.
pub fn new_run_id() -> String {
    Ulid::new().to_string()
}
