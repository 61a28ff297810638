//! Compact rendering helpers for block diagnostics.
//!
//! Hook hosts surface stderr to the user verbatim, so fragments lifted out of
//! a request (matched command text, payload previews) are bounded here.

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Flatten text to a single physical line, keeping every other character.
pub fn single_line(input: &str) -> String {
    input
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}
