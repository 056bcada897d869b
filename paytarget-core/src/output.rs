//! Output helpers for human and agent modes.

use serde::Serialize;

/// Human (TTY) vs Agent (non-interactive) output selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Agent,
}

/// A target that did not classify, by position in the input.
#[derive(Debug, Clone, Serialize)]
pub struct TargetIssue {
    pub index: usize,
    pub input: String,
    pub message: String,
}

/// Agent-mode error payload.
#[derive(Debug, Clone, Serialize)]
pub struct AgentError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<TargetIssue>>,
}

/// Shorten long targets for human-readable tables. Counts characters, not bytes.
pub fn truncate_address(addr: &str) -> String {
    let s = addr.trim();
    let len = s.chars().count();
    if len <= 24 {
        return s.to_string();
    }

    let start: String = s.chars().take(14).collect();
    let end: String = s.chars().skip(len - 6).collect();

    format!("{start}...{end}")
}
