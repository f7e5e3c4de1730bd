//! Per-item outcomes.

use crate::error::ItemError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Archive,
    Copy,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Archive => f.write_str("archive"),
            Action::Copy => f.write_str("copy"),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Success,
    Failure(ItemError),
}

/// The terminal result of one item. Rendered as a single line.
#[derive(Debug)]
pub struct ExecutionResult {
    pub item_name: String,
    pub action: Action,
    pub outcome: Outcome,
    pub summary: String,
}

impl ExecutionResult {
    pub fn success(item_name: &str, action: Action, summary: String) -> Self {
        Self {
            item_name: item_name.to_string(),
            action,
            outcome: Outcome::Success,
            summary,
        }
    }

    /// Builds a failure whose summary names the item, the attempted path and the error.
    pub fn failure(item_name: &str, action: Action, attempted: &str, err: ItemError) -> Self {
        let summary = format!("Failed to {action} '{item_name}' to '{attempted}': {err}");
        Self {
            item_name: item_name.to_string(),
            action,
            outcome: Outcome::Failure(err),
            summary,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.is_success() { "ok" } else { "FAILED" };
        write!(f, "[{tag}] {}: {}", self.item_name, self.summary)
    }
}
