//! Core types for declarative resource management

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::process::Output;

/// Whether a resource should exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// Resource exists and matches the desired settings
    #[default]
    Present,
    /// Resource does not exist
    Absent,
}

/// Result of reconciling a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Resource was created
    Created,
    /// Resource was modified
    Modified,
    /// Resource was removed
    Removed,
}

impl ApplyResult {
    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Removed)
    }

    /// Past-tense verb for display
    pub fn verb(&self) -> &'static str {
        match self {
            Self::NoChange => "unchanged",
            Self::Created => "created",
            Self::Modified => "updated",
            Self::Removed => "removed",
        }
    }

    /// Combine with a later mutation on an existing record
    ///
    /// A created record stays created; an untouched one becomes modified.
    pub fn with_mutation(self) -> Self {
        match self {
            Self::NoChange => Self::Modified,
            other => other,
        }
    }
}

/// What one reconciliation produced: the result and the freshest known record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// What happened
    pub result: ApplyResult,
    /// Freshest known record, or an empty object
    pub data: Value,
}

impl Outcome {
    /// Pair a result with its record
    pub fn new(result: ApplyResult, data: Value) -> Self {
        Self { result, data }
    }

    /// Nothing to do, nothing to report (e.g. deleting an absent record)
    pub fn empty() -> Self {
        Self::new(ApplyResult::NoChange, Value::Object(Map::new()))
    }

    /// Whether any remote state changed
    pub fn changed(&self) -> bool {
        self.result.is_change()
    }

    /// Caller-facing document: `{"changed": bool, "data": {<key>: record}}`
    ///
    /// Empty payloads are reported as `"data": {}`.
    pub fn report(&self, key: &str) -> Value {
        let data = match &self.data {
            Value::Object(map) if map.is_empty() => Value::Object(Map::new()),
            Value::Null => Value::Object(Map::new()),
            record => serde_json::json!({ key: record }),
        };
        serde_json::json!({
            "changed": self.changed(),
            "data": data,
        })
    }
}

/// Output from a local command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}
