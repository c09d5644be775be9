//! Shared value types for the loop core.
//!
//! Tool failures and denials are values here, not errors: the loop turns them
//! into observations the model can react to.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// What the confirmation gate does when the user answers `n`.
///
/// Chosen once per session; the loop applies it to every denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DenialPolicy {
    /// End the whole process.
    Terminate,
    /// Feed a "Permission denied" observation back to the model.
    Report,
}

/// Completion status of a shell command whose output went to the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Exited(i32),
    /// Killed by a signal, so there is no exit code.
    Signaled,
    SpawnFailed(String),
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        matches!(self, CommandStatus::Exited(0))
    }
}

/// Result value of a tool execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Text(String),
    Status(CommandStatus),
}

impl ToolOutput {
    /// Observation text for this result. An empty text result stays empty.
    pub fn into_content(self) -> String {
        match self {
            ToolOutput::Text(text) => text,
            ToolOutput::Status(CommandStatus::Exited(0)) => {
                "command exited with status 0".to_string()
            }
            ToolOutput::Status(CommandStatus::Exited(code)) => {
                format!("command failed with exit status {code}")
            }
            ToolOutput::Status(CommandStatus::Signaled) => {
                "command was terminated by a signal".to_string()
            }
            ToolOutput::Status(CommandStatus::SpawnFailed(err)) => {
                format!("failed to start command: {err}")
            }
        }
    }
}
