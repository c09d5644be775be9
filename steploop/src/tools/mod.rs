//! Local capabilities the model can invoke through action steps.
//!
//! Every capability implements [`Tool`]. The [`ToolRegistry`] is built once at
//! startup and never changes afterwards; lookups are by exact name.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde_json::Value;

use crate::core::types::ToolOutput;
use crate::io::process::ShellRunner;
use crate::io::terminal::Prompter;

pub mod run_command;
pub mod run_query;
pub mod write_file;

pub use run_command::RunCommand;
pub use run_query::RunQuery;
pub use write_file::WriteFile;

/// Session state a tool may read while executing.
pub struct ToolContext<'a> {
    /// Tracked working directory used to resolve relative paths.
    pub cwd: &'a Path,
    /// Terminal for tools that need user input.
    pub prompter: &'a mut dyn Prompter,
}

/// What a tool hands back to the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub output: ToolOutput,
    /// New tracked working directory, applied by the loop controller.
    pub cwd_change: Option<PathBuf>,
}

impl ToolResult {
    pub fn output(output: ToolOutput) -> Self {
        Self {
            output,
            cwd_change: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::output(ToolOutput::Text(text.into()))
    }
}

pub trait Tool {
    fn name(&self) -> &str;

    /// One-line description shown to the model in the system prompt.
    fn description(&self) -> &str;

    /// Whether executing with `input` needs the confirmation gate.
    fn side_effecting(&self, input: Option<&Value>) -> bool;

    /// Text shown to the user at the confirmation prompt.
    fn confirmation_text(&self, input: Option<&Value>) -> String {
        match input {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => self.name().to_string(),
        }
    }

    /// Run the capability.
    ///
    /// Failures of the underlying operation are returned as output values.
    /// `Err` is reserved for losing the terminal while waiting on the user.
    fn execute(&self, input: Option<&Value>, ctx: &mut ToolContext<'_>) -> Result<ToolResult>;
}

/// Fixed, ordered set of tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Build a registry, rejecting duplicate or empty names.
    pub fn new(tools: Vec<Box<dyn Tool>>) -> Result<Self> {
        for (index, tool) in tools.iter().enumerate() {
            if tool.name().trim().is_empty() {
                bail!("tool at position {index} has an empty name");
            }
            if tools[..index].iter().any(|prev| prev.name() == tool.name()) {
                bail!("duplicate tool name {}", tool.name());
            }
        }
        Ok(Self { tools })
    }

    /// The three built-in capabilities, in prompt order.
    pub fn builtin<S: ShellRunner + 'static>(shell: S) -> Self {
        Self {
            tools: vec![
                Box::new(RunCommand::new(shell)),
                Box::new(RunQuery),
                Box::new(WriteFile),
            ],
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(|tool| tool.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|tool| tool.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|tool| tool.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingShell, RecordingTool};

    #[test]
    fn builtin_registry_is_ordered() {
        let registry = ToolRegistry::builtin(RecordingShell::new());
        assert_eq!(registry.names(), vec!["run_command", "run_query", "write_file"]);
        assert!(registry.lookup("run_query").is_some());
        assert!(registry.lookup("Run_Query").is_none());
        assert!(registry.lookup("delete_everything").is_none());
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = ToolRegistry::new(vec![
            Box::new(RecordingTool::new("echo", false)),
            Box::new(RecordingTool::new("echo", true)),
        ])
        .err()
        .expect("duplicate should fail");
        assert!(err.to_string().contains("duplicate tool name echo"));
    }

    #[test]
    fn confirmation_text_prefers_literal_strings() {
        let tool = RecordingTool::new("echo", true);
        assert_eq!(
            tool.confirmation_text(Some(&Value::String("rm -rf build".to_string()))),
            "rm -rf build"
        );
        assert_eq!(tool.confirmation_text(None), "echo");
    }
}
