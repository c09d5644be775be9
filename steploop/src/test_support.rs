//! Scripted doubles for the loop's external collaborators.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::core::transcript::Role;
use crate::core::types::{CommandStatus, ToolOutput};
use crate::io::conversation::Conversation;
use crate::io::process::ShellRunner;
use crate::io::terminal::Prompter;
use crate::tools::{Tool, ToolContext, ToolResult};

/// Conversation handle that answers from a fixed list of replies.
///
/// Retains messages and replies the way a real chat session does, and fails
/// once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedConversation {
    replies: VecDeque<String>,
    sent: Vec<String>,
    retained: Vec<(Role, String)>,
}

impl ScriptedConversation {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Every message sent, in order.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// History the handle currently remembers.
    pub fn retained(&self) -> &[(Role, String)] {
        &self.retained
    }
}

impl Conversation for ScriptedConversation {
    fn send(&mut self, message: &str) -> Result<String> {
        let reply = self
            .replies
            .pop_front()
            .ok_or_else(|| anyhow!("scripted conversation has no reply left"))?;
        self.sent.push(message.to_string());
        self.retained.push((Role::User, message.to_string()));
        self.retained.push((Role::Model, reply.clone()));
        Ok(reply)
    }

    fn discard_last_reply(&mut self) {
        if self
            .retained
            .last()
            .is_some_and(|(role, _)| *role == Role::Model)
        {
            self.retained.pop();
        }
    }
}

/// Prompter that answers from a fixed list and records every prompt shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }
}

/// Shell runner that records invocations instead of spawning processes.
///
/// Clones share the same call log, so a test can keep one handle while the
/// registry owns another.
#[derive(Debug, Clone)]
pub struct RecordingShell {
    calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
    status: CommandStatus,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::with_status(CommandStatus::Exited(0))
    }

    pub fn with_status(status: CommandStatus) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            status,
        }
    }

    /// `(command, cwd)` for every run, in order.
    pub fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl Default for RecordingShell {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellRunner for RecordingShell {
    fn run(&self, command: &str, cwd: &Path) -> CommandStatus {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((command.to_string(), cwd.to_path_buf()));
        }
        self.status.clone()
    }
}

/// Generic tool that records its inputs and echoes a fixed reply.
#[derive(Debug, Clone)]
pub struct RecordingTool {
    name: String,
    side_effecting: bool,
    inputs: Arc<Mutex<Vec<Option<Value>>>>,
}

impl RecordingTool {
    pub fn new(name: &str, side_effecting: bool) -> Self {
        Self {
            name: name.to_string(),
            side_effecting,
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn inputs(&self) -> Vec<Option<Value>> {
        self.inputs
            .lock()
            .map(|inputs| inputs.clone())
            .unwrap_or_default()
    }
}

impl Tool for RecordingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Records its input"
    }

    fn side_effecting(&self, _input: Option<&Value>) -> bool {
        self.side_effecting
    }

    fn execute(&self, input: Option<&Value>, _ctx: &mut ToolContext<'_>) -> Result<ToolResult> {
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(input.cloned());
        }
        Ok(ToolResult::output(ToolOutput::Text(format!(
            "{} ran",
            self.name
        ))))
    }
}
