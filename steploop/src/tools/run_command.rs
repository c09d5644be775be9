//! `run_command`: shell commands and tracked directory changes.

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info};

use crate::core::path::{cd_target, resolve};
use crate::core::types::ToolOutput;
use crate::io::process::ShellRunner;

use super::{Tool, ToolContext, ToolResult};

pub struct RunCommand<S> {
    shell: S,
}

impl<S: ShellRunner> RunCommand<S> {
    pub fn new(shell: S) -> Self {
        Self { shell }
    }
}

fn command_text(input: Option<&Value>) -> Option<&str> {
    input.and_then(Value::as_str)
}

impl<S: ShellRunner> Tool for RunCommand<S> {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Takes a command as input to execute on system and returns output"
    }

    fn side_effecting(&self, input: Option<&Value>) -> bool {
        !command_text(input).is_some_and(|command| cd_target(command).is_some())
    }

    fn execute(&self, input: Option<&Value>, ctx: &mut ToolContext<'_>) -> Result<ToolResult> {
        let Some(command) = command_text(input) else {
            return Ok(ToolResult::text(
                "run_command expects the command as a string input",
            ));
        };

        if let Some(target) = cd_target(command) {
            let next = resolve(ctx.cwd, target);
            info!(from = %ctx.cwd.display(), to = %next.display(), "changing tracked directory");
            return Ok(ToolResult {
                output: ToolOutput::Text(format!("Changed directory to {}", next.display())),
                cwd_change: Some(next),
            });
        }

        debug!(command, "running shell command");
        let status = self.shell.run(command, ctx.cwd);
        Ok(ToolResult::output(ToolOutput::Status(status)))
    }
}
