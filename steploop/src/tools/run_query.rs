//! `run_query`: ask the user when the model cannot decide.

use anyhow::{Result, anyhow};
use serde_json::Value;

use super::{Tool, ToolContext, ToolResult};

pub struct RunQuery;

impl Tool for RunQuery {
    fn name(&self) -> &str {
        "run_query"
    }

    fn description(&self) -> &str {
        "Takes no input, rather gets some context from the user about some situation where not able to decide what to do and returns queryOutput"
    }

    fn side_effecting(&self, _input: Option<&Value>) -> bool {
        false
    }

    fn execute(&self, _input: Option<&Value>, ctx: &mut ToolContext<'_>) -> Result<ToolResult> {
        let answer = ctx
            .prompter
            .ask("> ")?
            .ok_or_else(|| anyhow!("input closed while waiting for run_query answer"))?;
        Ok(ToolResult::text(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ToolOutput;
    use crate::test_support::ScriptedPrompter;
    use std::path::Path;

    #[test]
    fn returns_the_literal_answer() {
        let mut prompter = ScriptedPrompter::new(["  app.js "]);
        let mut ctx = ToolContext {
            cwd: Path::new("/work"),
            prompter: &mut prompter,
        };
        let result = RunQuery.execute(None, &mut ctx).expect("execute");
        assert_eq!(result.output, ToolOutput::Text("  app.js ".to_string()));
        assert_eq!(prompter.prompts(), ["> "]);
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let mut ctx = ToolContext {
            cwd: Path::new("/work"),
            prompter: &mut prompter,
        };
        assert!(RunQuery.execute(None, &mut ctx).is_err());
    }
}
