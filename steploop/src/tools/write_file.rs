//! `write_file`: write text to a path under the tracked working directory.

use std::fs;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::core::path::resolve;

use super::{Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
struct WriteFileInput {
    filename: String,
    content: String,
}

impl WriteFileInput {
    /// Accepts the object form, or a string holding that object as JSON.
    fn from_value(input: Option<&Value>) -> Option<Self> {
        match input? {
            Value::String(text) => serde_json::from_str(text).ok(),
            other => serde_json::from_value(other.clone()).ok(),
        }
    }
}

pub struct WriteFile;

impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes content to a given filename. Input format: { filename: string, content: string }"
    }

    fn side_effecting(&self, _input: Option<&Value>) -> bool {
        true
    }

    fn confirmation_text(&self, input: Option<&Value>) -> String {
        match WriteFileInput::from_value(input) {
            Some(parsed) => format!("write_file {}", parsed.filename),
            None => "write_file".to_string(),
        }
    }

    fn execute(&self, input: Option<&Value>, ctx: &mut ToolContext<'_>) -> Result<ToolResult> {
        let Some(parsed) = WriteFileInput::from_value(input) else {
            return Ok(ToolResult::text(
                "write_file expects input {\"filename\": string, \"content\": string}",
            ));
        };

        let path = resolve(ctx.cwd, &parsed.filename);
        match fs::write(&path, parsed.content) {
            Ok(()) => {
                debug!(path = %path.display(), "wrote file");
                Ok(ToolResult::text(format!(
                    "successfully wrote to {}",
                    path.display()
                )))
            }
            Err(err) => {
                error!(path = %path.display(), err = %err, "write_file failed");
                Ok(ToolResult::text("Failed to write file."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ToolOutput;
    use crate::test_support::ScriptedPrompter;
    use serde_json::json;
    use std::path::Path;

    fn execute(cwd: &Path, input: Value) -> ToolResult {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let mut ctx = ToolContext {
            cwd,
            prompter: &mut prompter,
        };
        WriteFile.execute(Some(&input), &mut ctx).expect("execute")
    }

    #[test]
    fn writes_relative_to_tracked_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = execute(
            temp.path(),
            json!({"filename": "snake.py", "content": "print('hi')\n"}),
        );

        let written = temp.path().join("snake.py");
        assert_eq!(
            fs::read_to_string(&written).expect("read"),
            "print('hi')\n"
        );
        assert_eq!(
            result.output,
            ToolOutput::Text(format!("successfully wrote to {}", written.display()))
        );
        assert_eq!(result.cwd_change, None);
    }

    #[test]
    fn accepts_stringified_object_input() {
        let temp = tempfile::tempdir().expect("tempdir");
        execute(
            temp.path(),
            json!(r#"{"filename":"a.txt","content":"x"}"#),
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("a.txt")).expect("read"),
            "x"
        );
    }

    #[test]
    fn io_failure_becomes_a_message() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = execute(
            &temp.path().join("missing-dir"),
            json!({"filename": "a.txt", "content": "x"}),
        );
        assert_eq!(
            result.output,
            ToolOutput::Text("Failed to write file.".to_string())
        );
    }

    #[test]
    fn malformed_input_is_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = execute(temp.path(), json!({"name": "a.txt"}));
        assert!(matches!(result.output, ToolOutput::Text(ref text) if text.contains("expects input")));
    }
}
