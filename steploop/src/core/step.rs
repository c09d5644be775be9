//! Typed model steps and the parser that turns raw service text into them.
//!
//! The reasoning service answers with one JSON object per call:
//!
//! ```text
//! { "step": "plan"|"action"|"observe"|"output",
//!   "content": string,
//!   "function"?: string,
//!   "input"?: string | object }
//! ```
//!
//! Malformed replies are routine, so [`parse`] reports them as a
//! [`ParseFailure`] value instead of an error.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Discriminant of a [`Step`], used for display and transcript inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Plan,
    Action,
    Observe,
    Output,
}

impl StepKind {
    /// Wire name of the step (lowercase).
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Plan => "plan",
            StepKind::Action => "action",
            StepKind::Observe => "observe",
            StepKind::Output => "output",
        }
    }

    fn from_wire(value: &str) -> Option<Self> {
        [
            StepKind::Plan,
            StepKind::Action,
            StepKind::Observe,
            StepKind::Output,
        ]
        .into_iter()
        .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One directive emitted by the reasoning service.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Reasoning with no side effect.
    Plan { content: String },
    /// Request to invoke exactly one registered tool.
    Action {
        content: String,
        function: String,
        input: Option<Value>,
    },
    /// Reflection on a tool result, either model-authored or synthesized by the loop.
    Observe { content: String },
    /// Final answer for the current user query.
    Output { content: String },
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::Plan { .. } => StepKind::Plan,
            Step::Action { .. } => StepKind::Action,
            Step::Observe { .. } => StepKind::Observe,
            Step::Output { .. } => StepKind::Output,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Step::Plan { content }
            | Step::Action { content, .. }
            | Step::Observe { content }
            | Step::Output { content } => content,
        }
    }

    /// JSON object in the wire schema, with `step` first.
    pub fn to_value(&self) -> Value {
        match self {
            Step::Action {
                content,
                function,
                input,
            } => {
                let mut object = Map::new();
                object.insert("step".to_string(), json!(StepKind::Action.as_str()));
                object.insert("content".to_string(), json!(content));
                object.insert("function".to_string(), json!(function));
                if let Some(input) = input {
                    object.insert("input".to_string(), input.clone());
                }
                Value::Object(object)
            }
            other => json!({
                "step": other.kind().as_str(),
                "content": other.content(),
            }),
        }
    }

    /// Compact JSON text, as stored in transcript turns and sent back to the service.
    pub fn to_text(&self) -> String {
        self.to_value().to_string()
    }
}

/// Raw model text that did not decode into a [`Step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// The untouched text received from the service.
    pub raw: String,
    /// Short diagnostic describing what was wrong.
    pub reason: String,
}

impl ParseFailure {
    fn new(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.raw)
    }
}

#[derive(Deserialize)]
struct RawStep {
    step: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function: Option<String>,
    #[serde(default)]
    input: Option<Value>,
}

/// Decode one service reply into a [`Step`].
///
/// Pure: touches no session state. Missing `content` is accepted as empty
/// (action steps frequently omit it), everything else in the schema is checked.
pub fn parse(raw: &str) -> Result<Step, ParseFailure> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| ParseFailure::new(raw, format!("invalid json: {err}")))?;
    if !value.is_object() {
        return Err(ParseFailure::new(raw, "top-level value is not an object"));
    }
    let step: RawStep = serde_json::from_value(value)
        .map_err(|err| ParseFailure::new(raw, format!("invalid step shape: {err}")))?;

    let kind = StepKind::from_wire(&step.step)
        .ok_or_else(|| ParseFailure::new(raw, format!("unknown step {:?}", step.step)))?;
    let content = step.content.unwrap_or_default();
    let function = step.function.filter(|name| !name.trim().is_empty());

    if let Some(input) = &step.input {
        if !(input.is_string() || input.is_object()) {
            return Err(ParseFailure::new(raw, "input must be a string or an object"));
        }
    }

    match (kind, function) {
        (StepKind::Action, Some(function)) => Ok(Step::Action {
            content,
            function,
            input: step.input,
        }),
        (StepKind::Action, None) => Err(ParseFailure::new(raw, "action step without function")),
        (_, Some(function)) => Err(ParseFailure::new(
            raw,
            format!("function {function:?} on a {kind} step"),
        )),
        (StepKind::Plan, None) => Ok(Step::Plan { content }),
        (StepKind::Observe, None) => Ok(Step::Observe { content }),
        (StepKind::Output, None) => Ok(Step::Output { content }),
    }
}
