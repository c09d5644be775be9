//! Console lines for loop events.

use crate::controller::LoopEvent;
use crate::core::step::{Step, StepKind};

fn emoji(kind: StepKind) -> &'static str {
    match kind {
        StepKind::Plan => "🧠",
        StepKind::Action => "🤖",
        StepKind::Observe => "💭",
        StepKind::Output => "✅",
    }
}

/// One line per event: actions show the tool name, other steps their content.
pub fn describe(event: &LoopEvent<'_>) -> String {
    match event {
        LoopEvent::Step(step) => {
            let kind = step.kind();
            let text = match step {
                Step::Action { function, .. } => function.as_str(),
                other => other.content(),
            };
            format!(
                "\n {} {}: {}",
                emoji(kind),
                kind.as_str().to_uppercase(),
                text
            )
        }
        LoopEvent::Observation(content) => {
            format!("\n {} RESULT: {}", emoji(StepKind::Observe), content)
        }
        LoopEvent::ParseFailure(failure) => {
            format!("☠️ Error happened. Raw Response: {}", failure.raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::step::parse;

    #[test]
    fn action_lines_show_the_tool_name() {
        let step = Step::Action {
            content: "listing".to_string(),
            function: "run_command".to_string(),
            input: None,
        };
        assert_eq!(describe(&LoopEvent::Step(&step)), "\n 🤖 ACTION: run_command");
    }

    #[test]
    fn other_steps_show_content() {
        let step = Step::Output {
            content: "all done".to_string(),
        };
        assert_eq!(describe(&LoopEvent::Step(&step)), "\n ✅ OUTPUT: all done");
    }

    #[test]
    fn parse_failures_print_the_raw_text() {
        let failure = parse("not json").expect_err("failure");
        assert_eq!(
            describe(&LoopEvent::ParseFailure(&failure)),
            "☠️ Error happened. Raw Response: not json"
        );
    }
}
